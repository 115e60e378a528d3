//! Target platform detection and build dependency lists.

use anyhow::{Context, Result};

use crate::transport::Transport;

/// Release-marker probe; prints one of `ubuntu`, `debian`, `redhat`,
/// `unknown`.
const DETECT_SCRIPT: &str = "if test -f /etc/debian_version; then \
if test -f /etc/lsb-release && grep -i -q DISTRIB_ID=Ubuntu /etc/lsb-release; then echo ubuntu; \
else echo debian; fi; \
elif test -f /etc/redhat-release; then echo redhat; \
else echo unknown; fi";

/// Platform of the target host, as far as package management is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Debian,
    Ubuntu,
    RedHat,
    Unknown,
}

impl Platform {
    /// Detect the platform of the target host.
    pub fn detect(transport: &dyn Transport) -> Result<Self> {
        let output = transport
            .capture(DETECT_SCRIPT)
            .context("Failed to detect target platform")?;
        Ok(Self::parse(output.trim()))
    }

    pub fn parse(identifier: &str) -> Self {
        match identifier {
            "debian" => Self::Debian,
            "ubuntu" => Self::Ubuntu,
            "redhat" => Self::RedHat,
            _ => Self::Unknown,
        }
    }

    pub fn is_debian_family(self) -> bool {
        matches!(self, Self::Debian | Self::Ubuntu)
    }

    pub fn is_redhat_family(self) -> bool {
        matches!(self, Self::RedHat)
    }

    /// OS packages required to build Python from source on this platform.
    pub fn build_dependencies(self) -> Vec<String> {
        let packages: &[&str] = match self {
            Self::Debian | Self::Ubuntu => &[
                "git-core",
                "build-essential",
                "libreadline6-dev",
                "zlib1g-dev",
                "libssl-dev",
                "libbz2-dev",
                "libsqlite3-dev",
            ],
            Self::RedHat => &[
                "git-core",
                "autoconf",
                "gcc-c++",
                "glibc-devel",
                "patch",
                "readline",
                "readline-devel",
                "zlib",
                "zlib-devel",
                "openssl",
                "openssl-devel",
                "bzip2",
                "bzip2-devel",
                "sqlite",
                "sqlite-devel",
            ],
            Self::Unknown => &[],
        };
        packages.iter().map(|package| package.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_maps_probe_output() {
        assert_eq!(Platform::parse("debian"), Platform::Debian);
        assert_eq!(Platform::parse("ubuntu"), Platform::Ubuntu);
        assert_eq!(Platform::parse("redhat"), Platform::RedHat);
        assert_eq!(Platform::parse("darwin"), Platform::Unknown);
        assert_eq!(Platform::parse(""), Platform::Unknown);
    }

    #[test]
    fn unknown_platform_has_no_dependencies() {
        assert!(Platform::Unknown.build_dependencies().is_empty());
        assert!(!Platform::Ubuntu.build_dependencies().is_empty());
        assert!(Platform::RedHat.build_dependencies().contains(&"openssl-devel".to_string()));
    }

    #[test]
    fn family_predicates() {
        assert!(Platform::Debian.is_debian_family());
        assert!(Platform::Ubuntu.is_debian_family());
        assert!(Platform::RedHat.is_redhat_family());
        assert!(!Platform::Unknown.is_debian_family());
        assert!(!Platform::Unknown.is_redhat_family());
    }
}
