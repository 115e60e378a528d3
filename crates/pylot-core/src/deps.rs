//! OS package dependency checks and installation.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::platform::Platform;
use crate::session::Session;
use crate::shell::ShellCommand;

/// Ensures the build dependencies for the managed runtime are present.
///
/// Fail-fast: a failed query or install aborts the whole setup sequence.
/// Unrecognized platforms degrade to a no-op.
pub struct DependencyEnsurer<'a> {
    session: &'a Session<'a>,
}

impl<'a> DependencyEnsurer<'a> {
    pub fn new(session: &'a Session<'a>) -> Self {
        Self { session }
    }

    /// Install whichever required packages are missing, in one batch.
    pub fn ensure(&self) -> Result<()> {
        let platform = Platform::detect(self.session.transport())?;
        if !platform.is_debian_family() && !platform.is_redhat_family() {
            debug!(?platform, "unrecognized platform, skipping dependency install");
            return Ok(());
        }
        let required = self.required_packages(platform);
        if required.is_empty() {
            return Ok(());
        }
        let missing = self.missing_packages(platform, &required)?;
        if missing.is_empty() {
            info!("build dependencies already present");
            return Ok(());
        }
        info!(count = missing.len(), "installing build dependencies");
        let manager = if platform.is_debian_family() { "apt-get" } else { "yum" };
        let command = ShellCommand::new(manager)
            .arg("install")
            .arg("-q")
            .arg("-y")
            .args(&missing);
        self.session
            .transport()
            .sudo(&command.render())
            .context("Failed to install build dependencies")?;
        Ok(())
    }

    fn required_packages(&self, platform: Platform) -> Vec<String> {
        match &self.session.config().package_dependencies {
            Some(packages) => packages.clone(),
            None => platform.build_dependencies(),
        }
    }

    fn missing_packages(&self, platform: Platform, required: &[String]) -> Result<Vec<String>> {
        let installed = self.installed_packages(platform, required)?;
        Ok(required
            .iter()
            .filter(|package| !installed.contains(package.as_str()))
            .cloned()
            .collect())
    }

    /// Query which of `required` are installed, in one batched call.
    fn installed_packages(
        &self,
        platform: Platform,
        required: &[String],
    ) -> Result<HashSet<String>> {
        let query = if platform.is_debian_family() {
            ShellCommand::new("dpkg-query")
                .arg("-W")
                .arg("-f=${Status}\\t${Package}\\n")
                .args(required)
        } else {
            ShellCommand::new("rpm")
                .arg("-q")
                .arg("--qf")
                .arg("%{NAME}\\n")
                .args(required)
        };
        // both tools exit non-zero when any package is unknown
        let command = format!("{} 2>/dev/null || true", query.render());
        let output = self
            .session
            .transport()
            .capture(&command)
            .context("Failed to query installed packages")?;

        let required_set: HashSet<&str> = required.iter().map(String::as_str).collect();
        let mut installed = HashSet::new();
        for line in output.lines() {
            let line = line.trim();
            if platform.is_debian_family() {
                if let Some((status, package)) = line.rsplit_once('\t') {
                    if status == "install ok installed" {
                        installed.insert(package.to_string());
                    }
                }
            } else if required_set.contains(line) {
                installed.insert(line.to_string());
            }
        }
        Ok(installed)
    }
}
