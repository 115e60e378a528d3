//! Config file loading.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::PylotConfig;

/// Candidate config paths, in precedence order.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("pylot.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("pylot").join("pylot.toml"));
    }
    paths
}

/// Load configuration from an explicit path, the working directory, or the
/// user config directory; defaults apply when no file exists.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<PylotConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    for path in candidate_paths() {
        if path.exists() {
            return read_config(&path);
        }
    }
    Ok(PylotConfig::default())
}

fn read_config(path: &Path) -> anyhow::Result<PylotConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pylot.toml");
        std::fs::write(
            &path,
            r#"
root = "/opt/pyenv"
python_version = "3.11.4"
make_jobs = 2

[plugins.pyenv-virtualenv]
repository = "https://example.com/pyenv-virtualenv.git"
branch = "stable"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.root, "/opt/pyenv");
        assert_eq!(config.python_version, "3.11.4");
        assert_eq!(config.make_jobs, Some(2));
        let plugin = config.plugins.get("pyenv-virtualenv").unwrap();
        assert_eq!(plugin.branch, "stable");
        // untouched fields keep their defaults
        assert_eq!(config.python_cmd, "python");
        assert!(config.setup_shell);
    }

    #[test]
    fn plugin_branch_defaults_to_master() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pylot.toml");
        std::fs::write(
            &path,
            "[plugins.pyenv-update]\nrepository = \"https://example.com/pyenv-update.git\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.plugins.get("pyenv-update").unwrap().branch, "master");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
