//! Provisioning configuration.
//!
//! A [`PylotConfig`] is constructed once per invocation — defaults,
//! optionally a TOML file, then caller overrides — and passed by reference
//! into every operation. There is no ambient settings registry.

mod store;

pub use store::load_config;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::repo::RepoSpec;

/// Repository location for one of the tool's plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Git repository URL.
    pub repository: String,
    /// Branch, tag, or commit to pin to.
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Settings for one provisioning run.
///
/// Every field has a computed default; callers override whichever they need
/// before constructing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PylotConfig {
    /// Install root on the target host. Expanded by the remote shell, so it
    /// may reference `$HOME`.
    pub root: String,

    /// Repository for the version manager itself.
    pub repository: String,
    /// Branch, tag, or commit of the version manager to pin to.
    pub branch: String,

    /// Plugins synced under `<root>/plugins`, keyed by directory name.
    pub plugins: BTreeMap<String, PluginSpec>,

    /// Python version to install and activate, or the literal "system" to
    /// keep the host's own interpreter.
    pub python_version: String,
    /// Executable probed after activation.
    pub python_cmd: String,

    /// Layer the requested version as a virtualenv on a base version.
    pub use_virtualenv: bool,
    /// Base version the virtualenv is created from.
    pub virtualenv_version: String,
    /// Options passed to `pyenv virtualenv`.
    pub virtualenv_options: Vec<String>,

    /// Patch shell startup files during setup.
    pub setup_shell: bool,
    /// Explicit startup file basenames, joined to the remote home
    /// directory. Login-shell detection applies when empty.
    pub configure_basenames: Vec<String>,
    /// Marker delimiting the injected startup block.
    pub configure_signature: String,

    /// Set the installed version as the global default.
    pub setup_global_version: bool,

    /// Override the per-platform build dependency package list.
    pub package_dependencies: Option<Vec<String>>,

    /// Parallel build jobs; probed from the target's processor count when
    /// unset.
    pub make_jobs: Option<u32>,
    /// Extra CONFIGURE_OPTS passed to source builds.
    pub configure_opts: Option<String>,

    /// Keep git output verbose during repository sync.
    pub verbose_sync: bool,
}

impl Default for PylotConfig {
    fn default() -> Self {
        let mut plugins = BTreeMap::new();
        plugins.insert(
            "pyenv-virtualenv".to_string(),
            PluginSpec {
                repository: "https://github.com/pyenv/pyenv-virtualenv.git".to_string(),
                branch: default_branch(),
            },
        );
        Self {
            root: "$HOME/.pyenv".to_string(),
            repository: "https://github.com/pyenv/pyenv.git".to_string(),
            branch: default_branch(),
            plugins,
            python_version: "3.12.2".to_string(),
            python_cmd: "python".to_string(),
            use_virtualenv: false,
            virtualenv_version: "3.12.2".to_string(),
            virtualenv_options: vec![
                "--quiet".to_string(),
                "--system-site-packages".to_string(),
            ],
            setup_shell: true,
            configure_basenames: Vec::new(),
            configure_signature: "##pylot:configure".to_string(),
            setup_global_version: true,
            package_dependencies: None,
            make_jobs: None,
            configure_opts: None,
            verbose_sync: false,
        }
    }
}

impl PylotConfig {
    /// Repository spec for the version manager itself.
    pub fn tool_repo(&self) -> RepoSpec {
        RepoSpec::new(&self.repository, &self.branch)
    }
}

fn default_branch() -> String {
    "master".to_string()
}
