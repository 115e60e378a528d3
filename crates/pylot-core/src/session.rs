//! Per-run session state.
//!
//! Resolves remote values once per run — install root, home directory,
//! login shell, processor count — and builds the environment-prefixed
//! invocation of the managed tool used by every operation.

use std::cell::OnceCell;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::PylotConfig;
use crate::shell::{self, ShellCommand};
use crate::transport::Transport;

pub struct Session<'a> {
    config: &'a PylotConfig,
    transport: &'a dyn Transport,
    root: OnceCell<String>,
    home: OnceCell<String>,
    login_shell: OnceCell<String>,
    processors: OnceCell<u32>,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a PylotConfig, transport: &'a dyn Transport) -> Self {
        Self {
            config,
            transport,
            root: OnceCell::new(),
            home: OnceCell::new(),
            login_shell: OnceCell::new(),
            processors: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &PylotConfig {
        self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport
    }

    /// Install root with any `$HOME` reference expanded on the target.
    ///
    /// The tool may later be executed by users other than the deploying one,
    /// so the configured value is expanded to an actual path up front.
    pub fn install_root(&self) -> Result<String> {
        self.resolve(&self.root, &self.config.root, "install root")
    }

    /// The remote user's home directory.
    pub fn home_dir(&self) -> Result<String> {
        self.resolve(&self.home, "$HOME", "home directory")
    }

    /// The remote user's login shell.
    pub fn login_shell(&self) -> Result<String> {
        self.resolve(&self.login_shell, "$SHELL", "login shell")
    }

    /// Processor count on the target; 1 when the probe fails.
    pub fn processor_count(&self) -> u32 {
        if let Some(count) = self.processors.get() {
            return *count;
        }
        let count = self
            .transport
            .capture("cat /proc/cpuinfo | cut -f1 | grep processor | wc -l")
            .ok()
            .and_then(|output| output.trim().parse::<u32>().ok())
            .filter(|count| *count > 0)
            .unwrap_or(1);
        debug!(count, "resolved target processor count");
        let _ = self.processors.set(count);
        count
    }

    pub fn bin_dir(&self) -> Result<String> {
        Ok(format!("{}/bin", self.install_root()?))
    }

    pub fn shims_dir(&self) -> Result<String> {
        Ok(format!("{}/shims", self.install_root()?))
    }

    pub fn plugins_dir(&self) -> Result<String> {
        Ok(format!("{}/plugins", self.install_root()?))
    }

    /// Invocation of the managed tool with its environment prefix, and
    /// optionally a pinned version.
    pub fn pyenv_command(&self, version: Option<&str>) -> Result<ShellCommand> {
        let root = self.install_root()?;
        let bin = format!("{root}/bin");
        let shims = format!("{root}/shims");
        let mut command = ShellCommand::new(format!("{bin}/pyenv"))
            .env("PYENV_ROOT", &root)
            .env_rendered("PATH", &shell::path_with_fallback(&[&shims, &bin]));
        if let Some(version) = version {
            command = command.env("PYENV_VERSION", version);
        }
        Ok(command)
    }

    fn resolve(&self, cell: &OnceCell<String>, value: &str, what: &str) -> Result<String> {
        if let Some(resolved) = cell.get() {
            return Ok(resolved.clone());
        }
        let output = self
            .transport
            .capture(&format!("echo {}", shell::expandable(value)))
            .with_context(|| format!("Failed to resolve {what} on target"))?;
        let resolved = output.trim().to_string();
        debug!(%what, %resolved, "resolved remote value");
        let _ = cell.set(resolved.clone());
        Ok(resolved)
    }
}
