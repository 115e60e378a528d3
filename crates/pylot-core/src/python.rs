//! Version installation and activation through the managed tool.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::session::Session;
use crate::shell::ShellCommand;

/// Version selector meaning "use the host's own interpreter"; it never
/// triggers an install.
pub const SYSTEM_VERSION: &str = "system";

/// Drives the pyenv executable on the target host.
pub struct Pyenv<'a> {
    session: &'a Session<'a>,
}

impl<'a> Pyenv<'a> {
    pub fn new(session: &'a Session<'a>) -> Self {
        Self { session }
    }

    /// Installed versions, from `pyenv versions --bare`.
    pub fn versions(&self) -> Result<Vec<String>> {
        let command = self.session.pyenv_command(None)?.arg("versions").arg("--bare");
        let output = self
            .session
            .transport()
            .capture(&command.render())
            .context("Failed to list installed versions")?;
        Ok(split_lines(&output))
    }

    /// Versions the tool knows how to build.
    pub fn available_versions(&self) -> Result<Vec<String>> {
        let command = self.session.pyenv_command(None)?.arg("install").arg("--complete");
        let output = self
            .session
            .transport()
            .capture(&command.render())
            .context("Failed to list available versions")?;
        Ok(split_lines(&output))
    }

    /// Install a version from source.
    ///
    /// Build parallelism follows the configured job count, else the
    /// target's processor count (1 when the probe fails).
    pub fn install(&self, version: &str) -> Result<()> {
        let config = self.session.config();
        let jobs = config
            .make_jobs
            .unwrap_or_else(|| self.session.processor_count());
        let mut command = self.session.pyenv_command(None)?;
        if let Some(opts) = &config.configure_opts {
            command = command.env("CONFIGURE_OPTS", opts);
        }
        command = command
            .env("MAKE_OPTS", &format!("-j {jobs}"))
            .arg("install")
            .arg(version);
        info!(%version, jobs, "installing python");
        self.session
            .transport()
            .run(&command.render())
            .with_context(|| format!("Failed to install python {version}"))
    }

    /// Uninstall an installed version.
    pub fn uninstall(&self, version: &str) -> Result<()> {
        let command = self
            .session
            .pyenv_command(None)?
            .arg("uninstall")
            .arg("-f")
            .arg(version);
        self.session
            .transport()
            .run(&command.render())
            .with_context(|| format!("Failed to uninstall python {version}"))
    }

    /// Create a virtualenv named `name` layered on `base`.
    pub fn virtualenv(&self, base: &str, name: &str) -> Result<()> {
        let config = self.session.config();
        let mut command = self
            .session
            .pyenv_command(Some(&config.python_version))?
            .arg("virtualenv");
        for option in &config.virtualenv_options {
            command = command.arg(option);
        }
        command = command.arg(base).arg(name);
        info!(%base, %name, "creating virtualenv");
        self.session
            .transport()
            .run(&command.render())
            .with_context(|| format!("Failed to create virtualenv {name}"))
    }

    /// Set the global default version.
    pub fn global(&self, version: &str) -> Result<()> {
        let command = self.session.pyenv_command(None)?.arg("global").arg(version);
        self.session
            .transport()
            .run(&command.render())
            .with_context(|| format!("Failed to set global version {version}"))
    }

    /// Refresh shims so wrappers pick up newly installed executables.
    ///
    /// Deliberately a separate operation: callers may batch several
    /// installs and refresh once afterwards.
    pub fn rehash(&self) -> Result<()> {
        let command = self.session.pyenv_command(None)?.arg("rehash");
        self.session
            .transport()
            .run(&command.render())
            .context("Failed to refresh shims")
    }

    /// Path of `command_name` under the managed version.
    pub fn which(&self, command_name: &str, version: Option<&str>) -> Result<String> {
        let version = version.unwrap_or(&self.session.config().python_version);
        let command = self
            .session
            .pyenv_command(Some(version))?
            .arg("which")
            .arg(command_name);
        let output = self
            .session
            .transport()
            .capture(&command.render())
            .with_context(|| format!("Failed to locate {command_name}"))?;
        Ok(output.trim().to_string())
    }

    /// Run a command under the managed version.
    pub fn exec(&self, args: &[String], version: Option<&str>) -> Result<()> {
        let version = version.unwrap_or(&self.session.config().python_version);
        let mut command = self.session.pyenv_command(Some(version))?.arg("exec");
        for arg in args {
            command = command.arg(arg);
        }
        self.session
            .transport()
            .run(&command.render())
            .context("Failed to run command under managed version")
    }

    /// Ensure the requested version is installed and activated.
    ///
    /// Already-installed versions are never reinstalled. Activation sets
    /// the global default unless suppressed, and a final probe fails
    /// loudly now rather than at first real use.
    pub fn build(&self) -> Result<()> {
        let config = self.session.config();
        let installed = self.versions()?;
        debug!(?installed, "installed versions on target");
        if config.use_virtualenv {
            let base = &config.virtualenv_version;
            if base != SYSTEM_VERSION && !installed.iter().any(|v| v == base) {
                self.install(base)?;
            }
            if config.python_version != SYSTEM_VERSION
                && !installed.iter().any(|v| *v == config.python_version)
            {
                self.virtualenv(base, &config.python_version)?;
            }
        } else if config.python_version != SYSTEM_VERSION
            && !installed.iter().any(|v| *v == config.python_version)
        {
            self.install(&config.python_version)?;
        }
        if config.setup_global_version {
            self.global(&config.python_version)?;
        }
        self.probe()
    }

    /// Check that the runtime is actually executable.
    pub fn probe(&self) -> Result<()> {
        let python = self.session.config().python_cmd.clone();
        self.exec(&[python, "--version".to_string()], None)
            .context("Python runtime probe failed")
    }

    /// Delete the entire install root.
    pub fn purge(&self) -> Result<()> {
        let root = self.session.install_root()?;
        info!(%root, "purging install root");
        let command = ShellCommand::new("rm").arg("-rf").arg(&root);
        self.session
            .transport()
            .run(&command.render())
            .context("Failed to purge install root")
    }
}

fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
