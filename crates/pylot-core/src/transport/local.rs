//! Local shell transport.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use super::{ExecError, Transport, check_status};
use crate::shell;

/// Runs commands against the local host through `sh -c`.
///
/// Used for provisioning the machine pylot itself runs on, and by the
/// integration tests.
#[derive(Debug, Default)]
pub struct LocalShell {
    env: Vec<(String, String)>,
}

impl LocalShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override an environment variable for every spawned shell.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    fn execute(&self, command: &str) -> Result<Output, ExecError> {
        debug!(%command, "running local command");
        let output = self
            .command(command)
            .output()
            .map_err(|source| ExecError::Launch {
                command: command.to_string(),
                source,
            })?;
        check_status(command, output)
    }
}

impl Transport for LocalShell {
    fn target(&self) -> String {
        "localhost".to_string()
    }

    fn run(&self, command: &str) -> Result<(), ExecError> {
        self.execute(command).map(|_| ())
    }

    fn sudo(&self, command: &str) -> Result<(), ExecError> {
        self.run(&format!("sudo {command}"))
    }

    fn capture(&self, command: &str) -> Result<String, ExecError> {
        let output = self.execute(command)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn put(&self, content: &str, path: &str) -> Result<(), ExecError> {
        let command = format!("cat > {}", shell::quote(path));
        debug!(%path, "writing local file");
        let mut child = self
            .command(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Launch {
                command: command.clone(),
                source,
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(content.as_bytes())
                .map_err(|source| ExecError::Launch {
                    command: command.clone(),
                    source,
                })?;
        }
        let output = child
            .wait_with_output()
            .map_err(|source| ExecError::Launch {
                command: command.clone(),
                source,
            })?;
        check_status(&command, output).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_returns_stdout() {
        let transport = LocalShell::new();
        assert_eq!(transport.capture("echo hello").unwrap().trim(), "hello");
    }

    #[test]
    fn run_surfaces_exit_status_and_stderr() {
        let transport = LocalShell::new();
        let err = transport.run("echo oops >&2; exit 3").unwrap_err();
        match err {
            ExecError::CommandFailed { status, stderr, .. } => {
                assert_eq!(status, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn env_overrides_apply_to_spawned_shells() {
        let transport = LocalShell::new().with_env("PYLOT_TEST_HOME", "/tmp/somewhere");
        let output = transport.capture("echo \"$PYLOT_TEST_HOME\"").unwrap();
        assert_eq!(output.trim(), "/tmp/somewhere");
    }

    #[test]
    fn put_writes_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippet.sh");
        let transport = LocalShell::new();
        transport.put("eval \"$(pyenv init -)\"\n", &path.display().to_string()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "eval \"$(pyenv init -)\"\n");
    }
}
