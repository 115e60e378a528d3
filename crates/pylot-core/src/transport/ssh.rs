//! OpenSSH subprocess transport.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tracing::debug;

use super::{ExecError, Transport, check_status};
use crate::shell;

/// Runs commands on a remote host through the OpenSSH client.
///
/// Authentication is the ssh client's business (agent, identity file,
/// ssh_config); BatchMode keeps the run non-interactive.
#[derive(Debug, Clone)]
pub struct SshTransport {
    host: String,
    user: Option<String>,
    port: Option<u16>,
    identity: Option<String>,
}

impl SshTransport {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    fn command(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-o").arg("BatchMode=yes");
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg(self.destination()).arg("--").arg(remote_command);
        cmd
    }

    fn execute(&self, remote_command: &str) -> Result<Output, ExecError> {
        debug!(target = %self.destination(), command = %remote_command, "running remote command");
        let output = self
            .command(remote_command)
            .output()
            .map_err(|source| ExecError::Launch {
                command: remote_command.to_string(),
                source,
            })?;
        check_status(remote_command, output)
    }
}

impl Transport for SshTransport {
    fn target(&self) -> String {
        self.destination()
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
        debug!(target = %self.destination(), %path, "uploading file content");
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
    fn destination_includes_user_when_set() {
        let transport = SshTransport::new("web1").with_user("deploy");
        assert_eq!(transport.target(), "deploy@web1");
        assert_eq!(SshTransport::new("web1").target(), "web1");
    }
}
