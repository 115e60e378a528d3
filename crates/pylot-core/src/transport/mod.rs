//! Remote command execution boundary.
//!
//! Every provisioning operation reduces to a handful of shell command lines
//! handed to a [`Transport`]. Failures carry the rendered command, exit
//! status, and stderr of the failed command; nothing is retried at this
//! layer and no timeout is imposed beyond the underlying process.

mod local;
mod ssh;

pub use local::LocalShell;
pub use ssh::SshTransport;

use std::process::Output;

use thiserror::Error;

/// Error raised when a transport-level command fails.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command ran and exited with a non-zero status.
    #[error("command exited with status {status}: {command}\n{stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// The command could not be launched at all.
    #[error("failed to launch command: {command}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Blocking remote-execution primitives.
///
/// `run` and `sudo` await the exit status, `capture` additionally returns
/// stdout, and `put` uploads file content to a path on the target.
pub trait Transport {
    /// Human-readable target description, used in log messages.
    fn target(&self) -> String;

    /// Execute a command, failing on non-zero exit.
    fn run(&self, command: &str) -> Result<(), ExecError>;

    /// Execute a command with elevated privileges.
    fn sudo(&self, command: &str) -> Result<(), ExecError>;

    /// Execute a command and return its stdout.
    fn capture(&self, command: &str) -> Result<String, ExecError>;

    /// Write `content` to `path` on the target.
    fn put(&self, content: &str, path: &str) -> Result<(), ExecError>;
}

pub(crate) fn check_status(command: &str, output: Output) -> Result<Output, ExecError> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(ExecError::CommandFailed {
            command: command.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
