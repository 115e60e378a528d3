//! Pylot Core Library
//!
//! Provisions the pyenv Python version manager on a target host: OS build
//! dependencies, a git mirror of the tool and its plugins, idempotent shell
//! startup configuration, and an installed + activated Python version.
//! Operations run over a small remote-execution boundary and are
//! independently callable.

pub mod config;
pub mod configure;
pub mod deps;
pub mod pipeline;
pub mod platform;
pub mod python;
pub mod repo;
pub mod session;
pub mod shell;
pub mod transport;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{PluginSpec, PylotConfig, load_config};

    // Operations
    pub use crate::configure::ShellConfigPatcher;
    pub use crate::deps::DependencyEnsurer;
    pub use crate::python::Pyenv;
    pub use crate::repo::{RepoSpec, RepoSync};

    // Pipeline
    pub use crate::pipeline::{SetupStep, run_setup, setup_steps};

    // Session & transport
    pub use crate::platform::Platform;
    pub use crate::session::Session;
    pub use crate::shell::ShellCommand;
    pub use crate::transport::{ExecError, LocalShell, SshTransport, Transport};
}
