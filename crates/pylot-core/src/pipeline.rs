//! The composed setup pipeline.
//!
//! `setup` is an ordered list of named steps; each must succeed before the
//! next runs, and a failure aborts the remainder with no rollback.

use anyhow::{Context, Result};
use tracing::info;

use crate::configure::ShellConfigPatcher;
use crate::deps::DependencyEnsurer;
use crate::python::Pyenv;
use crate::repo::RepoSync;
use crate::session::Session;

/// One named step of the setup pipeline.
pub struct SetupStep {
    pub name: &'static str,
    action: fn(&Session) -> Result<()>,
}

impl SetupStep {
    pub fn run(&self, session: &Session) -> Result<()> {
        (self.action)(session)
    }
}

/// The steps of `setup`, in execution order.
pub fn setup_steps() -> Vec<SetupStep> {
    vec![
        SetupStep {
            name: "dependencies",
            action: run_dependencies,
        },
        SetupStep {
            name: "update",
            action: run_update,
        },
        SetupStep {
            name: "configure",
            action: run_configure,
        },
        SetupStep {
            name: "build",
            action: run_build,
        },
    ]
}

/// Run the full setup sequence against one target.
pub fn run_setup(session: &Session) -> Result<()> {
    for step in setup_steps() {
        info!(step = step.name, target = %session.transport().target(), "running setup step");
        step.run(session)
            .with_context(|| format!("Setup step '{}' failed", step.name))?;
    }
    Ok(())
}

fn run_dependencies(session: &Session) -> Result<()> {
    DependencyEnsurer::new(session).ensure()
}

fn run_update(session: &Session) -> Result<()> {
    RepoSync::new(session).update()
}

fn run_configure(session: &Session) -> Result<()> {
    if !session.config().setup_shell {
        return Ok(());
    }
    ShellConfigPatcher::new(session).configure()
}

fn run_build(session: &Session) -> Result<()> {
    Pyenv::new(session).build()
}
