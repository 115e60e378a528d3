//! Repository synchronization on the target host.
//!
//! Convergence never runs a clean that would delete untracked files: an
//! existing clone is fetched and hard-reset to the pinned revision, a
//! missing one is cloned fresh. Symbolic revisions are pinned on the
//! controller before the remote command is built, so the target always
//! converges to one exact commit.

mod resolve;

pub use resolve::resolve_revision;

use anyhow::{Context, Result};
use tracing::info;

use crate::session::Session;
use crate::shell;

/// A git repository pinned to a branch, tag, or commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub repository: String,
    pub branch: String,
}

impl RepoSpec {
    pub fn new(repository: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            branch: branch.into(),
        }
    }
}

/// Syncs the tool and plugin repositories.
pub struct RepoSync<'a> {
    session: &'a Session<'a>,
}

impl<'a> RepoSync<'a> {
    pub fn new(session: &'a Session<'a>) -> Self {
        Self { session }
    }

    /// Sync the tool repository itself, then every configured plugin.
    pub fn update(&self) -> Result<()> {
        let root = self.session.install_root()?;
        self.sync(&self.session.config().tool_repo(), &root)?;
        self.update_plugins()
    }

    /// Sync every configured plugin under `<root>/plugins`.
    pub fn update_plugins(&self) -> Result<()> {
        let plugins_dir = self.session.plugins_dir()?;
        for (name, plugin) in &self.session.config().plugins {
            let destination = format!("{plugins_dir}/{name}");
            let spec = RepoSpec::new(&plugin.repository, &plugin.branch);
            self.sync(&spec, &destination)?;
        }
        Ok(())
    }

    /// Converge `destination` to the spec's resolved revision.
    pub fn sync(&self, spec: &RepoSpec, destination: &str) -> Result<()> {
        let revision = resolve_revision(&spec.repository, &spec.branch)
            .with_context(|| format!("Failed to resolve revision for {}", spec.repository))?;
        info!(repository = %spec.repository, %revision, %destination, "syncing repository");
        let command = sync_command(spec, destination, &revision, self.session.config().verbose_sync);
        self.session
            .transport()
            .run(&command)
            .with_context(|| format!("Failed to sync repository into {destination}"))?;
        Ok(())
    }
}

/// Build the remote converge command for one repository.
fn sync_command(spec: &RepoSpec, destination: &str, revision: &str, verbose: bool) -> String {
    let dest = shell::quote(destination);
    let url = shell::quote(&spec.repository);
    let rev = shell::quote(revision);
    let q = if verbose { "" } else { "-q " };
    format!(
        "if [ -d {dest} ]; then \
cd {dest} && git fetch {q}origin && git fetch --tags {q}origin && git reset {q}--hard {rev}; \
else git clone {q}{url} {dest} && cd {dest} && git checkout {q}{rev}; fi"
    )
}
