//! Idempotent shell startup configuration.
//!
//! Injects a marker-delimited initialization block into the remote user's
//! shell startup files. Reapplying the patch never duplicates the block:
//! any existing delimited block is deleted before a fresh one is appended.
//! A `.orig` backup of the pre-patch content is kept, and the real file is
//! only rewritten when its content actually changed.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::session::Session;
use crate::shell;
use crate::transport::Transport;

pub struct ShellConfigPatcher<'a> {
    session: &'a Session<'a>,
}

impl<'a> ShellConfigPatcher<'a> {
    pub fn new(session: &'a Session<'a>) -> Self {
        Self { session }
    }

    /// Patch every target startup file.
    pub fn configure(&self) -> Result<()> {
        let snippet = self.snippet()?;
        let files = self.target_files()?;
        let transport = self.session.transport();
        let mut temp_files = RemoteTempFiles::new(transport);
        let script_file = temp_files.allocate()?;
        transport
            .put(&snippet, &script_file)
            .context("Failed to upload init snippet")?;
        for file in &files {
            info!(%file, "patching shell startup file");
            let temp_file = temp_files.allocate()?;
            self.patch_file(file, &script_file, &temp_file)?;
        }
        Ok(())
    }

    /// The block injected between the signature markers.
    fn snippet(&self) -> Result<String> {
        let bin_dir = self.session.bin_dir()?;
        Ok(format!(
            "# Configured by pylot. Do not edit directly.\n\
export PATH=\"{bin_dir}:$PATH\"\n\
eval \"$(pyenv init -)\"\n"
        ))
    }

    /// Startup files to patch: configured basenames joined to the home
    /// directory, else one file picked from the login shell.
    fn target_files(&self) -> Result<Vec<String>> {
        let home = self.session.home_dir()?;
        let config = self.session.config();
        if !config.configure_basenames.is_empty() {
            return Ok(config
                .configure_basenames
                .iter()
                .map(|basename| format!("{home}/{basename}"))
                .collect());
        }
        let login_shell = self.session.login_shell()?;
        let shell_name = login_shell.rsplit('/').next().unwrap_or_default();
        let file = if shell_name.contains("bash") {
            let profile = format!("{home}/.profile");
            let bash_profile = format!("{home}/.bash_profile");
            let probe = format!(
                "test -f {profile} && echo {profile} || echo {bash_profile}",
                profile = shell::quote(&profile),
                bash_profile = shell::quote(&bash_profile),
            );
            self.session
                .transport()
                .capture(&probe)
                .context("Failed to pick bash startup file")?
                .trim()
                .to_string()
        } else if shell_name.contains("zsh") {
            format!("{home}/.zshenv")
        } else {
            // other sh-compatible shells such as dash
            format!("{home}/.profile")
        };
        Ok(vec![file])
    }

    /// Apply the marker-delimited patch to one file.
    fn patch_file(&self, file: &str, script_file: &str, temp_file: &str) -> Result<()> {
        let signature = &self.session.config().configure_signature;
        let target = shell::quote(file);
        let temp = shell::quote(temp_file);
        let script = shell::quote(script_file);
        let backup = shell::quote(&format!("{file}.orig"));
        let marker = shell::quote(signature);
        let delete_block = shell::quote(&format!(
            "/^{sig}/,/^{sig}/d",
            sig = shell::sed_escape(signature)
        ));
        let steps = [
            // ensure the copy source exists so permissions can be captured
            format!("( test -f {target} || touch {target} )"),
            // recreate the temp copy so it inherits the original's permissions
            format!("rm -f {temp}"),
            format!("cp -fp {target} {temp}"),
            format!("sed -i -e {delete_block} {temp}"),
            format!("echo {marker} >> {temp}"),
            format!("cat {script} >> {temp}"),
            format!("echo {marker} >> {temp}"),
            format!("cp -fp {target} {backup}"),
            // only overwrite the real file when the content differs
            format!("( diff -u {target} {temp} || mv -f {temp} {target} )"),
        ];
        self.session
            .transport()
            .run(&shell::chain(&steps))
            .with_context(|| format!("Failed to patch {file}"))
    }
}

/// Remote temp files removed best-effort when the scope ends.
///
/// Removal failure is non-fatal by contract and never escalated.
pub struct RemoteTempFiles<'a> {
    transport: &'a dyn Transport,
    paths: Vec<String>,
}

impl<'a> RemoteTempFiles<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            paths: Vec::new(),
        }
    }

    /// Allocate a fresh temp file on the target.
    pub fn allocate(&mut self) -> Result<String> {
        let path = self
            .transport
            .capture("mktemp /tmp/pylot.XXXXXXXXXX")
            .context("Failed to allocate temp file on target")?
            .trim()
            .to_string();
        self.paths.push(path.clone());
        Ok(path)
    }
}

impl Drop for RemoteTempFiles<'_> {
    fn drop(&mut self) {
        if self.paths.is_empty() {
            return;
        }
        let quoted: Vec<String> = self.paths.iter().map(|path| shell::quote(path)).collect();
        if let Err(err) = self.transport.run(&format!("rm -f {}", quoted.join(" "))) {
            debug!(error = %err, "temp file cleanup failed");
        }
    }
}
