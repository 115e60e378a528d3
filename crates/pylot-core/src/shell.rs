//! Shell command construction with centralized quoting.
//!
//! Every value interpolated into a remote command line flows through this
//! module; operations never concatenate raw strings into commands.

use std::borrow::Cow;

/// Quote a single value for safe interpolation into a shell command line.
///
/// NUL bytes cannot appear in a command line at all and are stripped before
/// quoting.
pub fn quote(value: &str) -> String {
    let cleaned: Cow<'_, str> = if value.contains('\0') {
        Cow::Owned(value.replace('\0', ""))
    } else {
        Cow::Borrowed(value)
    };
    match shlex::try_quote(&cleaned) {
        Ok(quoted) => quoted.into_owned(),
        Err(_) => String::new(),
    }
}

/// Double-quote a value so the remote shell still expands `$` references
/// inside it while treating everything else literally.
pub fn expandable(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Render a PATH-style value from fixed directories followed by the remote
/// `$PATH`, quoting each directory while keeping the variable expandable.
pub fn path_with_fallback(dirs: &[&str]) -> String {
    let mut parts: Vec<String> = dirs.iter().map(|dir| quote(dir)).collect();
    parts.push("\"$PATH\"".to_string());
    parts.join(":")
}

/// Escape a literal string for use inside a basic-regex sed address.
pub fn sed_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '/' | '.' | '*' | '[' | ']' | '^' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Join rendered command fragments with `&&`.
pub fn chain(parts: &[String]) -> String {
    parts.join(" && ")
}

/// A single remote command built from structured pieces.
///
/// Rendering produces one correctly quoted command line. Environment
/// assignments are emitted through `env` ahead of the program, matching how
/// the managed tool expects its root and version variables.
#[derive(Debug, Clone, Default)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    env: Vec<String>,
    cwd: Option<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an environment assignment; the value is quoted.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{key}={}", quote(value)));
        self
    }

    /// Add an environment assignment whose value is already rendered
    /// (used for PATH-style values that must keep `$PATH` expandable).
    pub fn env_rendered(mut self, key: &str, value: &str) -> Self {
        self.env.push(format!("{key}={value}"));
        self
    }

    /// Change into `dir` before running the command.
    pub fn current_dir(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Render the full command line.
    pub fn render(&self) -> String {
        let mut line = String::new();
        if let Some(dir) = &self.cwd {
            line.push_str("cd ");
            line.push_str(&quote(dir));
            line.push_str(" && ");
        }
        if !self.env.is_empty() {
            line.push_str("env ");
            for assignment in &self.env {
                line.push_str(assignment);
                line.push(' ');
            }
        }
        line.push_str(&quote(&self.program));
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(arg));
        }
        line
    }
}
