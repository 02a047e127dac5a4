use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Executes one invocation of the version-control tool.
///
/// [`BzrCommand`] is the production implementation. The branch adapter only
/// ever talks to the tool through this trait, which keeps the decision logic
/// (pull or not, update to what) testable without a real `bzr` install.
pub trait Runner: Send + Sync {
    /// Run the tool with `args`, optionally from `cwd`, and return its stdout.
    ///
    /// # Errors
    /// - [`Error::Spawn`] if the program cannot be started.
    /// - [`Error::Command`] if it exits with a non-zero status.
    fn run(&self, args: &[OsString], cwd: Option<&Path>) -> Result<String>;
}

/// Runs the real `bzr` (or `brz`) executable.
#[derive(Debug, Clone)]
pub struct BzrCommand {
    program: PathBuf,
}

impl BzrCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find the tool on `PATH`.
    ///
    /// Lookup order: `bzr`, then `brz` (Breezy ships a compatible CLI).
    /// When neither is found the plain name `bzr` is kept, so the first
    /// invocation reports a [`Error::Spawn`] rather than failing here.
    pub fn locate() -> Self {
        for name in ["bzr", "brz"] {
            if let Ok(p) = which::which(name) {
                return Self::new(p);
            }
        }
        Self::new("bzr")
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for BzrCommand {
    fn default() -> Self {
        Self::new("bzr")
    }
}

impl Runner for BzrCommand {
    fn run(&self, args: &[OsString], cwd: Option<&Path>) -> Result<String> {
        let line = command_line(self.program.as_os_str(), args);
        debug!(command = %line, cwd = ?cwd, "running");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let out = cmd.output().map_err(|source| Error::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        if !out.status.success() {
            return Err(Error::Command {
                command: line,
                status: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// Render an invocation for logs and error messages.
fn command_line(program: &OsStr, args: &[OsString]) -> String {
    let mut s = program.to_string_lossy().into_owned();
    for a in args {
        let a = a.to_string_lossy();
        s.push(' ');
        if a.is_empty() || a.contains(char::is_whitespace) {
            s.push('\'');
            s.push_str(&a);
            s.push('\'');
        } else {
            s.push_str(&a);
        }
    }
    s
}
