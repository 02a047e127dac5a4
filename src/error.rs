//! Error taxonomy of the branch adapter.
//!
//! The adapter never swallows a failure: every external command that exits
//! non-zero surfaces as [`Error::Command`], and the offline "revision not
//! available" case has its own variant so callers can tell it apart.

use std::io;

/// All errors produced by the `bzr` layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external tool ran and exited with a non-zero status.
    #[error("`{command}` failed ({}): {stderr}", display_status(.status))]
    Command {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The external tool could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The requested revision cannot be reached without network access.
    #[error("update error: {0}")]
    Update(String),

    /// A capability required by the request is missing in this environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tool produced output we could not make sense of.
    #[error("unexpected output from `{command}`: {output:?}")]
    Parse { command: String, output: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the offline "revision unavailable" failure.
    pub fn is_update(&self) -> bool {
        matches!(self, Error::Update(_))
    }

    /// Exit status of a failed command, if the failure came from one.
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Error::Command { status, .. } => *status,
            _ => None,
        }
    }
}

fn display_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
