//! Crate entry point for **bzrsync**.
//!
//! A thin adapter around the Bazaar command-line tool that keeps working
//! copies at a requested revision: branch when missing, pull only when the
//! revision is not known locally, update otherwise. The [`bzr`] module is the
//! library surface; the remaining modules back the `bzrsync` CLI.

pub mod bzr;
mod config;
mod error;
mod list;
pub mod logging;
mod paths;
mod sync;

/// Re-export commonly used types and commands so they can be accessed from `bzrsync::*`.
pub use bzr::{Branch, BranchOptions};
pub use config::{BranchEntry, Config, Loaded, load_config};
pub use error::{Error, Result};
pub use list::cmd_list;
pub use paths::{Paths, bzrsync_home, paths};
pub use sync::cmd_sync;
