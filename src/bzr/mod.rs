//! Bazaar integration layer.
//!
//! Everything here goes through the `bzr` command-line tool; no history is
//! read or written by this crate directly, except for `branch.conf` which is
//! patched in place when a branch's source moves.
//!
//! Other modules should depend on [`Branch`] and the re-exports below rather
//! than on the submodules.

mod branch;
mod command;
mod conf;
mod directory;
mod revspec;

pub use branch::{Branch, BranchOptions};
pub use command::{BzrCommand, Runner};
pub use conf::{BranchConf, PARENT_LOCATION, SAVED_PARENT_PREFIX};
pub use directory::{Directory, Launchpad, normalize_location};
pub use revspec::RevisionKind;
