//! Short-form location directories.
//!
//! Bazaar accepts abbreviated locations such as `lp:project` that a
//! directory service expands into a real URL. The adapter expands them once,
//! when a [`Branch`](super::Branch) is built, and stores the concrete form.
//! Which directories exist is decided by the caller: without one, an
//! abbreviated location is rejected with [`Error::Config`].

use crate::error::{Error, Result};

/// Expands locations that start with [`Directory::scheme`].
pub trait Directory: Send + Sync {
    /// Scheme prefix handled by this directory, including the colon.
    fn scheme(&self) -> &str;

    /// Expand `location` (which starts with the scheme) to a concrete URL.
    fn resolve(&self, location: &str) -> Result<String>;
}

/// Launchpad's `lp:` directory.
///
/// `lp:project` and `lp:project/series` map to the `+branch` alias,
/// `lp:~user/project/name` maps to the personal branch. Anonymous access
/// uses HTTPS; with a Launchpad login the `bzr+ssh` transport is used.
#[derive(Debug, Clone, Default)]
pub struct Launchpad {
    login: Option<String>,
}

const LP_HOST: &str = "bazaar.launchpad.net";

impl Launchpad {
    pub fn new(login: Option<String>) -> Self {
        Self { login }
    }
}

impl Directory for Launchpad {
    fn scheme(&self) -> &str {
        "lp:"
    }

    fn resolve(&self, location: &str) -> Result<String> {
        let rest = location
            .strip_prefix("lp:")
            .ok_or_else(|| Error::Config(format!("not a Launchpad location: {}", location)))?;
        // lp:///foo is the same as lp:foo; lp://<instance>/ is not supported.
        let rest = match rest.strip_prefix("//") {
            Some(r) => r.strip_prefix('/').ok_or_else(|| {
                Error::Config(format!("unsupported Launchpad instance in {}", location))
            })?,
            None => rest,
        };
        let path = rest.trim_matches('/');
        if path.is_empty() {
            return Err(Error::Config(format!(
                "empty Launchpad location: {}",
                location
            )));
        }

        let path = if path.starts_with('~') {
            path.to_string()
        } else {
            format!("+branch/{}", path)
        };
        Ok(match &self.login {
            Some(user) => format!("bzr+ssh://{}@{}/{}", user, LP_HOST, path),
            None => format!("https://{}/{}", LP_HOST, path),
        })
    }
}

/// Expand `location` through `directory` if it uses the directory's scheme.
///
/// Locations that are already concrete are returned unchanged, so calling
/// this on its own output is a no-op.
///
/// # Errors
/// - [`Error::Config`] if `location` is abbreviated and no directory is
///   available for it.
pub fn normalize_location(location: &str, directory: Option<&dyn Directory>) -> Result<String> {
    if let Some(dir) = directory
        && location.starts_with(dir.scheme())
    {
        return dir.resolve(location);
    }
    if location.starts_with("lp:") {
        return Err(Error::Config(format!(
            "no directory service available to resolve {}",
            location
        )));
    }
    Ok(location.to_string())
}
