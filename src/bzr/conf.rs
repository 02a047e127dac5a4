//! Line-preserving editor for `.bzr/branch/branch.conf`.
//!
//! The file is a flat list of `key = value` lines, but other tools and users
//! append arbitrary content to it (comments, section headers, free text).
//! [`BranchConf`] keeps every line in order and only ever rewrites the lines
//! whose key it was asked to change. New keys are appended at the end.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Key holding the branch's current upstream location.
pub const PARENT_LOCATION: &str = "parent_location";

/// Prefix of the keys recording earlier upstream locations.
pub const SAVED_PARENT_PREFIX: &str = "buildout_save_parent_location_";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    raw: String,
    entry: Option<(String, String)>,
}

impl Line {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        let entry = if trimmed.starts_with('#') || trimmed.starts_with('[') {
            None
        } else {
            raw.split_once('=').and_then(|(k, v)| {
                let k = k.trim();
                (!k.is_empty()).then(|| (k.to_string(), v.trim().to_string()))
            })
        };
        Line {
            raw: raw.to_string(),
            entry,
        }
    }

    fn entry(key: &str, value: &str) -> Self {
        Line {
            raw: format!("{} = {}", key, value),
            entry: Some((key.to_string(), value.to_string())),
        }
    }
}

/// Parsed `branch.conf`, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchConf {
    lines: Vec<Line>,
}

impl BranchConf {
    pub fn parse(text: &str) -> Self {
        BranchConf {
            lines: text.lines().map(Line::parse).collect(),
        }
    }

    /// Read and parse the file at `path`.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Value of the last line defining `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .filter_map(|l| l.entry.as_ref())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key` to `value`, rewriting its existing line in place or
    /// appending a new one.
    pub fn set(&mut self, key: &str, value: &str) {
        let existing = self
            .lines
            .iter_mut()
            .rev()
            .find(|l| l.entry.as_ref().is_some_and(|(k, _)| k == key));
        match existing {
            Some(line) => *line = Line::entry(key, value),
            None => self.lines.push(Line::entry(key, value)),
        }
    }

    /// All recognised pairs. Later duplicates win, as when the file is read.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.lines
            .iter()
            .filter_map(|l| l.entry.clone())
            .collect()
    }

    /// Suffixes of the saved parent locations already present.
    fn saved_suffixes(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines
            .iter()
            .filter_map(|l| l.entry.as_ref())
            .filter_map(|(k, _)| k.strip_prefix(SAVED_PARENT_PREFIX))
            .filter_map(|n| n.parse().ok())
    }

    /// Next unused history suffix, greater than any recorded so far.
    pub fn next_saved_suffix(&self) -> u32 {
        self.saved_suffixes().max().unwrap_or(0) + 1
    }

    /// Point `parent_location` at `location`.
    ///
    /// A previous, different value is kept under the next
    /// `buildout_save_parent_location_<N>` key, whose suffix is returned.
    /// Nothing changes when the value is already `location`.
    pub fn relocate_parent(&mut self, location: &str) -> Option<u32> {
        let old = self.get(PARENT_LOCATION).map(str::to_string);
        match old {
            Some(old) if old == location => None,
            Some(old) => {
                let n = self.next_saved_suffix();
                self.set(PARENT_LOCATION, location);
                self.lines
                    .push(Line::entry(&format!("{}{}", SAVED_PARENT_PREFIX, n), &old));
                Some(n)
            }
            None => {
                self.set(PARENT_LOCATION, location);
                None
            }
        }
    }

    /// Write the file atomically: a temporary sibling is renamed over `path`.
    /// An existing file's permissions carry over to the new one.
    ///
    /// # Errors
    /// Returns an I/O error if the temporary file cannot be created, written
    /// or renamed.
    pub fn write(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(self.to_string().as_bytes())?;
        if let Ok(meta) = fs::metadata(path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl std::fmt::Display for BranchConf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for l in &self.lines {
            writeln!(f, "{}", l.raw)?;
        }
        Ok(())
    }
}
