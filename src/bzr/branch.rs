use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::{debug, info, warn};

use super::command::{BzrCommand, Runner};
use super::conf::{BranchConf, PARENT_LOCATION};
use super::directory::{Directory, Launchpad, normalize_location};
use super::revspec::{RevisionKind, is_tip};
use crate::error::{Error, Result};

static REVISION_INFO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s+(\S+)\s*$").unwrap());

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// Switches that change how a [`Branch`] talks to the tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchOptions {
    /// Never pull or branch; only local history may be used.
    pub offline: bool,
    /// Break stale locks left by an interrupted run before doing anything.
    pub clear_locks: bool,
    /// Create new branches with `--stacked`.
    pub stacked: bool,
}

/// A working copy of `url` kept in `target_dir`.
///
/// The handle is cheap and holds no state beyond its inputs; everything is
/// read back from the working copy on demand.
pub struct Branch {
    target_dir: PathBuf,
    url: String,
    options: BranchOptions,
    bzr: Arc<dyn Runner>,
}

impl std::fmt::Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Branch")
            .field("target_dir", &self.target_dir)
            .field("url", &self.url)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Branch {
    /// Build a handle using the `bzr` found on `PATH` and the Launchpad
    /// directory for `lp:` locations.
    ///
    /// # Errors
    /// See [`Branch::with_runner`].
    pub fn new(target_dir: impl Into<PathBuf>, url: &str, options: BranchOptions) -> Result<Self> {
        Self::with_runner(
            target_dir,
            url,
            options,
            Arc::new(BzrCommand::locate()),
            Some(&Launchpad::default()),
        )
    }

    /// Build a handle with an explicit tool runner and directory service.
    ///
    /// Abbreviated locations are expanded here, once; the handle stores the
    /// concrete URL.
    ///
    /// # Errors
    /// - [`Error::Config`] if `url` is abbreviated and `directory` is `None`
    ///   or cannot expand it.
    pub fn with_runner(
        target_dir: impl Into<PathBuf>,
        url: &str,
        options: BranchOptions,
        bzr: Arc<dyn Runner>,
        directory: Option<&dyn Directory>,
    ) -> Result<Self> {
        Ok(Self {
            target_dir: target_dir.into(),
            url: normalize_location(url, directory)?,
            options,
            bzr,
        })
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> BranchOptions {
        self.options
    }

    /// Path of the branch configuration file inside the working copy.
    pub fn conf_path(&self) -> PathBuf {
        self.target_dir.join(".bzr").join("branch").join("branch.conf")
    }

    /// Bring the working copy to `revision`.
    ///
    /// - Target missing: branch from `url` (stopping at `revision` unless it
    ///   is the tip).
    /// - Target present:
    ///   - breaks stale locks first when `clear_locks` is set,
    ///   - records a moved `url` in `branch.conf` (see [`Branch::update_conf`]),
    ///   - pulls only if `revision` floats or is not known locally,
    ///   - updates the tree to `revision`.
    ///
    /// # Errors
    /// - [`Error::Update`] in offline mode when `revision` is not available
    ///   locally (or the target does not exist yet).
    /// - [`Error::Command`] / [`Error::Spawn`] for any failing invocation.
    pub fn ensure(&self, revision: &str) -> Result<()> {
        if !self.target_dir.exists() {
            return self.branch(revision);
        }

        if self.options.clear_locks {
            self.break_lock()?;
        }
        self.update_conf()?;

        if RevisionKind::of(revision).is_fixed() {
            if self.has_revision(revision)? {
                debug!(revision, path = %self.target_dir.display(), "revision available locally");
            } else if self.options.offline {
                return Err(Error::Update(format!(
                    "revision {} is not available in {} and offline mode forbids pulling from {}",
                    revision,
                    self.target_dir.display(),
                    self.url
                )));
            } else {
                self.pull()?;
            }
        } else if self.options.offline {
            warn!(
                revision,
                path = %self.target_dir.display(),
                "offline mode: not pulling, updating against local history"
            );
        } else {
            self.pull()?;
        }

        self.update(revision)
    }

    /// Revision numbers of the working tree.
    ///
    /// # Errors
    /// Fails if the command fails or prints no revision number.
    pub fn parents(&self) -> Result<Vec<String>> {
        let args = vec![
            OsString::from("revno"),
            OsString::from("--tree"),
            self.target_dir.clone().into_os_string(),
        ];
        let out = self.bzr.run(&args, None)?;
        let revnos: Vec<String> = out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if revnos.is_empty() {
            return Err(Error::Parse {
                command: "bzr revno --tree".into(),
                output: out,
            });
        }
        Ok(revnos)
    }

    /// Canonical revision id for `revision` in this branch's history.
    ///
    /// # Errors
    /// [`Error::Command`] when the revision is unknown locally.
    pub fn revision_id(&self, revision: &str) -> Result<String> {
        self.revision_info(Some(revision)).map(|(_, id)| id)
    }

    /// Revision id the working tree is at.
    pub fn current_revision_id(&self) -> Result<String> {
        self.revision_info(None).map(|(_, id)| id)
    }

    /// Export the checked-out revision to `dest`, without `.bzr`.
    ///
    /// # Errors
    /// Fails if the tree revision cannot be resolved or the export fails.
    pub fn archive(&self, dest: &Path) -> Result<()> {
        let revid = self.current_revision_id()?;
        info!(path = %self.target_dir.display(), dest = %dest.display(), "exporting");
        let args = vec![
            OsString::from("export"),
            OsString::from("-r"),
            OsString::from(format!("revid:{}", revid)),
            dest.as_os_str().to_owned(),
            self.target_dir.clone().into_os_string(),
        ];
        self.bzr.run(&args, None).map(drop)
    }

    /// Recognised `key = value` pairs of `branch.conf`.
    pub fn parse_conf(&self) -> Result<BTreeMap<String, String>> {
        Ok(BranchConf::read(&self.conf_path())?.entries())
    }

    /// Point `parent_location` at this handle's `url` if it moved.
    ///
    /// The previous location is kept as `buildout_save_parent_location_<N>`.
    /// A relative parent (as written by `bzr branch`) is resolved against the
    /// working copy before comparing, so an unmoved source is left alone.
    /// Returns whether the file was rewritten.
    ///
    /// # Errors
    /// I/O errors reading or writing `branch.conf`.
    pub fn update_conf(&self) -> Result<bool> {
        let path = self.conf_path();
        if !path.exists() {
            return Ok(false);
        }
        let mut conf = BranchConf::read(&path)?;
        if let Some(current) = conf.get(PARENT_LOCATION)
            && same_location(current, &self.url, &self.target_dir)
        {
            return Ok(false);
        }

        let saved = conf.relocate_parent(&self.url);
        conf.write(&path)?;
        match saved {
            Some(n) => info!(
                path = %self.target_dir.display(),
                url = %self.url,
                saved = n,
                "parent location changed"
            ),
            None => info!(path = %self.target_dir.display(), url = %self.url, "parent location set"),
        }
        Ok(true)
    }

    /// True if `bzr status` reports anything besides unknown files.
    pub fn uncommitted_changes(&self) -> Result<bool> {
        let out = self.run_in_tree(&["status", "-S"])?;
        Ok(out
            .lines()
            .any(|l| !l.trim().is_empty() && !l.starts_with('?')))
    }

    /// Remove unknown and ignored files from the working tree.
    pub fn clean(&self) -> Result<()> {
        self.run_in_tree(&["clean-tree", "--unknown", "--ignored", "--force"])
            .map(drop)
    }

    /// Drop local modifications, reverting the tree to `revision`.
    pub fn revert(&self, revision: &str) -> Result<()> {
        self.run_in_tree(&["revert", "--no-backup", "-r", revision])
            .map(drop)
    }

    fn run_in_tree(&self, args: &[&str]) -> Result<String> {
        let args: Vec<OsString> = args.iter().map(OsString::from).collect();
        self.bzr.run(&args, Some(&self.target_dir))
    }

    fn branch(&self, revision: &str) -> Result<()> {
        if self.options.offline {
            return Err(Error::Update(format!(
                "{} does not exist; cannot branch it from {} in offline mode",
                self.target_dir.display(),
                self.url
            )));
        }
        if let Some(parent) = self.target_dir.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        info!(url = %self.url, path = %self.target_dir.display(), revision, "branching");
        let mut args = vec![OsString::from("branch")];
        if self.options.stacked {
            args.push("--stacked".into());
        }
        if !is_tip(revision) {
            args.push("-r".into());
            args.push(revision.into());
        }
        args.push(self.url.clone().into());
        args.push(self.target_dir.clone().into_os_string());
        self.bzr.run(&args, None).map(drop)
    }

    fn pull(&self) -> Result<()> {
        info!(url = %self.url, path = %self.target_dir.display(), "pulling");
        let args = vec![
            OsString::from("pull"),
            OsString::from("-d"),
            self.target_dir.clone().into_os_string(),
            OsString::from(&self.url),
        ];
        self.bzr.run(&args, None).map(drop)
    }

    fn update(&self, revision: &str) -> Result<()> {
        info!(path = %self.target_dir.display(), revision, "updating");
        let mut args = vec![OsString::from("update")];
        if !revision.trim().is_empty() {
            args.push("-r".into());
            args.push(revision.into());
        }
        args.push(self.target_dir.clone().into_os_string());
        self.bzr.run(&args, None).map(drop)
    }

    fn break_lock(&self) -> Result<()> {
        info!(path = %self.target_dir.display(), "breaking stale locks");
        let args = vec![
            OsString::from("break-lock"),
            OsString::from("--force"),
            self.target_dir.clone().into_os_string(),
        ];
        self.bzr.run(&args, None).map(drop)
    }

    /// Whether a fixed `revision` resolves in local history.
    ///
    /// A failed lookup means "not here yet"; a tool that cannot be started
    /// is still an error.
    fn has_revision(&self, revision: &str) -> Result<bool> {
        match self.revision_info(Some(revision)) {
            Ok(_) => Ok(true),
            Err(Error::Command { stderr, .. }) => {
                debug!(revision, %stderr, "revision not found locally");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// `(revno, revision id)` for `revision`, or for the tree when `None`.
    fn revision_info(&self, revision: Option<&str>) -> Result<(String, String)> {
        let mut args = vec![
            OsString::from("revision-info"),
            OsString::from("-d"),
            self.target_dir.clone().into_os_string(),
        ];
        match revision {
            Some(r) => {
                args.push("-r".into());
                args.push(r.into());
            }
            None => args.push("--tree".into()),
        }
        let out = self.bzr.run(&args, None)?;
        parse_revision_info(&out).ok_or_else(|| Error::Parse {
            command: "bzr revision-info".into(),
            output: out,
        })
    }
}

fn parse_revision_info(out: &str) -> Option<(String, String)> {
    let line = out.lines().find(|l| !l.trim().is_empty())?;
    let caps = REVISION_INFO.captures(line)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Whether the recorded parent `recorded` and the requested `url` denote the
/// same location. `base` is the working copy, against which `bzr` writes
/// relative (percent-encoded) parents.
fn same_location(recorded: &str, url: &str, base: &Path) -> bool {
    if recorded.trim_end_matches('/') == url.trim_end_matches('/') {
        return true;
    }
    match (local_path(recorded, base, true), local_path(url, Path::new(""), false)) {
        (Some(a), Some(b)) => normalize_path(&a) == normalize_path(&b),
        _ => false,
    }
}

/// File-system path for a local location, `None` for remote URLs.
fn local_path(location: &str, base: &Path, encoded: bool) -> Option<PathBuf> {
    let raw = match location.strip_prefix("file://") {
        Some(rest) => percent_decode_str(rest).decode_utf8_lossy().into_owned(),
        None if URL_SCHEME.is_match(location) => return None,
        None if encoded => percent_decode_str(location).decode_utf8_lossy().into_owned(),
        None => location.to_string(),
    };
    let p = PathBuf::from(raw);
    let p = if p.is_absolute() { p } else { base.join(p) };
    std::path::absolute(&p).ok()
}

fn normalize_path(p: &Path) -> PathBuf {
    if let Ok(c) = fs::canonicalize(p) {
        return c;
    }
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    type Respond = Box<dyn Fn(&[String]) -> Result<String> + Send + Sync>;

    /// Records every invocation and answers from a closure.
    struct FakeBzr {
        calls: Mutex<Vec<Vec<String>>>,
        cwds: Mutex<Vec<Option<PathBuf>>>,
        respond: Respond,
    }

    impl FakeBzr {
        fn new(respond: impl Fn(&[String]) -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                cwds: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            })
        }

        fn ok() -> Arc<Self> {
            Self::new(|args| match args[0].as_str() {
                "revision-info" => Ok("1 joe@example.com-20130101000000-abc\n".into()),
                _ => Ok(String::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        fn subcommands(&self) -> Vec<String> {
            self.calls().into_iter().map(|c| c[0].clone()).collect()
        }
    }

    impl Runner for FakeBzr {
        fn run(&self, args: &[OsString], cwd: Option<&Path>) -> Result<String> {
            let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
            self.calls.lock().unwrap().push(args.clone());
            self.cwds.lock().unwrap().push(cwd.map(Path::to_path_buf));
            (self.respond)(&args)
        }
    }

    fn not_found() -> Error {
        Error::Command {
            command: "bzr revision-info".into(),
            status: Some(3),
            stderr: "bzr: ERROR: Requested revision: '2' does not exist in branch".into(),
        }
    }

    fn branch_with(target: &Path, url: &str, options: BranchOptions, bzr: Arc<FakeBzr>) -> Branch {
        Branch::with_runner(target, url, options, bzr, Some(&Launchpad::default())).unwrap()
    }

    /// A working copy on disk whose branch.conf records `parent`.
    fn existing_copy(root: &Path, parent: &str) -> PathBuf {
        let target = root.join("clone to update");
        let conf_dir = target.join(".bzr").join("branch");
        fs::create_dir_all(&conf_dir).unwrap();
        fs::write(conf_dir.join("branch.conf"), format!("parent_location = {}\n", parent)).unwrap();
        target
    }

    #[test]
    fn fresh_target_is_branched_at_revision() {
        let td = tempdir().unwrap();
        let target = td.path().join("My branch");
        let bzr = FakeBzr::ok();
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        b.ensure("1").unwrap();

        let target_s = target.display().to_string();
        assert_eq!(
            bzr.calls(),
            vec![vec!["branch", "-r", "1", "/src/branch", target_s.as_str()]]
        );
    }

    #[test]
    fn fresh_target_at_minus_one_omits_revision() {
        let td = tempdir().unwrap();
        let target = td.path().join("My branch");
        let bzr = FakeBzr::ok();
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        b.ensure("-1").unwrap();

        let target_s = target.display().to_string();
        assert_eq!(
            bzr.calls(),
            vec![vec!["branch", "/src/branch", target_s.as_str()]]
        );
    }

    #[test]
    fn fresh_target_passes_other_specifiers_through() {
        for rev in ["last:2", "-2", "revid:joe@example.com-1", "tag:sometag"] {
            let td = tempdir().unwrap();
            let target = td.path().join("My branch");
            let bzr = FakeBzr::ok();
            let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

            b.ensure(rev).unwrap();

            let target_s = target.display().to_string();
            assert_eq!(
                bzr.calls(),
                vec![vec!["branch", "-r", rev, "/src/branch", target_s.as_str()]],
                "specifier {rev}"
            );
        }
    }

    #[test]
    fn fresh_stacked_branch_at_tip_has_no_revision() {
        let td = tempdir().unwrap();
        let target = td.path().join("nested").join("My branch");
        let bzr = FakeBzr::ok();
        let opts = BranchOptions {
            stacked: true,
            ..Default::default()
        };
        let b = branch_with(&target, "/src/branch", opts, bzr.clone());

        b.ensure("last:1").unwrap();

        assert!(target.parent().unwrap().is_dir());
        let target_s = target.display().to_string();
        assert_eq!(
            bzr.calls(),
            vec![vec!["branch", "--stacked", "/src/branch", target_s.as_str()]]
        );
    }

    #[test]
    fn offline_refuses_to_branch() {
        let td = tempdir().unwrap();
        let bzr = FakeBzr::ok();
        let opts = BranchOptions {
            offline: true,
            ..Default::default()
        };
        let b = branch_with(&td.path().join("absent"), "/src", opts, bzr.clone());

        let err = b.ensure("1").unwrap_err();
        assert!(err.is_update());
        assert!(bzr.calls().is_empty());
    }

    #[test]
    fn locally_known_revision_needs_no_pull() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::ok();
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        b.ensure("1").unwrap();
        b.ensure("1").unwrap();

        assert_eq!(
            bzr.subcommands(),
            vec!["revision-info", "update", "revision-info", "update"]
        );
        let target_s = target.display().to_string();
        assert_eq!(bzr.calls()[1], vec!["update", "-r", "1", target_s.as_str()]);
    }

    #[test]
    fn unknown_revision_is_pulled_then_updated() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::new(|args| match args[0].as_str() {
            "revision-info" => Err(not_found()),
            _ => Ok(String::new()),
        });
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        b.ensure("2").unwrap();

        let target_s = target.display().to_string();
        assert_eq!(bzr.subcommands(), vec!["revision-info", "pull", "update"]);
        assert_eq!(bzr.calls()[1], vec!["pull", "-d", target_s.as_str(), "/src/branch"]);
    }

    #[test]
    fn tags_and_revids_are_looked_up_before_pulling() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::ok();
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        b.ensure("sometag").unwrap();
        b.ensure("revid:joe@example.com-20130101000000-abc").unwrap();

        assert!(!bzr.subcommands().contains(&"pull".to_string()));
        assert_eq!(bzr.calls()[0][3..], ["-r", "sometag"]);
    }

    #[test]
    fn offline_unknown_revision_is_an_update_error() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::new(|args| match args[0].as_str() {
            "revision-info" => Err(not_found()),
            _ => Ok(String::new()),
        });
        let opts = BranchOptions {
            offline: true,
            ..Default::default()
        };
        let b = branch_with(&target, "/src/branch", opts, bzr.clone());

        let err = b.ensure("2").unwrap_err();
        assert!(err.is_update(), "got {err:?}");
        assert_eq!(bzr.subcommands(), vec!["revision-info"]);
    }

    #[test]
    fn offline_floating_revision_updates_locally() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::ok();
        let opts = BranchOptions {
            offline: true,
            ..Default::default()
        };
        let b = branch_with(&target, "/src/branch", opts, bzr.clone());

        b.ensure("last:1").unwrap();

        assert_eq!(bzr.subcommands(), vec!["update"]);
    }

    #[test]
    fn floating_revision_always_pulls_online() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::ok();
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        b.ensure("last:1").unwrap();

        assert_eq!(bzr.subcommands(), vec!["pull", "update"]);
    }

    #[test]
    fn clear_locks_breaks_them_first() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::ok();
        let opts = BranchOptions {
            clear_locks: true,
            ..Default::default()
        };
        let b = branch_with(&target, "/src/branch", opts, bzr.clone());

        b.ensure("1").unwrap();

        let target_s = target.display().to_string();
        assert_eq!(bzr.calls()[0], vec!["break-lock", "--force", target_s.as_str()]);
        assert_eq!(bzr.subcommands()[1..], ["revision-info", "update"]);
    }

    #[test]
    fn spawn_failure_during_lookup_propagates() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::new(|_| {
            Err(Error::Spawn {
                program: "bzr".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        });
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        let err = b.ensure("1").unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert_eq!(bzr.subcommands(), vec!["revision-info"]);
    }

    #[test]
    fn failed_pull_is_not_retried() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/src/branch");
        let bzr = FakeBzr::new(|args| match args[0].as_str() {
            "pull" => Err(Error::Command {
                command: "bzr pull".into(),
                status: Some(3),
                stderr: "bzr: ERROR: Not a branch".into(),
            }),
            _ => Ok(String::new()),
        });
        let b = branch_with(&target, "/src/branch", BranchOptions::default(), bzr.clone());

        let err = b.ensure("last:1").unwrap_err();
        assert_eq!(err.exit_status(), Some(3));
        assert_eq!(bzr.subcommands(), vec!["pull"]);
    }

    #[test]
    fn moved_source_is_recorded_in_branch_conf() {
        let td = tempdir().unwrap();
        let target = existing_copy(td.path(), "/old/src");
        let mut conf = fs::read_to_string(target.join(".bzr/branch/branch.conf")).unwrap();
        conf.push_str("\nSome other stuff\n");
        fs::write(target.join(".bzr/branch/branch.conf"), conf).unwrap();

        let b = branch_with(&target, "/new/src", BranchOptions::default(), FakeBzr::ok());
        b.ensure("1").unwrap();
        let b = branch_with(&target, "/newer/src", BranchOptions::default(), FakeBzr::ok());
        b.ensure("1").unwrap();

        let conf = b.parse_conf().unwrap();
        assert_eq!(conf.len(), 3);
        assert_eq!(conf["parent_location"], "/newer/src");
        assert_eq!(conf["buildout_save_parent_location_1"], "/old/src");
        assert_eq!(conf["buildout_save_parent_location_2"], "/new/src");
        let text = fs::read_to_string(b.conf_path()).unwrap();
        assert!(text.contains("\nSome other stuff\n"));
    }

    #[test]
    fn relative_parent_matching_source_is_left_alone() {
        let td = tempdir().unwrap();
        let src = td.path().join("src branch");
        fs::create_dir_all(&src).unwrap();
        let target = existing_copy(td.path(), "../src%20branch/");

        let b = branch_with(
            &target,
            &src.display().to_string(),
            BranchOptions::default(),
            FakeBzr::ok(),
        );
        assert!(!b.update_conf().unwrap());
        assert_eq!(b.parse_conf().unwrap()["parent_location"], "../src%20branch/");
    }

    #[test]
    fn parents_and_revision_ids_are_parsed() {
        let td = tempdir().unwrap();
        let bzr = FakeBzr::new(|args| match args[0].as_str() {
            "revno" => Ok("2\n".into()),
            "revision-info" => Ok("  1 joe@example.com-20130101000000-abc\n".into()),
            _ => Ok(String::new()),
        });
        let b = branch_with(td.path(), "/src", BranchOptions::default(), bzr.clone());

        assert_eq!(b.parents().unwrap(), vec!["2"]);
        assert_eq!(
            b.revision_id("1").unwrap(),
            "joe@example.com-20130101000000-abc"
        );
        assert_eq!(bzr.calls()[1][3..], ["-r", "1"]);
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        let td = tempdir().unwrap();
        let bzr = FakeBzr::new(|_| Ok("\n".into()));
        let b = branch_with(td.path(), "/src", BranchOptions::default(), bzr);
        assert!(matches!(b.parents(), Err(Error::Parse { .. })));
        assert!(matches!(b.revision_id("1"), Err(Error::Parse { .. })));
    }

    #[test]
    fn archive_exports_the_tree_revision() {
        let td = tempdir().unwrap();
        let bzr = FakeBzr::ok();
        let b = branch_with(td.path(), "/src", BranchOptions::default(), bzr.clone());
        let dest = td.path().join("archive directory");

        b.archive(&dest).unwrap();

        let calls = bzr.calls();
        assert_eq!(calls[0][3], "--tree");
        assert_eq!(calls[1][..3], ["export", "-r", "revid:joe@example.com-20130101000000-abc"]);
        assert_eq!(calls[1][3], dest.display().to_string());
    }

    #[test]
    fn status_ignores_unknown_files() {
        let td = tempdir().unwrap();
        let unknown_only = FakeBzr::new(|_| Ok("?   stray.txt\n".into()));
        let b = branch_with(td.path(), "/src", BranchOptions::default(), unknown_only);
        assert!(!b.uncommitted_changes().unwrap());

        let modified = FakeBzr::new(|_| Ok(" M  tracked\n?   stray.txt\n".into()));
        let b = branch_with(td.path(), "/src", BranchOptions::default(), modified);
        assert!(b.uncommitted_changes().unwrap());
    }

    #[test]
    fn clean_and_revert_run_inside_the_tree() {
        let td = tempdir().unwrap();
        let bzr = FakeBzr::ok();
        let b = branch_with(td.path(), "/src", BranchOptions::default(), bzr.clone());

        b.clean().unwrap();
        b.revert("1").unwrap();

        assert_eq!(
            bzr.calls(),
            vec![
                vec!["clean-tree", "--unknown", "--ignored", "--force"],
                vec!["revert", "--no-backup", "-r", "1"],
            ]
        );
        let cwds = bzr.cwds.lock().unwrap().clone();
        assert!(cwds.iter().all(|c| c.as_deref() == Some(td.path())));
    }

    #[test]
    fn lp_location_is_expanded_at_construction() {
        let b = branch_with(
            Path::new("x"),
            "lp:anybox.recipe.openerp",
            BranchOptions::default(),
            FakeBzr::ok(),
        );
        assert!(!b.url().starts_with("lp:"));

        let again = branch_with(Path::new("x"), b.url(), BranchOptions::default(), FakeBzr::ok());
        assert_eq!(again.url(), b.url());
    }

    #[test]
    fn lp_location_without_directory_is_a_config_error() {
        let err = Branch::with_runner(
            "x",
            "lp:something",
            BranchOptions::default(),
            FakeBzr::ok(),
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }
}
