use regex::Regex;
use std::sync::LazyLock;

static REVNO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*$").unwrap());

/// Prefixes of revision specifiers whose target moves with the branch tip or
/// depends on other branches, and therefore can never be "already present".
const FLOATING_PREFIXES: &[&str] = &[
    "last:",
    "before:",
    "after:",
    "ancestor:",
    "branch:",
    "submit:",
    "date:",
    "annotate:",
    "mainline:",
];

/// How a revision specifier relates to local history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionKind {
    /// Absolute revision number, e.g. `3` or `1.2.1`.
    Revno,
    /// Explicit revision id, `revid:…`.
    RevisionId,
    /// Tag, either bare (`sometag`) or prefixed (`tag:sometag`).
    Tag,
    /// Relative expression such as `last:1` or `-2`.
    Floating,
}

impl RevisionKind {
    /// Classify `spec`. The grammar belongs to the tool; this only sorts
    /// specifiers into those that name a fixed revision and those that don't.
    pub fn of(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.is_empty() {
            return RevisionKind::Floating;
        }
        if REVNO.is_match(spec) || spec.strip_prefix("revno:").is_some_and(|n| REVNO.is_match(n)) {
            return RevisionKind::Revno;
        }
        if spec.starts_with("revid:") {
            return RevisionKind::RevisionId;
        }
        if spec.starts_with("tag:") {
            return RevisionKind::Tag;
        }
        if spec.starts_with('-') || FLOATING_PREFIXES.iter().any(|p| spec.starts_with(p)) {
            return RevisionKind::Floating;
        }
        RevisionKind::Tag
    }

    /// True when the specifier names one revision regardless of the tip.
    pub fn is_fixed(self) -> bool {
        self != RevisionKind::Floating
    }
}

/// True when `spec` asks for the branch tip, so branching needs no `-r`.
pub fn is_tip(spec: &str) -> bool {
    matches!(spec.trim(), "" | "last:1" | "-1")
}
