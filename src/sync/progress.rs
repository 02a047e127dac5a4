use indicatif::ProgressStyle;

/// Frames shown while `bzr` is running for a branch.
const TICKS: &[&str] = &["-", "\\", "|", "/"];

/// Running job: spinner, branch name as the bar prefix, then the requested
/// revision.
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.yellow} {prefix:.bold} {wide_msg:.dim}")
        .unwrap()
        .tick_strings(TICKS)
}

/// Finished job; the message carries the revno the tree ended up at.
pub fn ok_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold.green} at r{msg}").unwrap()
}

/// Failed job; the prefix is the target directory so the failing working
/// copy can be found, the message is the error.
pub fn err_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:.bold.red} failed: {wide_msg}").unwrap()
}
