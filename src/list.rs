use crate::config::load_config;
use crate::sync::build_jobs;
use anyhow::Result;
use std::path::Path;

/// CLI command: print configured branches and where their trees are.
///
/// Example output:
/// ```text
/// - parts/recipe (https://bazaar.launchpad.net/+branch/anybox.recipe.openerp) [last:1] at 412
/// - parts/addons (/srv/bzr/addons) [sometag] absent
/// ```
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or parsed. A
/// branch whose revision cannot be read is reported inline.
pub fn cmd_list(config: Option<&Path>) -> Result<()> {
    let loaded = load_config(config)?;
    for job in build_jobs(&loaded, false)? {
        let branch = match loaded.config.open(&job.target, &job.url, job.options) {
            Ok(b) => b,
            Err(e) => {
                println!("- {} ({}) [{}] error: {}", job.display, job.url, job.revision, e);
                continue;
            }
        };
        let state = if !branch.target_dir().exists() {
            "absent".to_string()
        } else {
            match branch.parents() {
                Ok(revnos) => format!("at {}", revnos.join(", ")),
                Err(e) => format!("error: {}", e),
            }
        };
        println!("- {} ({}) [{}] {}", job.display, branch.url(), job.revision, state);
    }
    Ok(())
}
