//! Per-run staging directories below the site root.
//!
//! Every run collects its exports in a fresh `<site>/.backup-<token>`
//! directory. Staging directories left behind by earlier runs are removed
//! unless they are to be kept.
//!
//! Concurrent runs against the same site are not coordinated: one run's
//! stale-staging removal can delete another run's staging directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::Local;
use regex::Regex;

use crate::config::Mode;
use crate::error::{Error, Result};
use crate::util::fs::{create_dir_with_mode, remove_tree};

const STAGING_PREFIX: &str = ".backup-";

static STAGING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.backup-.+$").expect("staging pattern is valid"));

fn staging_token() -> String {
    Local::now().format("%Y%m%dT%H%M%S%f").to_string()
}

/// Create a fresh, uniquely named staging directory inside `site`.
pub fn create_staging(site: &Path, mode: Mode) -> Result<PathBuf> {
    let token = staging_token();
    let mut staging = site.join(format!("{STAGING_PREFIX}{token}"));
    let mut suffix = 1;
    while fs::symlink_metadata(&staging).is_ok() {
        staging = site.join(format!("{STAGING_PREFIX}{token}-{suffix}"));
        suffix += 1;
    }

    fs::create_dir(&staging).map_err(|e| Error::io(&staging, e))?;
    create_dir_with_mode(&staging, mode)?;
    log::debug!(target: "staging", "Created staging directory {}", staging.display());

    Ok(staging)
}

/// Staging directories of earlier runs: direct child directories of `site`
/// named like a staging directory, except `current`.
///
/// Each call reads the directory anew. An entry that cannot be read fails
/// the listing.
pub fn stale_staging_dirs(site: &Path, current: &Path) -> Result<Vec<PathBuf>> {
    let mut stale = Vec::new();
    for entry in fs::read_dir(site).map_err(|e| Error::io(site, e))? {
        let entry = entry.map_err(|e| Error::io(site, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        if file_type.is_dir()
            && STAGING_NAME.is_match(&entry.file_name().to_string_lossy())
            && path != current
        {
            stale.push(path);
        }
    }

    Ok(stale)
}

/// Remove every staging directory of earlier runs.
pub fn remove_stale_staging_dirs(site: &Path, current: &Path) -> Result<()> {
    for stale in stale_staging_dirs(site, current)? {
        log::info!(target: "staging", "Removing previous backup data: {}", stale.display());
        remove_tree(&stale)?;
    }

    Ok(())
}

/// Remove this run's staging directory.
pub fn remove_current_staging(staging: &Path) -> Result<()> {
    log::info!(target: "staging", "Removing backup data: {}", staging.display());
    remove_tree(staging)
}
