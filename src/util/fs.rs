//! Recursive directory copy and removal.
//!
//! Only regular files and directories are copied. Symbolic links and special
//! files inside a copied tree are skipped with a warning. Removal never
//! follows symbolic links: a link is unlinked, its target is left alone.

use std::fs::{self, DirBuilder};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;

use crate::config::Mode;
use crate::error::{Error, Result};

/// Create `dir` and missing parents with `mode`, then enforce `mode` on `dir`
/// itself regardless of the process umask.
pub fn create_dir_with_mode(dir: &Path, mode: Mode) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(mode.0)
        .create(dir)
        .map_err(|e| Error::io(dir, e))?;
    fs::set_permissions(dir, fs::Permissions::from_mode(mode.0)).map_err(|e| Error::io(dir, e))
}

/// Copy the directory `source` to `target`.
///
/// An existing `target` is removed first, the copy never merges. Directories
/// are recreated with `mode` before their contents are written.
pub fn copy_tree(source: &Path, target: &Path, mode: Mode) -> Result<()> {
    match fs::symlink_metadata(target) {
        Ok(meta) if meta.is_dir() => remove_tree(target)?,
        Ok(_) => fs::remove_file(target).map_err(|e| Error::io(target, e))?,
        Err(_) => {}
    }

    log::debug!(target: "util::fs", "Copy {} to {}", source.display(), target.display());
    create_dir_with_mode(target, mode)?;
    copy_dir_contents(source, target, mode)
}

fn copy_dir_contents(source: &Path, target: &Path, mode: Mode) -> Result<()> {
    let entries = fs::read_dir(source).map_err(|e| Error::io(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(source, e))?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| Error::io(&from, e))?;

        if file_type.is_dir() {
            create_dir_with_mode(&to, mode)?;
            copy_dir_contents(&from, &to, mode)?;
        } else if file_type.is_file() {
            fs::copy(&from, &to).map_err(|e| Error::io(&from, e))?;
        } else {
            log::warn!(target: "util::fs", "Skipping {}: not a regular file or directory", from.display());
        }
    }

    Ok(())
}

/// Remove `directory` and everything below it, dotfiles included.
///
/// The first entry that can't be removed aborts the removal.
pub fn remove_tree(directory: &Path) -> Result<()> {
    let entries = fs::read_dir(directory).map_err(|e| Error::io(directory, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(directory, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

        if file_type.is_dir() {
            remove_tree(&path)?;
        } else {
            fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        }
    }

    fs::remove_dir(directory).map_err(|e| Error::io(directory, e))
}
