//! Compression of the site tree into `<destination>/<name>.tar.gz`.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::config::Tools;
use crate::error::{Error, Result};
use crate::system::{ConfirmationPrompt, ProcessRunner, ShellCommand};

/// Outcome of [ArchiveBuilder::build].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Archived {
    Written,
    /// An archive already existed and overwriting it was declined.
    Declined,
}

/// Archives a site with `tar`, asking before an existing archive is replaced.
pub struct ArchiveBuilder<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub prompt: &'a dyn ConfirmationPrompt,
    pub tools: &'a Tools,
}

impl ArchiveBuilder<'_> {
    /// Archive the whole `site` directory, including any staging directories
    /// still inside it, into `archive`.
    ///
    /// Entries in the archive are rooted at the site's directory name.
    pub fn build(&self, site: &Path, archive: &Path) -> Result<Archived> {
        if fs::symlink_metadata(archive).is_ok() {
            if !self.prompt.confirm("Backup file exists. Overwrite?") {
                return Ok(Archived::Declined);
            }
            log::debug!(target: "archive", "Removing existing archive {}", archive.display());
            fs::remove_file(archive).map_err(|e| Error::io(archive, e))?;
        }

        let parent = site.parent().unwrap_or(Path::new("/"));
        let base = site.file_name().unwrap_or(OsStr::new("."));

        log::info!(target: "archive", "Archiving {} to {}", site.display(), archive.display());
        let tar = ShellCommand::new(&self.tools.tar)
            .arg("-czf")
            .arg(archive.to_string_lossy())
            .arg("-C")
            .arg(parent.to_string_lossy())
            .arg(base.to_string_lossy());
        self.runner.run(&tar, None)?;

        Ok(Archived::Written)
    }
}
