//! Copies of extra files and directories into `extras/`, keeping their
//! absolute location: `/etc/cron.d/site` ends up at `extras/etc/cron.d/site`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::{Context, Export, Flow};
use crate::error::{Error, Result};
use crate::job::BackupJob;
use crate::util::fs::{copy_tree, create_dir_with_mode};

const EXTRAS_DIR: &str = "extras";

#[derive(Debug, Default, Clone, Copy)]
pub struct Extras;

/// `path` below `base`, with its root and prefix components dropped.
fn rebase(base: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    base.join(relative)
}

impl Export for Extras {
    fn name(&self) -> &'static str {
        "extras"
    }

    fn export(&self, job: &BackupJob, ctx: &Context<'_>) -> Result<Flow> {
        let extras_dir = job.staging.join(EXTRAS_DIR);
        let mode = ctx.config.permissions.copy;

        for extra in &job.options.extras {
            let resolved = extra.canonicalize().map_err(|e| Error::not_found(extra, e))?;
            let parent = resolved.parent().unwrap_or(Path::new("/"));
            create_dir_with_mode(&extras_dir, mode)?;

            if resolved.is_dir() {
                if job.staging.starts_with(&resolved) {
                    return Err(Error::invalid(format!(
                        "Extra {} contains the staging directory",
                        resolved.display()
                    )));
                }
                let target = rebase(&extras_dir, &resolved);
                log::info!(target: "export::extras", "Exporting directory {} to {}", resolved.display(), target.display());
                if let Some(target_parent) = target.parent() {
                    create_dir_with_mode(target_parent, mode)?;
                }
                copy_tree(&resolved, &target, mode)?;
            } else {
                let target_dir = rebase(&extras_dir, parent);
                create_dir_with_mode(&target_dir, mode)?;
                let Some(file_name) = resolved.file_name() else {
                    continue;
                };
                let target = target_dir.join(file_name);
                log::info!(target: "export::extras", "Exporting file {} to {}", resolved.display(), target.display());
                fs::copy(&resolved, &target).map_err(|e| Error::io(&resolved, e))?;
            }
        }

        Ok(Flow::Continue)
    }
}
