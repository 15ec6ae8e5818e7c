//! Copies of virtual host configuration files into `vhosts/`.

use std::fs;

use super::{Context, Export, Flow};
use crate::error::{Error, Result};
use crate::job::BackupJob;
use crate::util::fs::create_dir_with_mode;

const VHOSTS_DIR: &str = "vhosts";

#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualHosts;

impl Export for VirtualHosts {
    fn name(&self) -> &'static str {
        "virtual hosts"
    }

    fn export(&self, job: &BackupJob, ctx: &Context<'_>) -> Result<Flow> {
        let vhosts_dir = job.staging.join(VHOSTS_DIR);

        for vhost in &job.options.vhosts {
            let resolved = vhost.canonicalize().map_err(|e| Error::not_found(vhost, e))?;
            let Some(file_name) = resolved.file_name() else {
                return Err(Error::invalid(format!(
                    "Virtual host {} has no file name",
                    resolved.display()
                )));
            };

            create_dir_with_mode(&vhosts_dir, ctx.config.permissions.copy)?;
            let destination = vhosts_dir.join(file_name);
            log::info!(target: "export::vhosts", "Exporting virtual host {} to {}", resolved.display(), destination.display());
            fs::copy(&resolved, &destination).map_err(|e| Error::io(&resolved, e))?;
        }

        Ok(Flow::Continue)
    }
}
