//! Crontab and `authorized_keys` of shell users into `users/`.

use std::fs::{self, OpenOptions};

use super::{Context, Export, Flow};
use crate::error::{Error, Result};
use crate::job::BackupJob;
use crate::system::ShellCommand;
use crate::util::fs::create_dir_with_mode;

const USERS_DIR: &str = "users";

/// Stderr of `crontab -l` for a user without a crontab.
const NO_CRONTAB: &str = "no crontab for";

/// For each user `<name>.crontab` and `<name>.authorized_keys` are written.
///
/// A user without a crontab gets an empty crontab file. A missing
/// `authorized_keys` file is an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct Users;

impl Export for Users {
    fn name(&self) -> &'static str {
        "users"
    }

    fn export(&self, job: &BackupJob, ctx: &Context<'_>) -> Result<Flow> {
        let users_dir = job.staging.join(USERS_DIR);

        for name in &job.options.users {
            let account = ctx
                .accounts
                .lookup(name)?
                .ok_or_else(|| Error::invalid(format!("User with username ({name}) not found")))?;
            create_dir_with_mode(&users_dir, ctx.config.permissions.copy)?;

            log::info!(target: "export::users", "Exporting crontab of user {name}");
            let crontab_path = users_dir.join(format!("{name}.crontab"));
            let mut crontab = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crontab_path)
                .map_err(|e| Error::io(&crontab_path, e))?;

            let list = ShellCommand::new(&ctx.config.tools.crontab)
                .arg("-l")
                .arg("-u")
                .arg(name);
            match ctx.runner.run(&list, Some(&mut crontab)) {
                Ok(()) => {}
                Err(Error::ExternalProcess { stderr, .. }) if stderr.contains(NO_CRONTAB) => {
                    log::debug!(target: "export::users", "User {name} has no crontab");
                }
                Err(e) => return Err(e),
            }

            let keys = account.authorized_keys();
            let backup_keys = users_dir.join(format!("{name}.authorized_keys"));
            log::info!(target: "export::users", "Exporting {} of user {name}", keys.display());
            fs::copy(&keys, &backup_keys).map_err(|e| Error::io(&keys, e))?;
        }

        Ok(Flow::Continue)
    }
}
