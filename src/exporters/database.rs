//! Dump of the site database into `database.sql.gz`.

use std::fs::File;
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;

use super::{Context, Export, Flow};
use crate::config::Tools;
use crate::error::{Error, Result};
use crate::job::{BackupJob, DatabaseTarget};
use crate::system::ShellCommand;

const DB_DUMP_FILE: &str = "database.sql.gz";

/// Dumps the database one row per `INSERT`, optionally restricted to an
/// allow-list of tables.
///
/// When the site is removed after the backup the dumped database (or only the
/// listed tables) is dropped, unless it is to be kept. With `db_only` the run
/// finishes right after the dump and nothing is dropped.
///
/// A failed dump or drop leaves the partial dump file in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct Database;

impl Database {
    /// Location of the dump inside the staging directory.
    pub fn dump_path(job: &BackupJob) -> PathBuf {
        job.staging.join(DB_DUMP_FILE)
    }

    fn dump_command(tools: &Tools, target: &DatabaseTarget, password: &str) -> ShellCommand {
        ShellCommand::new(&tools.dump)
            .arg("--skip-extended-insert")
            .arg("-u")
            .arg(&target.user)
            .secret_arg("-p", password)
            .arg(&target.name)
            .args(&target.tables)
    }

    fn drop_command(tools: &Tools, target: &DatabaseTarget, password: &str) -> ShellCommand {
        let statement = if target.tables.is_empty() {
            format!("DROP DATABASE `{}`;", target.name)
        } else {
            let drops: Vec<_> = target
                .tables
                .iter()
                .map(|table| format!("DROP TABLE `{table}`;"))
                .collect();
            format!("USE `{}`; {}", target.name, drops.join(" "))
        };

        ShellCommand::new(&tools.client)
            .arg("-u")
            .arg(&target.user)
            .secret_arg("-p", password)
            .arg("-e")
            .arg(statement)
    }
}

impl Export for Database {
    fn name(&self) -> &'static str {
        "database"
    }

    fn export(&self, job: &BackupJob, ctx: &Context<'_>) -> Result<Flow> {
        let Some(target) = &job.options.database else {
            return Ok(Flow::Continue);
        };

        let password = match &target.password {
            Some(password) if !target.user.is_empty() && !password.is_empty() => password,
            _ => {
                return Err(Error::invalid(format!(
                    "Database user ({}) or password has not been specified",
                    target.user
                )))
            }
        };

        log::info!(target: "export::database", "Dumping database: {}", target.name);
        if !target.tables.is_empty() {
            log::debug!(target: "export::database", "Restricting dump to tables: {}", target.tables.join(", "));
        }

        let db_dump_file = Self::dump_path(job);
        let file = File::create(&db_dump_file).map_err(|e| Error::io(&db_dump_file, e))?;
        let mut encoder = GzEncoder::new(file, Compression::default());

        let dump = Self::dump_command(&ctx.config.tools, target, password);
        ctx.runner.run(&dump, Some(&mut encoder))?;
        encoder
            .finish()
            .map_err(|e| Error::io(&db_dump_file, e))?;

        log::info!(target: "export::database", "Exported database to: {}", db_dump_file.display());

        if job.options.db_only {
            log::info!(target: "export::database", "Requested only database export, exiting.");
            return Ok(Flow::Finish);
        }

        if job.options.drops_database() {
            if target.tables.is_empty() {
                log::warn!(target: "export::database", "Dropping database {}", target.name);
            } else {
                log::warn!(
                    target: "export::database",
                    "Dropping tables {} of database {}",
                    target.tables.join(", "),
                    target.name
                );
            }
            let drop = Self::drop_command(&ctx.config.tools, target, password);
            ctx.runner.run(&drop, None)?;
        }

        Ok(Flow::Continue)
    }
}
