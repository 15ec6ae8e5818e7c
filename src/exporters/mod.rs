//! Exporters collecting parts of a site installation into the staging directory.
//!
//! They run in a fixed order:
//!
//! - [Database]: gzip-compressed dump of the site database, optionally dropping it afterwards.
//! - [VirtualHosts]: copies of the virtual host configuration files.
//! - [Extras]: copies of arbitrary extra files and directories.
//! - [Users]: crontab and `authorized_keys` of shell users.

pub mod database;
pub mod extras;
pub mod users;
pub mod vhosts;

pub use database::Database;
pub use extras::Extras;
pub use users::Users;
pub use vhosts::VirtualHosts;

use crate::config::Config;
use crate::error::Result;
use crate::job::BackupJob;
use crate::system::{AccountResolver, ProcessRunner};

/// What the pipeline does after an export step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Nothing after this step runs. The run still succeeds.
    Finish,
}

/// Capabilities an exporter may use.
pub struct Context<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub accounts: &'a dyn AccountResolver,
    pub config: &'a Config,
}

/// A single export step of a backup run.
pub trait Export {
    /// Name used in log records.
    fn name(&self) -> &'static str;

    /// Export the data this step is responsible for into `job.staging`.
    ///
    /// Having nothing to export is not an error.
    fn export(&self, job: &BackupJob, ctx: &Context<'_>) -> Result<Flow>;
}
