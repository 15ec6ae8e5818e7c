use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use crate::job::{BackupOptions, BackupRequest, DatabaseTarget};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbosity of the command output.
    #[arg(long, global = true)]
    pub verbose: Option<LevelFilter>,

    /// Configuration file of tool locations and permissions.
    ///
    /// Created with the defaults if it doesn't exist.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Answer every confirmation with "no" instead of asking.
    #[arg(long, short = 'n', global = true)]
    pub no_interaction: bool,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Backup a website.
    Backup(BackupArgs),
    /// Restore a website. (Not implemented)
    Restore,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Site data to be backed up.
    pub site: PathBuf,

    /// Project name, used as archive name. Defaults to the site's directory name.
    pub name: Option<String>,

    /// Shell users whose data should be exported alongside the backup.
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// Database user.
    #[arg(long, default_value = "root")]
    pub dbuser: String,

    /// Database user password.
    #[arg(long, env = "SITE_BACKUP_DBPASS", hide_env_values = true)]
    pub dbpass: Option<String>,

    /// Database name to be used for export.
    #[arg(long)]
    pub dbname: Option<String>,

    /// Database tables to be exported (acts as an allow-list).
    #[arg(long = "dbtable")]
    pub dbtables: Vec<String>,

    /// Should only the database be exported?
    #[arg(long)]
    pub dbonly: bool,

    /// Should the database be kept once removing the site after backup.
    #[arg(long)]
    pub dont_drop_db: bool,

    /// Directory to export the backup to. Defaults to the current directory.
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Should previous export data be kept.
    #[arg(long)]
    pub keep_previous: bool,

    /// Should backup data be removed after export.
    #[arg(long)]
    pub clean_after: bool,

    /// Should the site be removed after export.
    #[arg(long)]
    pub remove_after: bool,

    /// Virtual hosts to be exported.
    #[arg(long = "vhost")]
    pub vhosts: Vec<PathBuf>,

    /// Extra files to be exported.
    #[arg(long = "extra")]
    pub extras: Vec<PathBuf>,
}

impl BackupArgs {
    /// Turn the arguments into a [BackupRequest], archiving into
    /// `default_destination` unless `--destination` is given.
    pub fn into_request(self, default_destination: PathBuf) -> BackupRequest {
        let database = self
            .dbname
            .filter(|name| !name.is_empty())
            .map(|name| DatabaseTarget::new(self.dbuser, self.dbpass, name, self.dbtables));

        BackupRequest {
            site: self.site,
            name: self.name.filter(|name| !name.is_empty()),
            destination: self.destination.unwrap_or(default_destination),
            options: BackupOptions {
                database,
                vhosts: self.vhosts,
                extras: self.extras,
                users: self.users,
                db_only: self.dbonly,
                dont_drop_db: self.dont_drop_db,
                keep_previous: self.keep_previous,
                clean_after: self.clean_after,
                remove_after: self.remove_after,
            },
        }
    }
}
