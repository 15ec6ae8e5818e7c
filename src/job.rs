//! What a backup run is asked to do ([BackupRequest]) and the validated,
//! immutable job derived from it ([BackupJob]).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Database and table names end up in SQL identifiers and command lines.
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern is valid"));

/// Shell user names become file names below `users/`.
static USER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("user name pattern is valid"));

/// The database to dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    /// Allow-list of tables. Empty means the whole database.
    pub tables: Vec<String>,
}

impl DatabaseTarget {
    pub fn new(
        user: impl Into<String>,
        password: Option<String>,
        name: impl Into<String>,
        tables: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut unique = Vec::new();
        for table in tables {
            if !unique.contains(&table) {
                unique.push(table);
            }
        }

        Self {
            user: user.into(),
            password,
            name: name.into(),
            tables: unique,
        }
    }
}

/// Options of a run. Every list may be empty, in which case the
/// corresponding export does nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupOptions {
    pub database: Option<DatabaseTarget>,
    pub vhosts: Vec<PathBuf>,
    pub extras: Vec<PathBuf>,
    pub users: Vec<String>,
    /// Stop right after the database dump.
    pub db_only: bool,
    /// Keep the database when the site is removed.
    pub dont_drop_db: bool,
    /// Keep staging directories of earlier runs.
    pub keep_previous: bool,
    /// Remove this run's staging directory after archiving.
    pub clean_after: bool,
    /// Remove the whole site after archiving.
    pub remove_after: bool,
}

impl BackupOptions {
    /// The database (or its listed tables) is dropped after a successful dump.
    pub fn drops_database(&self) -> bool {
        self.remove_after && !self.dont_drop_db
    }
}

/// An unvalidated backup request, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    pub site: PathBuf,
    pub name: Option<String>,
    pub destination: PathBuf,
    pub options: BackupOptions,
}

/// Site and destination resolved to canonical directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub site: PathBuf,
    pub destination: PathBuf,
    pub archive_name: String,
}

impl BackupRequest {
    /// Resolve and check the site and destination, and the names used later
    /// in command lines.
    pub fn validate(&self) -> Result<ResolvedPaths> {
        let site = existing_dir(&self.site, "Site")?;
        let destination = existing_dir(&self.destination, "Destination")?;

        if self.options.remove_after && destination.starts_with(&site) {
            return Err(Error::invalid(format!(
                "Destination {} lies inside site {} which is removed after the backup",
                destination.display(),
                site.display()
            )));
        }

        if let Some(database) = &self.options.database {
            check_identifier("database", &database.name)?;
            for table in &database.tables {
                check_identifier("table", table)?;
            }
        }
        for user in &self.options.users {
            if !USER_NAME.is_match(user) || is_dot_entry(user) {
                return Err(Error::invalid(format!("Invalid user name '{user}'")));
            }
        }

        let archive_name = match &self.name {
            Some(name) => name.clone(),
            None => site
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if archive_name.is_empty() || archive_name.contains('/') || is_dot_entry(&archive_name) {
            return Err(Error::invalid(format!(
                "Invalid archive name '{archive_name}'"
            )));
        }

        Ok(ResolvedPaths {
            site,
            destination,
            archive_name,
        })
    }
}

fn existing_dir(path: &Path, what: &str) -> Result<PathBuf> {
    let resolved = path.canonicalize().map_err(|e| {
        Error::invalid(format!(
            "{what} {} does not exist or is not a directory: {e}",
            path.display()
        ))
    })?;
    if !resolved.is_dir() {
        return Err(Error::invalid(format!(
            "{what} {} is not a directory",
            path.display()
        )));
    }

    Ok(resolved)
}

fn is_dot_entry(name: &str) -> bool {
    name == "." || name == ".."
}

fn check_identifier(what: &str, value: &str) -> Result<()> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(Error::invalid(format!("Invalid {what} name '{value}'")))
    }
}

/// A validated backup run. Created once the staging directory exists and
/// passed by reference through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    pub site: PathBuf,
    /// `<site>/.backup-<token>`
    pub staging: PathBuf,
    pub destination: PathBuf,
    pub archive_name: String,
    pub options: BackupOptions,
}

impl BackupJob {
    pub fn new(paths: ResolvedPaths, staging: PathBuf, options: BackupOptions) -> Self {
        debug_assert_eq!(staging.parent(), Some(paths.site.as_path()));

        Self {
            site: paths.site,
            staging,
            destination: paths.destination,
            archive_name: paths.archive_name,
            options,
        }
    }

    /// `<destination>/<name>.tar.gz`
    pub fn archive_path(&self) -> PathBuf {
        self.destination
            .join(format!("{}.tar.gz", self.archive_name))
    }
}
