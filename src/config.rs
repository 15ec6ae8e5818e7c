//! Tool locations and permission modes, optionally loaded from a TOML file.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Error, Result};

/// Configuration of the external tools and the permissions of created directories.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// External binaries invoked during a backup.
    #[serde(default)]
    pub tools: Tools,

    /// Permission modes of directories created inside the staging area.
    #[serde(default)]
    pub permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Tools {
    /// Shell used to run every command line.
    pub shell: PathBuf,
    /// Database dump tool, called with `--skip-extended-insert`.
    pub dump: String,
    /// Database client used to drop databases or tables.
    pub client: String,
    pub tar: String,
    pub crontab: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
            dump: "mysqldump".into(),
            client: "mysql".into(),
            tar: "tar".into(),
            crontab: "crontab".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Permissions {
    /// Mode of the staging directory itself.
    ///
    /// The staging area holds database dumps and SSH keys, so the default
    /// only grants access to the owner.
    pub staging: Mode,
    /// Mode of directories recreated when copying extras.
    pub copy: Mode,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            staging: Mode(0o700),
            copy: Mode(0o755),
        }
    }
}

/// Unix permission bits, written as an octal string (`"755"`) in the config file.
#[derive(Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mode(pub u32);

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mode({:o})", self.0)
    }
}

impl TryFrom<String> for Mode {
    type Error = ConfigError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let digits = value.trim().trim_start_matches("0o");
        match u32::from_str_radix(digits, 8) {
            Ok(mode) if mode <= 0o7777 => Ok(Self(mode)),
            _ => Err(ConfigError::Mode(value)),
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        format!("{:o}", mode.0)
    }
}

impl Config {
    /// Load the configuration at `path`.
    ///
    /// A missing file is initialised with the default configuration, which is
    /// then returned.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        let wrap = |source: ConfigError| Error::Config {
            path: path.to_path_buf(),
            source,
        };

        match std::fs::read_to_string(path) {
            Ok(config_str) => toml::from_str(&config_str).map_err(|e| wrap(e.into())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!(
                    "Writing default config to {} because it doesn't exist yet",
                    path.display()
                );
                let default_config = Self::default();
                let config_str =
                    toml::to_string_pretty(&default_config).map_err(|e| wrap(e.into()))?;
                if let Err(e) = std::fs::write(path, config_str) {
                    log::warn!("Writing default config to {} failed: {e}", path.display());
                }

                Ok(default_config)
            }
            Err(e) => Err(wrap(e.into())),
        }
    }
}
