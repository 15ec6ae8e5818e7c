//! Errors that abort a backup run.

use std::io;
use std::path::PathBuf;

use derive_more::{Display, Error, From};

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [Error].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// Bad or missing arguments, credentials or accounts.
    #[display("invalid configuration")]
    InvalidConfiguration,
    /// A source path could not be resolved.
    #[display("path not found")]
    PathNotFound,
    /// Copying, removing or opening a file failed.
    #[display("i/o error")]
    Io,
    /// An external tool could not be run or exited unsuccessfully.
    #[display("external process error")]
    ExternalProcess,
}

/// Every failure is fatal to the run. Nothing is retried.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// Arguments, credentials or accounts are missing or malformed.
    #[display("Invalid configuration: {_0}")]
    InvalidConfiguration(#[error(not(source))] String),

    /// Reading or writing the configuration file failed.
    #[display("Configuration file {}: {source}", path.display())]
    Config { path: PathBuf, source: ConfigError },

    /// A source path could not be resolved to a canonical path.
    #[display("{} could not be resolved: {source}", path.display())]
    PathNotFound { path: PathBuf, source: io::Error },

    /// A filesystem operation failed on `path`.
    #[display("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The external command could not be started at all.
    #[display("Failed to run `{command}`: {source}")]
    ProcessNotRun { command: String, source: io::Error },

    /// Forwarding the output of the external command failed.
    #[display("Streaming the output of `{command}` failed: {source}")]
    Stream { command: String, source: io::Error },

    /// The external command exited with a non-zero status.
    #[display("`{command}` failed with {}: {}", exit_code_display(*code), stderr.trim())]
    ExternalProcess {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_code_display(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::PathNotFound {
            path: path.into(),
            source,
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) | Self::Config { .. } => ErrorKind::InvalidConfiguration,
            Self::PathNotFound { .. } => ErrorKind::PathNotFound,
            Self::Io { .. } | Self::Stream { .. } => ErrorKind::Io,
            Self::ProcessNotRun { .. } | Self::ExternalProcess { .. } => ErrorKind::ExternalProcess,
        }
    }
}

/// Failures while loading or initialising the TOML configuration.
#[derive(Debug, Display, Error, From)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[display("{_0}")]
    Io(io::Error),
    /// The file is not valid TOML for [`Config`](crate::config::Config).
    #[display("{_0}")]
    Parse(toml::de::Error),
    /// The default configuration could not be serialized.
    #[display("{_0}")]
    Serialize(toml::ser::Error),
    /// A permission mode is not an octal number.
    #[display("invalid permission mode '{_0}'")]
    #[from(ignore)]
    Mode(#[error(not(source))] String),
}
