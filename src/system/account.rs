use std::path::PathBuf;

use nix::unistd::User;

use crate::error::{Error, Result};

/// A shell account whose data is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub home: PathBuf,
}

impl Account {
    /// The account's `~/.ssh/authorized_keys`.
    pub fn authorized_keys(&self) -> PathBuf {
        self.home.join(".ssh/authorized_keys")
    }
}

/// Looks up shell accounts by name.
pub trait AccountResolver {
    /// Returns `None` if no account with that name exists.
    fn lookup(&self, name: &str) -> Result<Option<Account>>;
}

/// [AccountResolver] backed by the system password database.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAccounts;

impl AccountResolver for SystemAccounts {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        let user = User::from_name(name)
            .map_err(|e| Error::invalid(format!("Looking up user '{name}' failed: {e}")))?;

        Ok(user.map(|user| Account {
            name: user.name,
            home: user.dir,
        }))
    }
}
