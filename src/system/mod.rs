//! Capabilities the pipeline needs from the host system.
//!
//! - [ProcessRunner]: run external tools (`mysqldump`, `mysql`, `tar`, `crontab`).
//! - [AccountResolver]: look up shell accounts.
//! - [ConfirmationPrompt]: ask the operator before overwriting an archive.

mod account;
mod process;
mod prompt;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{Account, AccountResolver, SystemAccounts};
pub use process::{shell_quote, ProcessRunner, ShellCommand, ShellRunner};
pub use prompt::{ConfirmationPrompt, NonInteractive, TerminalPrompt};
