//! In-memory stand-ins for the system capabilities.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Account, AccountResolver, ConfirmationPrompt, ProcessRunner, ShellCommand};
use crate::error::{Error, Result};
use crate::job::{BackupJob, BackupOptions};

pub(crate) enum Scripted {
    Output(Vec<u8>),
    Fail { code: i32, stderr: String },
}

/// Records every command line. Commands containing a scripted needle get the
/// scripted response, everything else succeeds without output.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    commands: RefCell<Vec<String>>,
    scripted: Vec<(String, Scripted)>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, needle: &str, response: Scripted) -> Self {
        self.scripted.push((needle.to_string(), response));
        self
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub(crate) fn ran(&self, needle: &str) -> bool {
        self.commands.borrow().iter().any(|line| line.contains(needle))
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, command: &ShellCommand, stdout: Option<&mut dyn Write>) -> Result<()> {
        self.commands.borrow_mut().push(command.line().to_string());

        let response = self
            .scripted
            .iter()
            .find(|(needle, _)| command.line().contains(needle.as_str()))
            .map(|(_, response)| response);

        match response {
            Some(Scripted::Output(bytes)) => {
                if let Some(sink) = stdout {
                    sink.write_all(bytes).map_err(|source| Error::Stream {
                        command: command.to_string(),
                        source,
                    })?;
                }
                Ok(())
            }
            Some(Scripted::Fail { code, stderr }) => Err(Error::ExternalProcess {
                command: command.to_string(),
                code: Some(*code),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeAccounts {
    homes: HashMap<String, PathBuf>,
}

impl FakeAccounts {
    pub(crate) fn with(mut self, name: &str, home: impl Into<PathBuf>) -> Self {
        self.homes.insert(name.to_string(), home.into());
        self
    }
}

impl AccountResolver for FakeAccounts {
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        Ok(self.homes.get(name).map(|home| Account {
            name: name.to_string(),
            home: home.clone(),
        }))
    }
}

/// Always gives the same answer and counts how often it was asked.
pub(crate) struct FixedAnswer {
    answer: bool,
    asked: Cell<usize>,
}

impl FixedAnswer {
    pub(crate) fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: Cell::new(0),
        }
    }

    pub(crate) fn asked(&self) -> usize {
        self.asked.get()
    }
}

impl ConfirmationPrompt for FixedAnswer {
    fn confirm(&self, _question: &str) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.answer
    }
}

/// A job over `<root>/site` with staging `<root>/site/.backup-test`,
/// archiving into `<root>/out`. All three directories are created.
pub(crate) fn job_in(root: &Path, options: BackupOptions) -> BackupJob {
    let site = root.join("site");
    let staging = site.join(".backup-test");
    let destination = root.join("out");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::create_dir_all(&destination).unwrap();

    BackupJob {
        site,
        staging,
        destination,
        archive_name: "site".into(),
        options,
    }
}
