use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::{Error, Result};

const REDACTED: &str = "****";

/// A command line for `sh -c`, built from individually quoted arguments.
///
/// Alongside the real line a redacted form is kept, in which secrets are
/// masked. Only the redacted form is ever logged or put into errors.
#[derive(Clone, PartialEq, Eq)]
pub struct ShellCommand {
    line: String,
    redacted: String,
}

impl ShellCommand {
    pub fn new(program: &str) -> Self {
        let program = shell_quote(program);
        Self {
            line: program.clone(),
            redacted: program,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        let arg = shell_quote(arg.as_ref());
        self.push(&arg, &arg);
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().fold(self, Self::arg)
    }

    /// Append `prefix` directly followed by `secret` as one argument,
    /// e.g. `-p<password>`.
    pub fn secret_arg(mut self, prefix: &str, secret: &str) -> Self {
        let real = shell_quote(&format!("{prefix}{secret}"));
        let masked = shell_quote(&format!("{prefix}{REDACTED}"));
        self.push(&real, &masked);
        self
    }

    fn push(&mut self, real: &str, masked: &str) {
        self.line.push(' ');
        self.line.push_str(real);
        self.redacted.push(' ');
        self.redacted.push_str(masked);
    }

    /// The command line handed to the shell.
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShellCommand").field(&self.redacted).finish()
    }
}

/// Quote `word` for a POSIX shell. Words made only of safe characters are
/// left as they are.
pub fn shell_quote(word: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Runs external commands to completion.
///
/// There is no timeout: dumps and archives of large sites may take hours.
pub trait ProcessRunner {
    /// Run `command`, streaming its standard output into `stdout` when given.
    ///
    /// A non-zero exit status is an [`Error::ExternalProcess`].
    fn run(&self, command: &ShellCommand, stdout: Option<&mut dyn Write>) -> Result<()>;
}

/// [ProcessRunner] executing command lines with a system shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl ShellRunner {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

impl ProcessRunner for ShellRunner {
    fn run(&self, command: &ShellCommand, stdout: Option<&mut dyn Write>) -> Result<()> {
        log::debug!(target: "system::process", "Running: {command}");

        let not_run = |source| Error::ProcessNotRun {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command.line())
            .stdin(Stdio::null())
            .stdout(if stdout.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .spawn()
            .map_err(not_run)?;

        // drain stderr concurrently so a chatty process can't block on a full pipe
        let stderr_pipe = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr_pipe {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });

        let streamed = match (stdout, child.stdout.take()) {
            (Some(sink), Some(mut pipe)) => {
                io::copy(&mut pipe, &mut *sink).and_then(|_| sink.flush())
            }
            _ => Ok(()),
        };

        let status = child.wait().map_err(not_run)?;
        let stderr = stderr_reader
            .join()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default();

        if !status.success() {
            return Err(Error::ExternalProcess {
                command: command.to_string(),
                code: status.code(),
                stderr,
            });
        }
        streamed.map_err(|source| Error::Stream {
            command: command.to_string(),
            source,
        })?;

        // relay stderr
        if !stderr.trim().is_empty() {
            log::warn!(target: "system::process", "{}", stderr.trim_end());
        }

        Ok(())
    }
}
