use std::io::{self, BufRead, Write};

/// Asks the operator a yes/no question.
pub trait ConfirmationPrompt {
    fn confirm(&self, question: &str) -> bool;
}

/// Asks on the terminal. Anything but `y`/`yes` declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl ConfirmationPrompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{question} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

/// Answers every question with the default "no" without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl ConfirmationPrompt for NonInteractive {
    fn confirm(&self, question: &str) -> bool {
        log::info!("{question} [y/N] n (non-interactive)");
        false
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
