use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use site_backup_lib::cli::{Action, Cli};
use site_backup_lib::config::Config;
use site_backup_lib::system::{
    ConfirmationPrompt, NonInteractive, ShellRunner, SystemAccounts, TerminalPrompt,
};
use site_backup_lib::{Outcome, Pipeline};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // init logger
    let mut env_logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.verbose {
        env_logger.filter_level(level);
    }
    if env_logger.try_init().is_err() {
        eprintln!("Initialising the logger failed");
    }

    let config = match &cli.config {
        Some(path) => match Config::load_or_init(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Reading the config file failed: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let args = match cli.action {
        Action::Backup(args) => args,
        Action::Restore => {
            log::error!("restore is not implemented");
            return ExitCode::FAILURE;
        }
    };

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            log::error!("Determining the current directory failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    let request = args.into_request(cwd);

    let prompt: &dyn ConfirmationPrompt = if cli.no_interaction {
        &NonInteractive
    } else {
        &TerminalPrompt
    };
    let runner = ShellRunner::new(&config.tools.shell);
    let pipeline = Pipeline {
        runner: &runner,
        accounts: &SystemAccounts,
        prompt,
        config: &config,
    };

    match pipeline.run(&request) {
        Ok(Outcome::Archived { archive }) => {
            let name = archive
                .file_name()
                .map(|name| name.to_string_lossy().trim_end_matches(".tar.gz").to_string())
                .unwrap_or_default();
            log::info!("Exported project: {name} ({})", archive.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::DatabaseOnly { dump }) => {
            log::info!("Exported only the database to {}", dump.display());
            ExitCode::SUCCESS
        }
        Ok(Outcome::Aborted { archive }) => {
            log::warn!("Backup aborted. {} was left untouched.", archive.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Backup failed ({}): {e}", e.kind());
            if log::max_level() == LevelFilter::Off {
                eprintln!("Backup failed: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
