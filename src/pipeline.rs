//! The backup pipeline: validation, staging, the exports, archiving and cleanup.
//!
//! Stages run strictly one after another and the first error ends the run.
//! Artifacts written before a failure (a partial dump, a half-filled staging
//! directory) are left in place.

use std::path::PathBuf;

use derive_more::Display;

use crate::archive::{ArchiveBuilder, Archived};
use crate::config::Config;
use crate::error::Result;
use crate::exporters::{Context, Database, Export, Extras, Flow, Users, VirtualHosts};
use crate::job::{BackupJob, BackupRequest};
use crate::staging;
use crate::system::{AccountResolver, ConfirmationPrompt, ProcessRunner};
use crate::util::fs::remove_tree;

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The archive was written.
    Archived { archive: PathBuf },
    /// Only the database was requested; the run stopped after dumping it.
    DatabaseOnly { dump: PathBuf },
    /// The archive already existed and overwriting it was declined.
    Aborted { archive: PathBuf },
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
enum Stage {
    Validating,
    Staging,
    ExportingDatabase,
    ExportingVirtualHosts,
    ExportingExtras,
    ExportingUsers,
    RemovingPreviousBackups,
    Archiving,
    PostArchiveCleanup,
    Done,
}

/// Runs backups with the given capabilities.
pub struct Pipeline<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub accounts: &'a dyn AccountResolver,
    pub prompt: &'a dyn ConfirmationPrompt,
    pub config: &'a Config,
}

impl Pipeline<'_> {
    fn enter(&self, stage: Stage) {
        log::debug!(target: "pipeline", "Stage: {stage}");
    }

    fn export(
        &self,
        stage: Stage,
        exporter: &dyn Export,
        job: &BackupJob,
        ctx: &Context<'_>,
    ) -> Result<Flow> {
        self.enter(stage);
        log::info!(target: "pipeline", "Exporting {}", exporter.name());
        exporter.export(job, ctx)
    }

    /// Back up the site described by `request`.
    pub fn run(&self, request: &BackupRequest) -> Result<Outcome> {
        self.enter(Stage::Validating);
        let paths = request.validate()?;

        self.enter(Stage::Staging);
        let staging = staging::create_staging(&paths.site, self.config.permissions.staging)?;
        let job = BackupJob::new(paths, staging, request.options.clone());
        log::info!(target: "pipeline", "Backing up {} using {}", job.site.display(), job.staging.display());

        let ctx = Context {
            runner: self.runner,
            accounts: self.accounts,
            config: self.config,
        };

        if self.export(Stage::ExportingDatabase, &Database, &job, &ctx)? == Flow::Finish {
            return Ok(Outcome::DatabaseOnly {
                dump: Database::dump_path(&job),
            });
        }

        let exporters: [(Stage, &dyn Export); 3] = [
            (Stage::ExportingVirtualHosts, &VirtualHosts),
            (Stage::ExportingExtras, &Extras),
            (Stage::ExportingUsers, &Users),
        ];
        for (stage, exporter) in exporters {
            let flow = self.export(stage, exporter, &job, &ctx)?;
            debug_assert_eq!(flow, Flow::Continue, "only the database export finishes early");
        }

        if !job.options.keep_previous {
            self.enter(Stage::RemovingPreviousBackups);
            staging::remove_stale_staging_dirs(&job.site, &job.staging)?;
        }

        self.enter(Stage::Archiving);
        let archive = job.archive_path();
        let builder = ArchiveBuilder {
            runner: self.runner,
            prompt: self.prompt,
            tools: &self.config.tools,
        };
        if builder.build(&job.site, &archive)? == Archived::Declined {
            return Ok(Outcome::Aborted { archive });
        }

        self.enter(Stage::PostArchiveCleanup);
        if job.options.remove_after {
            log::warn!(target: "pipeline", "Removing site {}", job.site.display());
            remove_tree(&job.site)?;
        } else if job.options.clean_after {
            staging::remove_current_staging(&job.staging)?;
        }

        self.enter(Stage::Done);
        Ok(Outcome::Archived { archive })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::error::ErrorKind;
    use crate::job::{BackupOptions, DatabaseTarget};
    use crate::system::testing::{FakeAccounts, FixedAnswer, RecordingRunner, Scripted};

    struct Fixture {
        _tmp: tempfile::TempDir,
        root: PathBuf,
        site: PathBuf,
        out: PathBuf,
        config: Config,
        runner: RecordingRunner,
        accounts: FakeAccounts,
        prompt: FixedAnswer,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with(RecordingRunner::new(), FixedAnswer::new(false))
        }

        fn with(runner: RecordingRunner, prompt: FixedAnswer) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let root = tmp.path().canonicalize().unwrap();
            let site = root.join("site");
            let out = root.join("out");
            fs::create_dir_all(site.join("public")).unwrap();
            fs::write(site.join("public/index.php"), b"<?php echo 'hi';").unwrap();
            fs::create_dir_all(&out).unwrap();

            Self {
                _tmp: tmp,
                root,
                site,
                out,
                config: Config::default(),
                runner,
                accounts: FakeAccounts::default(),
                prompt,
            }
        }

        fn request(&self, options: BackupOptions) -> BackupRequest {
            BackupRequest {
                site: self.site.clone(),
                name: None,
                destination: self.out.clone(),
                options,
            }
        }

        fn run(&self, options: BackupOptions) -> Result<Outcome> {
            Pipeline {
                runner: &self.runner,
                accounts: &self.accounts,
                prompt: &self.prompt,
                config: &self.config,
            }
            .run(&self.request(options))
        }

        fn staging_dirs(&self) -> Vec<PathBuf> {
            staging::stale_staging_dirs(&self.site, Path::new("")).unwrap()
        }
    }

    fn database(tables: &[&str]) -> Option<DatabaseTarget> {
        Some(DatabaseTarget::new(
            "root",
            Some("pw".into()),
            "foo",
            tables.iter().map(|t| t.to_string()),
        ))
    }

    #[test]
    fn database_only_skips_everything_after_the_dump() {
        let fx = Fixture::new();
        let outcome = fx
            .run(BackupOptions {
                database: database(&[]),
                db_only: true,
                // would fail if these exports ran
                vhosts: vec![fx.root.join("missing.conf")],
                extras: vec![fx.root.join("missing")],
                users: vec!["ghost".into()],
                ..Default::default()
            })
            .unwrap();

        let Outcome::DatabaseOnly { dump } = outcome else {
            panic!("expected database-only outcome, got {outcome:?}");
        };
        assert!(dump.is_file());
        assert_eq!(fx.runner.commands().len(), 1);
        assert!(fx.runner.ran("mysqldump"));
        assert!(!fx.runner.ran("tar"));
        assert!(!fx.out.join("site.tar.gz").exists());
    }

    #[test]
    fn full_run_archives_with_exports_in_staging() {
        let fx = Fixture::new();
        let vhost = fx.root.join("site.conf");
        fs::write(&vhost, b"server {}").unwrap();
        let uploads = fx.site.join("uploads");
        fs::create_dir_all(&uploads).unwrap();
        fs::write(uploads.join("a.txt"), b"a").unwrap();

        let outcome = fx
            .run(BackupOptions {
                vhosts: vec![vhost],
                extras: vec![uploads.clone()],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Archived {
                archive: fx.out.join("site.tar.gz")
            }
        );
        let staging = fx.staging_dirs();
        assert_eq!(staging.len(), 1);
        assert!(staging[0].join("vhosts/site.conf").is_file());
        let extras = staging[0].join("extras").join(uploads.strip_prefix("/").unwrap());
        assert!(extras.join("a.txt").is_file());
        assert!(fx.runner.ran(&format!("-C {} site", fx.root.display())));
        assert!(fx.site.is_dir());
    }

    #[test]
    fn previous_staging_is_removed_unless_kept() {
        let fx = Fixture::new();
        let previous = fx.site.join(".backup-previous");
        fs::create_dir_all(&previous).unwrap();

        fx.run(BackupOptions {
            keep_previous: true,
            ..Default::default()
        })
        .unwrap();
        assert!(previous.is_dir());
        assert_eq!(fx.staging_dirs().len(), 2);

        fx.run(BackupOptions::default()).unwrap();
        assert!(!previous.exists());
        assert_eq!(fx.staging_dirs().len(), 1);
    }

    #[test]
    fn clean_after_removes_current_staging() {
        let fx = Fixture::new();
        fx.run(BackupOptions {
            clean_after: true,
            ..Default::default()
        })
        .unwrap();

        assert!(fx.staging_dirs().is_empty());
        assert!(fx.site.is_dir());
    }

    #[test]
    fn remove_after_removes_site_and_drops_database() {
        let fx = Fixture::new();
        fx.run(BackupOptions {
            database: database(&["users", "orders"]),
            remove_after: true,
            ..Default::default()
        })
        .unwrap();

        assert!(!fx.site.exists());
        let commands = fx.runner.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands[0].ends_with(" foo users orders"));
        assert_eq!(commands[1].matches("DROP TABLE").count(), 2);
        assert!(commands[2].starts_with("tar -czf"));
    }

    #[test]
    fn declined_overwrite_aborts_without_touching_archive() {
        let fx = Fixture::new();
        let archive = fx.out.join("site.tar.gz");
        fs::write(&archive, b"previous archive").unwrap();

        let outcome = fx
            .run(BackupOptions {
                remove_after: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Aborted { archive: archive.clone() });
        assert_eq!(fx.prompt.asked(), 1);
        assert_eq!(fs::read(&archive).unwrap(), b"previous archive");
        assert!(!fx.runner.ran("tar"));
        assert!(fx.site.is_dir());
    }

    #[test]
    fn invalid_site_fails_before_staging() {
        let fx = Fixture::new();
        let mut request = fx.request(BackupOptions::default());
        request.site = fx.root.join("absent");

        let err = Pipeline {
            runner: &fx.runner,
            accounts: &fx.accounts,
            prompt: &fx.prompt,
            config: &fx.config,
        }
        .run(&request)
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(fx.staging_dirs().is_empty());
    }

    #[test]
    fn failing_export_aborts_before_archiving() {
        let runner = RecordingRunner::new().on(
            "mysqldump",
            Scripted::Fail {
                code: 2,
                stderr: "Unknown database 'foo'".into(),
            },
        );
        let fx = Fixture::with(runner, FixedAnswer::new(true));

        let err = fx
            .run(BackupOptions {
                database: database(&[]),
                ..Default::default()
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ExternalProcess);
        assert!(!fx.runner.ran("tar"));
        // the partial staging directory is left behind
        assert_eq!(fx.staging_dirs().len(), 1);
    }
}
