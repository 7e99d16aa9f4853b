//! Non-interactive CLI session runner.
//!
//! # Responsibility
//! - Open a task store, run the session-start recurrence pass and print
//!   per-project status totals.
//! - Keep output line-oriented and deterministic for scripting.
//!
//! # Invariants
//! - Failures print one `error=` line and exit with status 1.

use std::env;
use std::process::ExitCode;

use log::error;
use taskorg_core::{
    default_log_level, init_logging, ProjectSummary, RepoError, SqliteTaskRepository,
    TaskOrganizer,
};

const DEFAULT_DB_PATH: &str = "taskorg.db";

/// Runtime settings resolved from the first argument and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CliConfig {
    db_path: String,
    log_dir: Option<String>,
    log_level: String,
}

impl CliConfig {
    fn resolve(arg: Option<String>, env_var: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = arg
            .or_else(|| env_var("TASKORG_DB"))
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let log_dir = env_var("TASKORG_LOG_DIR").filter(|dir| !dir.trim().is_empty());
        let log_level = env_var("TASKORG_LOG_LEVEL")
            .unwrap_or_else(|| default_log_level().as_str().to_string());
        Self {
            db_path,
            log_dir,
            log_level,
        }
    }

    fn from_env() -> Self {
        Self::resolve(env::args().nth(1), |key| env::var(key).ok())
    }
}

fn run(config: &CliConfig) -> Result<(), RepoError> {
    let repo = SqliteTaskRepository::open(&config.db_path)?;
    let mut organizer = TaskOrganizer::new(repo);

    let report = organizer.start_session()?;
    println!(
        "taskorg recurrence created={} skipped={} failed={}",
        report.created, report.skipped, report.failed
    );

    for summary in organizer.project_summaries()? {
        println!("{}", summary_line(&summary));
    }
    Ok(())
}

fn summary_line(summary: &ProjectSummary) -> String {
    format!(
        "project id={} name={:?} pending={} completed={} overdue={}",
        summary.project.id,
        summary.project.name,
        summary.counts.pending,
        summary.counts.completed,
        summary.counts.overdue
    )
}

fn main() -> ExitCode {
    let config = CliConfig::from_env();

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("error=logging_init_failed detail={err}");
            return ExitCode::FAILURE;
        }
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_session module=cli status=error error={err}");
            eprintln!("error={err}");
            ExitCode::FAILURE
        }
    }
}
