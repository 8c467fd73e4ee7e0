//! One-shot command-line entry point.
//!
//! # Responsibility
//! - Read and update user state through the same service as the server.
//! - Print templates and day keys for quick local checks.

use chrono::{NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dayboard_core::db::open_db;
use dayboard_core::{
    core_version, defaults_for, init_console_logging, ping, DayKey, SqliteStateRepository,
    StateService, TemplateCategory, UserStatePatch, DEFAULT_USER_ID,
};
use std::path::PathBuf;
use std::process::ExitCode;

const DB_PATH_ENV: &str = "DAYBOARD_DB_PATH";

#[derive(Parser)]
#[command(name = "dayboard", version, about = "Daily checklist state tool")]
struct Cli {
    /// SQLite database path; falls back to DAYBOARD_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level for stderr diagnostics.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the reconciled state for a user.
    Get {
        #[arg(long, default_value = DEFAULT_USER_ID)]
        user: String,
        /// Pretend the current day is YYYY-MM-DD (reset zone).
        #[arg(long)]
        at_day: Option<String>,
    },
    /// Apply a partial JSON update for a user.
    Put {
        #[arg(long, default_value = DEFAULT_USER_ID)]
        user: String,
        #[arg(long)]
        json: String,
    },
    /// Print today's day key in the reset zone.
    DayKey,
    /// Print a default template.
    Template {
        #[arg(value_enum)]
        category: CategoryArg,
    },
    /// Print ping and version.
    Ping,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Body,
    Skin,
    Mind,
    All,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_console_logging(&cli.log_level) {
        eprintln!("error: {err}");
        return ExitCode::from(2);
    }

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    match cli.command {
        Command::Get { user, at_day } => {
            let now = match at_day {
                Some(day) => noon_of(&day)?,
                None => Utc::now(),
            };
            let conn = open_db(resolve_db_path(cli.db)?).map_err(|err| err.to_string())?;
            let repo = SqliteStateRepository::try_new(&conn).map_err(|err| err.to_string())?;
            let state = StateService::new(repo)
                .fetch_at(&user, now)
                .map_err(|err| err.to_string())?;
            to_pretty(&state)
        }
        Command::Put { user, json } => {
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|err| format!("--json is not valid JSON: {err}"))?;
            let patch = UserStatePatch::from_value(value);
            let conn = open_db(resolve_db_path(cli.db)?).map_err(|err| err.to_string())?;
            let repo = SqliteStateRepository::try_new(&conn).map_err(|err| err.to_string())?;
            StateService::new(repo)
                .update(&user, patch)
                .map_err(|err| err.to_string())?;
            Ok(r#"{"ok":true}"#.to_string())
        }
        Command::DayKey => Ok(DayKey::today().to_string()),
        Command::Template { category } => match category {
            CategoryArg::Body => to_pretty(&defaults_for(TemplateCategory::BodyTasks)),
            CategoryArg::Skin => to_pretty(&defaults_for(TemplateCategory::SkinTasks)),
            CategoryArg::Mind => to_pretty(&defaults_for(TemplateCategory::MindSubjects)),
            CategoryArg::All => {
                let all: serde_json::Map<String, serde_json::Value> = TemplateCategory::ALL
                    .iter()
                    .map(|category| {
                        serde_json::to_value(defaults_for(*category))
                            .map(|value| (category.field_name().to_string(), value))
                    })
                    .collect::<Result<_, _>>()
                    .map_err(|err| err.to_string())?;
                to_pretty(&all)
            }
        },
        Command::Ping => Ok(format!("ping={} version={}", ping(), core_version())),
    }
}

fn resolve_db_path(flag: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(path) = flag {
        return Ok(path);
    }
    match std::env::var(DB_PATH_ENV) {
        Ok(raw) if !raw.trim().is_empty() => Ok(PathBuf::from(raw.trim())),
        _ => Err(format!("pass --db or set {DB_PATH_ENV}")),
    }
}

/// Midday in the reset zone of `day`, as a UTC instant.
fn noon_of(day: &str) -> Result<chrono::DateTime<Utc>, String> {
    let key = DayKey::parse(day).map_err(|err| err.to_string())?;
    let date = chrono::NaiveDate::parse_from_str(key.as_str(), "%Y-%m-%d")
        .map_err(|err| err.to_string())?;
    // 06:30 UTC is 12:00 at UTC+05:30.
    let utc_time = NaiveTime::from_hms_opt(6, 30, 0).ok_or("invalid time of day")?;
    Ok(Utc.from_utc_datetime(&date.and_time(utc_time)))
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}
