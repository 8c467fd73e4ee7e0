//! Logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize a rolling-file or stderr logger exactly once per process.
//! - Emit stable, metadata-only diagnostic events.
//!
//! # Invariants
//! - Logging init is idempotent for the same level and sink.
//! - Logging initialization must not panic.
//! - Re-initialization with a different level or sink is rejected.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const LOG_FILE_BASENAME: &str = "dayboard";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Rolling files under an absolute directory.
    Dir(PathBuf),
    Stderr,
}

impl Display for LogSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dir(dir) => write!(f, "{}", dir.display()),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug)]
pub enum LogInitError {
    UnknownLevel(String),
    RelativeDir(String),
    CreateDir { dir: PathBuf, source: std::io::Error },
    Backend(flexi_logger::FlexiLoggerError),
    AlreadyActive { active: String, requested: String },
}

impl Display for LogInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeDir(dir) => write!(f, "log directory must be absolute, got `{dir}`"),
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "logger failed to start: {err}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already runs as `{active}`; refusing to switch to `{requested}`"
            ),
        }
    }
}

impl Error for LogInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

struct ActiveLogger {
    level: LevelFilter,
    sink: LogSink,
    _handle: LoggerHandle,
}

/// Parses a level name; `warning` is accepted for `warn`, `off` is not.
pub fn parse_log_level(level: &str) -> Result<LevelFilter, LogInitError> {
    let trimmed = level.trim();
    let candidate = if trimmed.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        trimmed
    };
    match candidate.parse::<LevelFilter>() {
        Ok(LevelFilter::Off) | Err(_) => Err(LogInitError::UnknownLevel(trimmed.to_string())),
        Ok(filter) => Ok(filter),
    }
}

/// Initializes rolling-file logging under `log_dir`.
///
/// # Errors
/// - `UnknownLevel` / `RelativeDir` for bad arguments.
/// - `AlreadyActive` when logging runs with another level or sink.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LogInitError> {
    let level = parse_log_level(level)?;
    let dir = PathBuf::from(log_dir.trim());
    if !dir.is_absolute() {
        return Err(LogInitError::RelativeDir(log_dir.trim().to_string()));
    }
    init_with(level, LogSink::Dir(dir))
}

/// Initializes stderr logging, used when no log directory is configured.
pub fn init_console_logging(level: &str) -> Result<(), LogInitError> {
    init_with(parse_log_level(level)?, LogSink::Stderr)
}

fn init_with(level: LevelFilter, sink: LogSink) -> Result<(), LogInitError> {
    let active = ACTIVE.get_or_try_init(|| {
        let handle = start_logger(level, &sink)?;
        install_panic_hook_once();
        info!(
            "event=logging_init module=core status=ok level={level} sink={sink} os={} version={}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION")
        );
        Ok::<_, LogInitError>(ActiveLogger {
            level,
            sink: sink.clone(),
            _handle: handle,
        })
    })?;

    if active.level != level || active.sink != sink {
        return Err(LogInitError::AlreadyActive {
            active: format!("{}@{}", active.level, active.sink),
            requested: format!("{level}@{sink}"),
        });
    }
    Ok(())
}

fn start_logger(level: LevelFilter, sink: &LogSink) -> Result<LoggerHandle, LogInitError> {
    let logger = Logger::with(LogSpecification::builder().default(level).build());

    let logger = match sink {
        LogSink::Dir(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LogInitError::CreateDir {
                dir: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        LogSink::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
    };

    logger.start().map_err(LogInitError::Backend)
}

/// Active level and sink, or `None` before initialization.
pub fn logging_status() -> Option<(LevelFilter, LogSink)> {
    ACTIVE.get().map(|active| (active.level, active.sink.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .map_or_else(|| "non-string panic payload".to_string(), one_line);
        error!("event=panic_captured module=core status=error location={location} payload={payload}");
        previous_hook(info);
    }));
}

/// Flattens a panic message onto one bounded line.
fn one_line(text: &str) -> String {
    let mut flat: String = text
        .split(['\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if let Some((cut, _)) = flat.char_indices().nth(MAX_PANIC_PAYLOAD_CHARS) {
        flat.truncate(cut);
        flat.push_str("...");
    }
    flat
}
