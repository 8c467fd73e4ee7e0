//! Core domain logic for Dayboard.
//! This crate is the single source of truth for the daily reset rules.

pub mod day_key;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod templates;

pub use day_key::{DayKey, DayKeyError};
pub use logging::{
    default_log_level, init_console_logging, init_logging, logging_status, parse_log_level,
    LogInitError, LogSink,
};
pub use model::user_state::{
    ChecklistItem, MindSubject, MindUnit, UserState, UserStatePatch, DEFAULT_USER_ID,
};
pub use reconcile::{apply_daily_reset, reconcile, ResetOutcome};
pub use repo::state_repo::{RepoError, RepoResult, SqliteStateRepository, StateRepository};
pub use service::state_service::{normalize_user_id, StateService};
pub use templates::{defaults_for, Template, TemplateCategory};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
