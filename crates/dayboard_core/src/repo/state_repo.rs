//! User state repository contracts and SQLite document implementation.
//!
//! # Responsibility
//! - Provide get-or-create and replace APIs over `user_states` documents.
//! - Keep SQL and JSON encoding details inside the persistence boundary.
//!
//! # Invariants
//! - At most one row per `user_id` (primary key; inserts never duplicate).
//! - The `day_key` column mirrors the document watermark on every write.
//! - Read paths reject undecodable documents instead of masking them.

use crate::day_key::DayKey;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::user_state::UserState;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for state persistence and decoding.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    Encode(serde_json::Error),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted state data: {message}"),
            Self::Encode(err) => write!(f, "failed to encode state document: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Repository interface for per-user state documents.
pub trait StateRepository {
    /// Loads the stored document, if any.
    fn get_state(&self, user_id: &str) -> RepoResult<Option<UserState>>;
    /// Loads the stored document or creates one seeded for `today`.
    fn get_or_create(&self, user_id: &str, today: &DayKey) -> RepoResult<UserState>;
    /// Replaces the stored document for `state.user_id`.
    fn save_state(&self, state: &UserState) -> RepoResult<()>;
}

/// SQLite-backed state repository.
pub struct SqliteStateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStateRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when `user_states` is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'user_states'
            );",
            [],
            |row| row.get(0),
        )?;
        if has_table == 0 {
            return Err(RepoError::MissingRequiredTable("user_states"));
        }

        Ok(Self { conn })
    }
}

impl StateRepository for SqliteStateRepository<'_> {
    fn get_state(&self, user_id: &str) -> RepoResult<Option<UserState>> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM user_states WHERE user_id = ?1;",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        document
            .map(|text| decode_document(user_id, &text))
            .transpose()
    }

    fn get_or_create(&self, user_id: &str, today: &DayKey) -> RepoResult<UserState> {
        if let Some(existing) = self.get_state(user_id)? {
            return Ok(existing);
        }

        let seeded = UserState::seeded(user_id, today);
        let document = serde_json::to_string(&seeded)?;
        // A concurrent creator may win the race; its row is kept and read back.
        let inserted = self.conn.execute(
            "INSERT INTO user_states (user_id, document, day_key)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO NOTHING;",
            params![user_id, document, seeded.day_key],
        )?;
        if inserted == 1 {
            info!(
                "event=state_create module=repo status=ok user_id={} day_key={}",
                user_id, seeded.day_key
            );
            return Ok(seeded);
        }

        self.get_state(user_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("state for `{user_id}` vanished after insert"))
        })
    }

    fn save_state(&self, state: &UserState) -> RepoResult<()> {
        let document = serde_json::to_string(state)?;
        self.conn.execute(
            "INSERT INTO user_states (user_id, document, day_key)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                document = excluded.document,
                day_key = excluded.day_key,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![state.user_id, document, state.day_key],
        )?;
        Ok(())
    }
}

fn decode_document(user_id: &str, text: &str) -> RepoResult<UserState> {
    let mut state: UserState = serde_json::from_str(text).map_err(|err| {
        RepoError::InvalidData(format!(
            "undecodable document in user_states.document for `{user_id}`: {err}"
        ))
    })?;
    // The key column is authoritative over whatever the document claims.
    state.user_id = user_id.to_string();
    Ok(state)
}
