//! Process-wide shared connection handle.
//!
//! # Responsibility
//! - Open the state database at most once per process and hand out cheap
//!   clones of the handle to every request.
//!
//! # Invariants
//! - The global handle is initialized exactly once; later calls reuse it.
//! - Requesting a different path after initialization is rejected.
//! - Callers never tear the handle down; it lives for the process.

use super::{open_db, DbError, DbResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static SHARED_DB: OnceCell<SharedDb> = OnceCell::new();

/// Clonable handle to one serialized SQLite connection.
#[derive(Clone)]
pub struct SharedDb {
    path: Option<PathBuf>,
    conn: Arc<Mutex<Connection>>,
}

impl SharedDb {
    /// Wraps an already bootstrapped connection without touching the global.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            path: None,
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// File path backing this handle, `None` for wrapped connections.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Runs `f` while holding the connection lock.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> T) -> T {
        let guard = self.conn.lock();
        f(&guard)
    }
}

impl std::fmt::Debug for SharedDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDb").field("path", &self.path).finish()
    }
}

/// Returns the process-wide handle, opening `path` on first use.
///
/// # Errors
/// - Propagates open/migration failures from the first initialization.
/// - Returns `SharedPathConflict` when already open at another path.
pub fn shared_db(path: impl AsRef<Path>) -> DbResult<SharedDb> {
    let requested = path.as_ref().to_path_buf();
    let shared = SHARED_DB.get_or_try_init(|| -> DbResult<SharedDb> {
        let conn = open_db(&requested)?;
        Ok(SharedDb {
            path: Some(requested.clone()),
            conn: Arc::new(Mutex::new(conn)),
        })
    })?;

    match shared.path() {
        Some(active) if active != requested => Err(DbError::SharedPathConflict {
            active: active.display().to_string(),
            requested: requested.display().to_string(),
        }),
        _ => Ok(shared.clone()),
    }
}
