//! HTTP use-case API over the shared state service.
//!
//! # Responsibility
//! - Map `GET`/`PUT /api/state` onto fetch/update of the state service.
//! - Reject verbs other than `GET`/`PUT`; preflight is answered by the CORS layer.
//!
//! # Invariants
//! - Every storage call runs on the blocking pool, never on the async runtime.
//! - A missing or blank `userId` addresses the default user.

use crate::access_log::access_log_mw;
use crate::cors::{preflight_status_mw, CorsPolicy};
use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use dayboard_core::db::SharedDb;
use dayboard_core::{
    core_version, RepoResult, SqliteStateRepository, StateService, UserState, UserStatePatch,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const STATE_PATH: &str = "/api/state";
pub const HEALTH_PATH: &str = "/health";

/// Source of "now"; swapped out in tests to pin the calendar day.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    db: SharedDb,
    clock: Clock,
}

impl AppState {
    pub fn new(db: SharedDb) -> Self {
        Self {
            db,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StateQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

impl StateQuery {
    fn user_id(self) -> String {
        self.user_id.unwrap_or_default()
    }
}

/// Builds the full router with CORS and access logging attached.
pub fn build_router(state: AppState, cors: CorsPolicy) -> Router {
    Router::new()
        .route(
            STATE_PATH,
            get(get_state)
                .put(put_state)
                .fallback(method_not_allowed),
        )
        .route(HEALTH_PATH, get(health))
        .with_state(state)
        .layer(cors.layer())
        .layer(middleware::from_fn(preflight_status_mw))
        .layer(middleware::from_fn(access_log_mw))
}

async fn get_state(
    State(app): State<AppState>,
    Query(query): Query<StateQuery>,
) -> Result<Json<UserState>, ApiError> {
    let user_id = query.user_id();
    let now = app.now();
    let state = with_state_service(&app.db, move |service| service.fetch_at(&user_id, now)).await?;
    Ok(Json(state))
}

async fn put_state(
    State(app): State<AppState>,
    Query(query): Query<StateQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let patch = parse_patch(&body)?;
    let user_id = query.user_id();
    let now = app.now();
    with_state_service(&app.db, move |service| {
        service.update_at(&user_id, patch, now).map(|_| ())
    })
    .await?;
    Ok(Json(json!({ "ok": true })))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": core_version() }))
}

/// An empty body is an empty patch. Only text that is not JSON is rejected;
/// field types are coerced by the patch decoder.
fn parse_patch(body: &[u8]) -> Result<UserStatePatch, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UserStatePatch::default());
    }
    let value: Value = serde_json::from_slice(body).map_err(ApiError::MalformedBody)?;
    Ok(UserStatePatch::from_value(value))
}

async fn with_state_service<T: Send + 'static>(
    db: &SharedDb,
    f: impl FnOnce(&StateService<SqliteStateRepository<'_>>) -> RepoResult<T> + Send + 'static,
) -> Result<T, ApiError> {
    let db = db.clone();
    let joined = tokio::task::spawn_blocking(move || {
        db.with_conn(|conn: &Connection| {
            let repo = SqliteStateRepository::try_new(conn)?;
            f(&StateService::new(repo))
        })
    })
    .await;

    match joined {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => Err(ApiError::Worker(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_patch;
    use crate::error::ApiError;

    #[test]
    fn blank_body_is_an_empty_patch() {
        assert!(parse_patch(b"").unwrap().is_empty());
        assert!(parse_patch(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = parse_patch(b"skinSessions=5").unwrap_err();
        assert!(matches!(err, ApiError::MalformedBody(_)));
    }

    #[test]
    fn mistyped_fields_are_coerced_not_rejected() {
        let patch = parse_patch(br#"{"skinSessions": "5", "plannerTasks": {}}"#).unwrap();
        assert_eq!(patch.skin_sessions, Some(5));
        assert_eq!(patch.planner_tasks, Some(serde_json::json!({})));
    }

    #[test]
    fn unknown_fields_are_accepted() {
        let patch = parse_patch(br#"{"skinSessions": 2, "theme": "dark"}"#).unwrap();
        assert_eq!(patch.skin_sessions, Some(2));
    }
}
