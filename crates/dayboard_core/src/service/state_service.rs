//! User state use-case service.
//!
//! # Responsibility
//! - Provide the fetch and update entry points shared by every caller.
//! - Run the daily reset before any state leaves or enters storage.
//!
//! # Invariants
//! - Fetch persists only when the reset actually changed the record.
//! - Update always reconciles first, then overlays caller fields, then saves.
//! - Service layer remains storage-agnostic.

use crate::day_key::DayKey;
use crate::model::user_state::{UserState, UserStatePatch, DEFAULT_USER_ID};
use crate::reconcile::apply_daily_reset;
use crate::repo::state_repo::{RepoResult, StateRepository};
use chrono::{DateTime, Utc};
use log::info;

/// Use-case service wrapper for per-user state.
pub struct StateService<R: StateRepository> {
    repo: R,
}

impl<R: StateRepository> StateService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns today's reconciled state for `user_id`.
    pub fn fetch(&self, user_id: &str) -> RepoResult<UserState> {
        self.fetch_at(user_id, Utc::now())
    }

    /// Returns the state reconciled for the day `now` falls on.
    ///
    /// # Contract
    /// - Creates a seeded record on first access.
    /// - Writes back only when the reset was applied.
    pub fn fetch_at(&self, user_id: &str, now: DateTime<Utc>) -> RepoResult<UserState> {
        let user_id = normalize_user_id(user_id);
        let today = DayKey::from_instant(now);
        let mut state = self.repo.get_or_create(user_id, &today)?;

        let outcome = apply_daily_reset(&mut state, &today);
        if outcome.changed() {
            self.repo.save_state(&state)?;
        }
        info!(
            "event=state_fetch module=service status=ok user_id={} day_key={} reset={}",
            user_id,
            today,
            outcome.as_str()
        );
        Ok(state)
    }

    /// Applies `patch` on top of today's reconciled state.
    pub fn update(&self, user_id: &str, patch: UserStatePatch) -> RepoResult<UserState> {
        self.update_at(user_id, patch, Utc::now())
    }

    /// Applies `patch` on top of the state reconciled for `now`'s day.
    ///
    /// # Contract
    /// - Fields missing from `patch` keep their reconciled value.
    /// - The merged record replaces the stored one (last write wins).
    pub fn update_at(
        &self,
        user_id: &str,
        patch: UserStatePatch,
        now: DateTime<Utc>,
    ) -> RepoResult<UserState> {
        let user_id = normalize_user_id(user_id);
        let today = DayKey::from_instant(now);
        let mut state = self.repo.get_or_create(user_id, &today)?;

        let outcome = apply_daily_reset(&mut state, &today);
        let empty_patch = patch.is_empty();
        patch.apply_to(&mut state);
        self.repo.save_state(&state)?;
        info!(
            "event=state_update module=service status=ok user_id={} day_key={} reset={} empty_patch={}",
            user_id,
            today,
            outcome.as_str(),
            empty_patch
        );
        Ok(state)
    }
}

/// Maps a missing or blank caller id to the default user.
pub fn normalize_user_id(user_id: &str) -> &str {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        DEFAULT_USER_ID
    } else {
        trimmed
    }
}
