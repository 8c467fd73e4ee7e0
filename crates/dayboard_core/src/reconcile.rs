//! Daily reset reconciliation.
//!
//! # Responsibility
//! - Clear completion flags once per reset-zone day.
//! - Seed empty checklists from templates on the same code path.
//!
//! # Invariants
//! - Only `completed` flags and `day_key` are written; identities, labels,
//!   links, counters and pass-through fields are left as they are.
//! - Reconciling twice for the same day equals reconciling once.
//! - `day_key` never moves backwards.

use crate::day_key::DayKey;
use crate::model::user_state::{ChecklistItem, MindSubject, UserState};
use crate::templates::{default_body_tasks, default_mind_subjects, default_skin_tasks};

/// What a reconciliation pass did to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Flags were cleared and the watermark moved to today.
    Applied,
    /// The record was already reset today.
    AlreadyCurrent,
    /// The stored watermark is later than today; left untouched.
    AheadOfClock,
}

impl ResetOutcome {
    pub fn changed(self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::AlreadyCurrent => "current",
            Self::AheadOfClock => "ahead",
        }
    }
}

/// Returns `state` reconciled against `today`.
pub fn reconcile(mut state: UserState, today: &DayKey) -> UserState {
    apply_daily_reset(&mut state, today);
    state
}

/// Reconciles `state` in place and reports whether anything changed.
pub fn apply_daily_reset(state: &mut UserState, today: &DayKey) -> ResetOutcome {
    if state.day_key == today.as_str() {
        return ResetOutcome::AlreadyCurrent;
    }
    if let Ok(stored) = DayKey::parse(&state.day_key) {
        if &stored > today {
            return ResetOutcome::AheadOfClock;
        }
    }

    reset_checklist(&mut state.body_tasks, default_body_tasks);
    reset_checklist(&mut state.skin_tasks, default_skin_tasks);
    reset_subjects(&mut state.mind_subjects);
    state.day_key = today.as_str().to_string();

    ResetOutcome::Applied
}

fn reset_checklist(items: &mut Vec<ChecklistItem>, seed: fn() -> Vec<ChecklistItem>) {
    if items.is_empty() {
        *items = seed();
    }
    for item in items.iter_mut() {
        item.completed = false;
    }
}

fn reset_subjects(subjects: &mut Vec<MindSubject>) {
    if subjects.is_empty() {
        *subjects = default_mind_subjects();
    }
    for unit in subjects.iter_mut().flat_map(|subject| subject.units.iter_mut()) {
        unit.completed = false;
    }
}
