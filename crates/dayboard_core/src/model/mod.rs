//! Domain model for the per-user daily state document.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep JSON wire naming (camelCase) in one place.
//!
//! # Invariants
//! - Every document is keyed by a caller-supplied `userId`.
//! - Only `completed` flags are owned by the daily reset.

pub mod user_state;
