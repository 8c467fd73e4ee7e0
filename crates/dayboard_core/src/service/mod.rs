//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and the daily reset into use-case APIs.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod state_service;
