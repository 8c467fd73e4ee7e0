//! HTTP entry point for Dayboard.
//!
//! Thin transport over `dayboard_core`: routing, CORS, access logging and
//! error mapping. All reset rules live in the core crate.

mod access_log;
pub mod api;
pub mod config;
pub mod cors;
pub mod error;

pub use access_log::REQUEST_ID_HEADER;
pub use api::{build_router, AppState, Clock, HEALTH_PATH, STATE_PATH};
pub use config::{ConfigError, ServerConfig};
pub use cors::CorsPolicy;
pub use error::ApiError;
