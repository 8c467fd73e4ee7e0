//! Cross-origin policy.
//!
//! # Invariants
//! - Requests without `Origin` are never blocked here.
//! - An empty allow-list reflects any origin.
//! - Disallowed origins get no CORS headers; the browser enforces the block.
//! - Preflight answers are `204 No Content`.

use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use log::warn;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    /// Origins are compared in lowercase, which is how browsers serialize them.
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins: allowed_origins
                .into_iter()
                .map(|origin| origin.trim().to_ascii_lowercase())
                .filter(|origin| !origin.is_empty())
                .collect(),
        }
    }

    fn allows_any(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|origin| origin == "*")
    }

    /// Builds the `tower-http` layer enforcing this policy.
    pub fn layer(&self) -> CorsLayer {
        let allow_origin = if self.allows_any() {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::list(self.allowed_origins.iter().filter_map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|err| {
                        warn!(
                            "event=cors_config module=server status=skipped origin={origin} error={err}"
                        );
                    })
                    .ok()
            }))
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
    }
}

/// Rewrites the layer's preflight `200` into `204`.
///
/// Must sit outside the CORS layer, which answers `OPTIONS` without reaching
/// the router.
pub async fn preflight_status_mw(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;
    let mut response = next.run(req).await;
    if is_options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
