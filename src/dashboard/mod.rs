//! Read-only web dashboard.
//!
//! ```text
//!  HTTP request ──▶ DashboardService::handle ──▶ BasicAuthGuard ──▶ route
//!                                                                    │
//!                                          StatusReader::latest() ◀──┘
//! ```
//!
//! [`DashboardService`] is transport-agnostic: it maps a path and an
//! optional `Authorization` header to an [`HttpResponse`].  The ESP-IDF
//! server adapter only copies requests in and responses out, so every
//! routing and auth decision is testable on the host.
//!
//! No route mutates controller state.

pub mod auth;
pub mod render;

use std::sync::{Mutex, PoisonError};

use log::error;

use crate::config::DeviceConfig;
use crate::control::Thresholds;
use crate::status::StatusReader;

use auth::{AuthOutcome, BasicAuthGuard, WWW_AUTHENTICATE};
use render::StatusPayload;

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Paths the HTTP adapter registers.
pub const ROUTES: [&str; 2] = ["/", "/api/status"];

/// A complete response, ready for any HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    /// Set on 401 only.
    pub www_authenticate: Option<&'static str>,
    pub body: String,
}

impl HttpResponse {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type,
            www_authenticate: None,
            body,
        }
    }

    fn text(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            content_type: CONTENT_TYPE_TEXT,
            www_authenticate: None,
            body: reason.to_owned(),
        }
    }

    /// Header pairs in the shape `esp_idf_svc` response builders take.
    pub fn headers(&self) -> heapless::Vec<(&'static str, &'static str), 3> {
        let mut headers = heapless::Vec::new();
        let _ = headers.push(("Content-Type", self.content_type));
        let _ = headers.push(("Cache-Control", "no-store"));
        if let Some(challenge) = self.www_authenticate {
            let _ = headers.push(("WWW-Authenticate", challenge));
        }
        headers
    }
}

/// Renders the latest status for authenticated clients.
pub struct DashboardService {
    reader: StatusReader,
    thresholds: Thresholds,
    interval_ms: u64,
    guard: Mutex<BasicAuthGuard>,
}

impl DashboardService {
    pub fn new(config: &DeviceConfig, reader: StatusReader) -> Self {
        Self {
            reader,
            thresholds: config.thresholds(),
            interval_ms: config.measurement_interval_ms(),
            guard: Mutex::new(BasicAuthGuard::new(config.credentials())),
        }
    }

    /// Answer one `GET`.  `path` may carry a query string; it is ignored.
    pub fn handle(&self, path: &str, authorization: Option<&str>) -> HttpResponse {
        let outcome = self
            .guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .check(authorization);

        match outcome {
            AuthOutcome::Granted => {}
            AuthOutcome::Denied => {
                return HttpResponse {
                    www_authenticate: Some(WWW_AUTHENTICATE),
                    ..HttpResponse::text(401, "Unauthorized")
                };
            }
            AuthOutcome::RateLimited => return HttpResponse::text(429, "Too Many Requests"),
        }

        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let payload = StatusPayload::new(&self.reader.latest(), self.thresholds, self.interval_ms);

        match path {
            "/" => HttpResponse::ok(CONTENT_TYPE_HTML, render::render_html(&payload)),
            "/api/status" => match render::render_json(&payload) {
                Ok(body) => HttpResponse::ok(CONTENT_TYPE_JSON, body),
                Err(e) => {
                    error!("Dashboard: status serialisation failed: {e}");
                    HttpResponse::text(500, "Internal Server Error")
                }
            },
            _ => HttpResponse::text(404, "Not Found"),
        }
    }
}
