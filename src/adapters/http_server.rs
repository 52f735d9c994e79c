//! ESP-IDF HTTP server adapter for the dashboard.
//!
//! Only copies bytes: every routing, auth and rendering decision is made
//! by [`DashboardService::handle`], which is host-testable.  Only `GET`
//! handlers are registered; any other method gets the server's own 405.

use std::sync::Arc;

use esp_idf_svc::http::Method;
use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpServer};
use esp_idf_svc::io::Write;
use log::{error, info};

use crate::dashboard::{DashboardService, ROUTES};
use crate::error::NetworkError;

fn register(
    server: &mut EspHttpServer<'static>,
    path: &'static str,
    service: Arc<DashboardService>,
) -> anyhow::Result<()> {
    server.fn_handler::<anyhow::Error, _>(path, Method::Get, move |req| {
        let response = service.handle(req.uri(), req.header("Authorization"));
        req.into_response(response.status, Some(response.reason), &response.headers())?
            .write_all(response.body.as_bytes())?;
        Ok(())
    })?;
    Ok(())
}

/// Start the server and register the dashboard routes.  The returned
/// server must be kept alive; dropping it stops serving.
pub fn start_dashboard_server(
    service: Arc<DashboardService>,
    port: u16,
) -> Result<EspHttpServer<'static>, NetworkError> {
    let conf = HttpConfiguration {
        http_port: port,
        stack_size: 10 * 1024,
        ..Default::default()
    };

    let mut server = EspHttpServer::new(&conf).map_err(|e| {
        error!("HTTP: server start failed on port {port}: {e}");
        NetworkError::HttpServerFailed
    })?;

    for path in ROUTES {
        register(&mut server, path, Arc::clone(&service)).map_err(|e| {
            error!("HTTP: registering {path} failed: {e:#}");
            NetworkError::HttpServerFailed
        })?;
    }

    info!("HTTP: dashboard listening on port {port}");
    Ok(server)
}
