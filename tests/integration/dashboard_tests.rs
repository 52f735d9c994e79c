//! Integration tests for the dashboard: auth, routing and rendering of
//! snapshots published by a running scheduler.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::mock_hw::{LogSink, MockHardware};

use co2fan::config::{DeviceConfig, SystemConfig};
use co2fan::control::HysteresisController;
use co2fan::dashboard::auth::{RATE_LIMIT_BURST, WWW_AUTHENTICATE};
use co2fan::dashboard::{CONTENT_TYPE_HTML, CONTENT_TYPE_JSON, DashboardService};
use co2fan::scheduler::MeasurementScheduler;
use co2fan::status::{StatusPublisher, status_store};

fn config() -> DeviceConfig {
    SystemConfig {
        web_username: "ops".into(),
        web_password: "s3cret".into(),
        ..SystemConfig::default()
    }
    .validate()
    .unwrap()
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

fn setup() -> (DashboardService, StatusPublisher) {
    let config = config();
    let (publisher, reader) = status_store();
    (DashboardService::new(&config, reader), publisher)
}

#[test]
fn missing_credentials_get_a_challenge() {
    let (svc, _p) = setup();
    let resp = svc.handle("/", None);
    assert_eq!(resp.status, 401);
    assert_eq!(resp.www_authenticate, Some(WWW_AUTHENTICATE));
    assert!(
        resp.headers()
            .iter()
            .any(|&(k, v)| k == "WWW-Authenticate" && v.contains("CO2 Fan Controller"))
    );
}

#[test]
fn wrong_password_is_unauthorized() {
    let (svc, _p) = setup();
    let resp = svc.handle("/api/status", Some(&basic("ops", "nope")));
    assert_eq!(resp.status, 401);
}

#[test]
fn boot_status_before_first_cycle() {
    let (svc, _p) = setup();
    let resp = svc.handle("/api/status", Some(&basic("ops", "s3cret")));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, CONTENT_TYPE_JSON);

    let v: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert!(v["co2_ppm"].is_null());
    assert_eq!(v["relay"], "OFF");
    assert_eq!(v["cycle"], 0);
}

#[test]
fn dashboard_reflects_scheduler_output() {
    let config = config();
    let (publisher, reader) = status_store();
    let svc = DashboardService::new(&config, reader);

    let mut sched = MeasurementScheduler::new(
        HysteresisController::new(config.thresholds()),
        publisher,
        config.measurement_interval_ms(),
    );
    let mut hw = MockHardware::with_ppm(&[1250]);
    let mut sink = LogSink::new();
    sched.poll(0, &mut hw, &mut sink);

    let auth = basic("ops", "s3cret");
    let json = svc.handle("/api/status", Some(&auth));
    let v: serde_json::Value = serde_json::from_str(&json.body).unwrap();
    assert_eq!(v["co2_ppm"], 1250);
    assert_eq!(v["relay"], "ON");
    assert_eq!(v["on_ppm"], 1000);
    assert_eq!(v["off_ppm"], 800);
    assert_eq!(v["interval_ms"], 30_000);

    let html = svc.handle("/", Some(&auth));
    assert_eq!(html.status, 200);
    assert_eq!(html.content_type, CONTENT_TYPE_HTML);
    assert!(html.body.contains("1250 ppm"));
}

#[test]
fn query_string_is_ignored_and_unknown_paths_404() {
    let (svc, _p) = setup();
    let auth = basic("ops", "s3cret");
    assert_eq!(svc.handle("/api/status?t=123", Some(&auth)).status, 200);
    assert_eq!(svc.handle("/api/relay", Some(&auth)).status, 404);
}

#[test]
fn request_flood_is_rate_limited() {
    let (svc, _p) = setup();
    let auth = basic("ops", "s3cret");
    for _ in 0..RATE_LIMIT_BURST {
        assert_eq!(svc.handle("/api/status", Some(&auth)).status, 200);
    }
    let resp = svc.handle("/api/status", Some(&auth));
    assert_eq!(resp.status, 429);
    assert!(resp.www_authenticate.is_none());
}
