//! Dashboard rendering: a JSON payload for scripts and a small
//! self-refreshing HTML page for browsers.  Everything rendered is
//! numeric or an enum, so no user-controlled text reaches the page.

use core::fmt::Write as _;

use serde::Serialize;

use crate::control::{RelayState, Thresholds};
use crate::status::StatusSnapshot;

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub co2_ppm: Option<u16>,
    pub relay: RelayState,
    pub sensor_fault: bool,
    pub actuator_fault: bool,
    pub uptime_ms: u64,
    pub cycle: u64,
    pub on_ppm: u16,
    pub off_ppm: u16,
    pub interval_ms: u64,
}

impl StatusPayload {
    pub fn new(snapshot: &StatusSnapshot, thresholds: Thresholds, interval_ms: u64) -> Self {
        Self {
            co2_ppm: snapshot.last_ppm,
            relay: snapshot.relay,
            sensor_fault: snapshot.sensor_fault,
            actuator_fault: snapshot.actuator_fault,
            uptime_ms: snapshot.uptime_ms,
            cycle: snapshot.cycle,
            on_ppm: thresholds.on_ppm(),
            off_ppm: thresholds.off_ppm(),
            interval_ms,
        }
    }
}

pub fn render_json(payload: &StatusPayload) -> Result<String, serde_json::Error> {
    serde_json::to_string(payload)
}

/// `1d 02:03:04` style uptime.
pub fn format_uptime(uptime_ms: u64) -> String {
    let secs = uptime_ms / 1000;
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (h, m, s) = (rem / 3600, rem % 3600 / 60, rem % 60);
    if days > 0 {
        format!("{days}d {h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}")
    }
}

/// Refresh roughly once per measurement, but not faster than every 5 s
/// or slower than once a minute.
fn refresh_secs(interval_ms: u64) -> u64 {
    (interval_ms / 1000).clamp(5, 60)
}

pub fn render_html(payload: &StatusPayload) -> String {
    let co2 = payload
        .co2_ppm
        .map_or_else(|| "--".to_owned(), |ppm| ppm.to_string());
    let relay_class = match payload.relay {
        RelayState::On => "on",
        RelayState::Off => "off",
    };

    let mut faults = String::new();
    if payload.sensor_fault {
        faults.push_str("<p class=\"fault\">Sensor read failed; fan held in last state.</p>");
    }
    if payload.actuator_fault {
        faults.push_str("<p class=\"fault\">Relay write failed; retrying next cycle.</p>");
    }

    let mut page = String::with_capacity(1536);
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="{refresh}">
<title>CO2 Fan Controller</title>
<style>
body{{font-family:sans-serif;max-width:28em;margin:2em auto;padding:0 1em}}
.ppm{{font-size:3em;margin:.2em 0}}
.on{{color:#0a0}}.off{{color:#666}}.fault{{color:#c00}}
td{{padding:.2em 1em .2em 0}}
</style>
</head>
<body>
<h1>CO2 Fan Controller</h1>
<div class="ppm">{co2} ppm</div>
<p>Fan: <strong class="{relay_class}">{relay}</strong></p>
{faults}<table>
<tr><td>Fan on above</td><td>{on} ppm</td></tr>
<tr><td>Fan off below</td><td>{off} ppm</td></tr>
<tr><td>Interval</td><td>{interval} s</td></tr>
<tr><td>Cycles</td><td>{cycle}</td></tr>
<tr><td>Uptime</td><td>{uptime}</td></tr>
</table>
</body>
</html>
"#,
        refresh = refresh_secs(payload.interval_ms),
        relay = payload.relay,
        on = payload.on_ppm,
        off = payload.off_ppm,
        interval = payload.interval_ms / 1000,
        cycle = payload.cycle,
        uptime = format_uptime(payload.uptime_ms),
    );
    page
}
