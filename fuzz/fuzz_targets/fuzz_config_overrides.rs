//! Fuzz target: `SystemConfig::with_overrides` + `validate`
//!
//! Splits the input into `KEY=value` lines and applies them as overrides.
//! Whatever the text, validation must either produce a config whose
//! thresholds are ordered or return an error; it must never panic.
//!
//! cargo fuzz run fuzz_config_overrides

#![no_main]

use co2fan::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let pairs: Vec<(&str, &str)> = text.lines().filter_map(|l| l.split_once('=')).collect();
    let lookup = |key: &str| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    };

    let Ok(raw) = SystemConfig::default().with_overrides(lookup) else {
        return;
    };
    if let Ok(config) = raw.validate() {
        let t = config.thresholds();
        assert!(t.off_ppm() < t.on_ppm());
        assert!(config.measurement_interval_ms() > 0);
        assert!(config.http_port() > 0);
    }
});
