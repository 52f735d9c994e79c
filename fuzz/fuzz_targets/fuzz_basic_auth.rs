//! Fuzz target: `parse_basic_header` and `BasicAuthGuard::check`
//!
//! Feeds arbitrary header values through the dashboard's auth path and
//! asserts that it never panics and only grants access to the exact
//! configured credentials.
//!
//! cargo fuzz run fuzz_basic_auth

#![no_main]

use co2fan::config::Credentials;
use co2fan::dashboard::auth::{AuthOutcome, BasicAuthGuard, parse_basic_header};
use libfuzzer_sys::fuzz_target;

const USER: &str = "admin";
const PASS: &str = "fuzz-pass";

fuzz_target!(|data: &[u8]| {
    let Ok(header) = core::str::from_utf8(data) else {
        return;
    };

    let parsed = parse_basic_header(header);
    if let Some(creds) = &parsed {
        // The password never swallows the separator of the username.
        assert!(!creds.username.contains(':'));
    }

    let Ok(credentials) = Credentials::new(USER, PASS) else {
        return;
    };
    let mut guard = BasicAuthGuard::new(&credentials);
    match guard.check(Some(header)) {
        AuthOutcome::Granted => {
            let creds = parsed.expect("granted without parseable credentials");
            assert_eq!(creds.username, USER);
            assert_eq!(creds.password, PASS);
        }
        AuthOutcome::Denied => {}
        AuthOutcome::RateLimited => panic!("fresh guard must have a full bucket"),
    }
});
