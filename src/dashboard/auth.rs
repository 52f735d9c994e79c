//! Dashboard access control: HTTP Basic authentication behind a
//! token-bucket request limiter.
//!
//! Credentials are never compared as plain strings.  At boot the guard
//! draws a random key and keeps only `HMAC-SHA256(key, username)` and
//! `HMAC-SHA256(key, password)`.  Each request's presented values are
//! checked with `hmac_sha256::HMAC::verify`, which compares tags in
//! constant time, and both checks always run so a wrong username and a
//! wrong password take the same time.

use burster::Limiter;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use core::time::Duration;
use log::{debug, warn};

use crate::config::Credentials;

/// Value of the `WWW-Authenticate` header on a 401.
pub const WWW_AUTHENTICATE: &str = "Basic realm=\"CO2 Fan Controller\"";

/// Sustained requests per second across all clients.
pub const RATE_LIMIT_PER_SEC: u64 = 10;
/// Requests that may arrive back-to-back before the limiter engages.
pub const RATE_LIMIT_BURST: u64 = 10;

/// Result of checking one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    /// Missing, malformed or wrong credentials: answer 401.
    Denied,
    /// Limiter exhausted: answer 429 without looking at credentials.
    RateLimited,
}

/// Username and password as presented by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedCredentials {
    pub username: String,
    pub password: String,
}

/// Parse an `Authorization` header value of the form `Basic <base64>`.
///
/// The scheme is case-insensitive.  The decoded text must be UTF-8 and
/// contain a `:`; the password is everything after the first one.
pub fn parse_basic_header(value: &str) -> Option<PresentedCredentials> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }
    let decoded = STANDARD.decode(token.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (username, password) = text.split_once(':')?;
    Some(PresentedCredentials {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

/// Shared by every HTTP handler (behind a mutex).
pub struct BasicAuthGuard {
    key: [u8; 32],
    username_tag: [u8; 32],
    password_tag: [u8; 32],
    rate_limiter: burster::TokenBucket<fn() -> Duration>,
}

impl BasicAuthGuard {
    pub fn new(credentials: &Credentials) -> Self {
        let key = fill_random_key();
        Self {
            key,
            username_tag: hmac_sha256::HMAC::mac(credentials.username(), key),
            password_tag: hmac_sha256::HMAC::mac(credentials.password(), key),
            rate_limiter: burster::TokenBucket::new_with_time_provider(
                RATE_LIMIT_PER_SEC,
                RATE_LIMIT_BURST,
                platform_now as fn() -> Duration,
            ),
        }
    }

    /// Decide on one request given its `Authorization` header, if any.
    /// Every call consumes a limiter token, including granted ones.
    pub fn check(&mut self, authorization: Option<&str>) -> AuthOutcome {
        if self.rate_limiter.try_consume(1).is_err() {
            warn!("Dashboard: request rate limit exceeded");
            return AuthOutcome::RateLimited;
        }

        let Some(presented) = authorization.and_then(parse_basic_header) else {
            debug!("Dashboard: missing or malformed Authorization header");
            return AuthOutcome::Denied;
        };

        if self.verify(&presented) {
            AuthOutcome::Granted
        } else {
            warn!("Dashboard: rejected login for user {:?}", presented.username);
            AuthOutcome::Denied
        }
    }

    fn verify(&self, presented: &PresentedCredentials) -> bool {
        let user_ok =
            hmac_sha256::HMAC::verify(presented.username.as_bytes(), self.key, &self.username_tag);
        let pass_ok =
            hmac_sha256::HMAC::verify(presented.password.as_bytes(), self.key, &self.password_tag);
        // Non-short-circuit: both tags are always checked.
        user_ok & pass_ok
    }
}

// ── Platform-specific key generation ─────────────────────────

/// ESP-IDF: hardware RNG via `esp_fill_random`.
#[cfg(target_os = "espidf")]
fn fill_random_key() -> [u8; 32] {
    let mut buf = [0u8; 32];
    // SAFETY: esp_fill_random writes `len` bytes into the provided buffer,
    // which is valid and exclusively owned.
    unsafe {
        esp_idf_sys::esp_fill_random(buf.as_mut_ptr().cast(), buf.len());
    }
    buf
}

/// Simulation stub: `RandomState` gives non-cryptographic entropy.
#[cfg(not(target_os = "espidf"))]
fn fill_random_key() -> [u8; 32] {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut buf = [0u8; 32];
    for chunk in buf.chunks_mut(8) {
        let val = RandomState::new().build_hasher().finish().to_le_bytes();
        let len = chunk.len().min(val.len());
        chunk[..len].copy_from_slice(&val[..len]);
    }
    buf
}

// ── Platform time for rate limiter ───────────────────────────

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    let us = unsafe { esp_idf_sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
