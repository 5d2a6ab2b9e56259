//! Replay window enforcement.

/// Maximum allowed skew, in seconds, between a request timestamp and
/// server time. Applies to both past and future timestamps.
pub const REPLAY_WINDOW_SECS: u64 = 300;

/// Parses an `x-vvtv-ts` header value.
///
/// Returns `None` unless the value is a finite number. Fractional seconds
/// are accepted; the signature still covers the raw string.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|ts| ts.is_finite())
}

/// Bounded-age check on claimed request timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayGuard {
    window_secs: u64,
}

impl ReplayGuard {
    /// Creates a guard with the fixed [`REPLAY_WINDOW_SECS`] window.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window_secs: REPLAY_WINDOW_SECS,
        }
    }

    /// Returns the window size in seconds.
    #[must_use]
    pub const fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Checks a raw header value against `now` (unix seconds).
    ///
    /// Absent or non-numeric timestamps are never fresh.
    #[must_use]
    pub fn is_fresh(&self, timestamp: Option<&str>, now: u64) -> bool {
        timestamp
            .and_then(parse_timestamp)
            .is_some_and(|ts| self.is_fresh_at(ts, now))
    }

    /// Checks an already parsed timestamp. The boundary is inclusive.
    #[must_use]
    pub fn is_fresh_at(&self, timestamp: f64, now: u64) -> bool {
        (now as f64 - timestamp).abs() <= self.window_secs as f64
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self::new()
    }
}
