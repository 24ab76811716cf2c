//! Configuration for the timing-dependence check.

use crate::constants::{
    DEFAULT_CORRELATION_ERROR_RANGE, DEFAULT_HIGH_SLEEP_TIME_SECONDS, DEFAULT_REQUEST_LIMIT,
    DEFAULT_SLOPE_ERROR_RANGE,
};

/// Settings for one sampling session.
///
/// The defaults mirror what production scan rules run with: a four-request
/// budget, a 5-second high delay, and 0.15/0.30 verdict tolerances. The
/// low delay (1 second) and the wide early-exit pruning window are protocol
/// constants, not configuration; see [`crate::constants`] exports on the
/// crate root.
///
/// A config is consumed by [`crate::TimingProbe`], which validates the
/// request budget before sending anything.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Hard ceiling on probe requests for one session.
    ///
    /// Must be at least 2 (one high/low pair); an odd budget rounds up to
    /// whole pairs. Validated by [`crate::TimingProbe::check`] before any
    /// I/O happens.
    pub requests_limit: u32,

    /// The "signal" delay to request from the target, in seconds.
    ///
    /// Alternated against the fixed 1-second low delay. Spreading the two
    /// requested delays apart is what keeps ordinary latency jitter from
    /// looking like a correlated response.
    pub high_sleep_time: f64,

    /// Correlation tolerance window of the final verdict.
    ///
    /// The fit passes when its squared correlation exceeds
    /// `1 - correlation_error_range`.
    pub correlation_error_range: f64,

    /// Slope tolerance window of the final verdict.
    ///
    /// The fit passes when its slope is within this distance of 1.
    pub slope_error_range: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            requests_limit: DEFAULT_REQUEST_LIMIT,
            high_sleep_time: DEFAULT_HIGH_SLEEP_TIME_SECONDS,
            correlation_error_range: DEFAULT_CORRELATION_ERROR_RANGE,
            slope_error_range: DEFAULT_SLOPE_ERROR_RANGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_production_scan_settings() {
        let config = ProbeConfig::default();
        assert_eq!(config.requests_limit, 4);
        assert!((config.high_sleep_time - 5.0).abs() < 1e-12);
        assert!((config.correlation_error_range - 0.15).abs() < 1e-12);
        assert!((config.slope_error_range - 0.30).abs() < 1e-12);
    }
}
