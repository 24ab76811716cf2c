//! Protocol constants for the timing-dependence check.
//!
//! The pruning window is deliberately wide: it only has to catch targets
//! that are obviously uncorrelated, so the sampler can stop wasting probes
//! on them. The tight, caller-supplied tolerances are applied once, on the
//! final verdict.

/// Requested delay of the low probe, in seconds.
///
/// The sampler alternates the caller's high sleep time against this fixed
/// small value. Spreading the two requested delays far apart keeps ordinary
/// latency jitter from masquerading as a correlated response.
pub const LOW_SLEEP_TIME_SECONDS: f64 = 1.0;

/// Slope an actual injected sleep produces.
///
/// A server that executes the injected delay adds it to the response time
/// one-for-one, so the fitted line is expected to have slope 1. This also
/// rejects inverse relationships that the direction-insensitive correlation
/// would otherwise let through.
pub const EXPECTED_SLOPE: f64 = 1.0;

/// Correlation tolerance of the early-exit pruning check.
pub const PRUNE_CORRELATION_ERROR_RANGE: f64 = 0.3;

/// Slope tolerance of the early-exit pruning check.
pub const PRUNE_SLOPE_ERROR_RANGE: f64 = 0.5;

/// Smallest request budget the sampler accepts.
///
/// One high/low pair is the minimum needed for a two-point fit.
pub const MINIMUM_REQUEST_LIMIT: u32 = 2;

/// Default request budget, matching what production scan rules use.
pub const DEFAULT_REQUEST_LIMIT: u32 = 4;

/// Default high sleep time in seconds.
pub const DEFAULT_HIGH_SLEEP_TIME_SECONDS: f64 = 5.0;

/// Default correlation tolerance for the final verdict.
pub const DEFAULT_CORRELATION_ERROR_RANGE: f64 = 0.15;

/// Default slope tolerance for the final verdict.
pub const DEFAULT_SLOPE_ERROR_RANGE: f64 = 0.30;
