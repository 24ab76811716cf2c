//! Adaptive sampling loop for the timing-dependence check.
//!
//! The sampler alternates a high requested delay against a fixed 1-second
//! low delay, feeding each (requested, observed) pair into one
//! [`OnlineRegression`]. After every probe it applies two cheap early
//! exits:
//!
//! - the observed time undercuts the requested delay, so the target is not
//!   executing the injected sleep at all;
//! - the fit has already left a deliberately wide tolerance window, so more
//!   probes cannot rescue the verdict.
//!
//! Either exit rejects the target immediately, which bounds the number of
//! requests sent against uncorrelated targets. Only when the full request
//! budget survives both checks is the caller's (tighter) tolerance applied
//! for the final verdict.
//!
//! Probes are sent strictly one at a time; the elapsed-time measurement is
//! meaningless with more than one request in flight.

use std::fmt;

use crate::config::ProbeConfig;
use crate::constants::{
    EXPECTED_SLOPE, LOW_SLEEP_TIME_SECONDS, MINIMUM_REQUEST_LIMIT,
    PRUNE_CORRELATION_ERROR_RANGE, PRUNE_SLOPE_ERROR_RANGE,
};
use crate::statistics::OnlineRegression;

/// Error type produced by a probe sender.
///
/// Transport failures are opaque to the sampler; it never retries them.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// One round trip against the target under test.
///
/// An implementation must send exactly one request embedding the requested
/// delay (the embedding mechanism, e.g. a `SLEEP(n)` payload, is entirely
/// the implementor's concern), block until the response completes, and
/// return the measured wall-clock duration of that round trip in seconds.
///
/// Implemented for any `FnMut(f64) -> Result<f64, TransportError>` closure.
pub trait ProbeSender {
    /// Send one probe requesting `requested_delay_seconds` of server-side
    /// delay and return the observed elapsed time in seconds.
    fn probe(&mut self, requested_delay_seconds: f64) -> Result<f64, TransportError>;
}

impl<F> ProbeSender for F
where
    F: FnMut(f64) -> Result<f64, TransportError>,
{
    fn probe(&mut self, requested_delay_seconds: f64) -> Result<f64, TransportError> {
        self(requested_delay_seconds)
    }
}

/// Errors surfaced by [`TimingProbe::check`].
#[derive(Debug)]
pub enum ProbeError {
    /// The configured request budget cannot fit a single probe pair.
    ///
    /// Raised before any request is sent.
    InvalidRequestLimit {
        /// The configured budget.
        limit: u32,
        /// Smallest accepted budget.
        minimum: u32,
    },

    /// The sender failed while probing the target.
    ///
    /// A transport failure invalidates the timing measurement and cannot be
    /// meaningfully retried mid-probe, so it is propagated as-is.
    Transport(TransportError),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::InvalidRequestLimit { limit, minimum } => {
                write!(
                    f,
                    "Request limit {} too small: need at least {} probes for a fit",
                    limit, minimum
                )
            }
            ProbeError::Transport(err) => write!(f, "Probe transport failed: {}", err),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::InvalidRequestLimit { .. } => None,
            ProbeError::Transport(err) => Some(err.as_ref()),
        }
    }
}

/// Timing-dependence check against one candidate injection point.
///
/// Renders a boolean verdict: does the target's response latency track the
/// requested delay closely enough to indicate that the parameter controls
/// server-side execution time?
///
/// # Example
///
/// ```
/// use latens::{TimingProbe, TransportError};
///
/// let mut sender = |delay: f64| -> Result<f64, TransportError> { Ok(delay + 0.02) };
///
/// let injectable = TimingProbe::new()
///     .requests_limit(4)
///     .high_sleep_time(10.0)
///     .correlation_error_range(0.2)
///     .slope_error_range(0.2)
///     .check(&mut sender)
///     .unwrap();
/// assert!(injectable);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimingProbe {
    config: ProbeConfig,
}

impl TimingProbe {
    /// Create a probe with the default configuration.
    pub fn new() -> Self {
        Self {
            config: ProbeConfig::default(),
        }
    }

    /// Create a probe from an existing configuration.
    pub fn with_config(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Set the hard ceiling on probe requests.
    pub fn requests_limit(mut self, limit: u32) -> Self {
        self.config.requests_limit = limit;
        self
    }

    /// Set the high requested delay, in seconds.
    ///
    /// # Panics
    ///
    /// Panics if `seconds` is not finite and positive.
    pub fn high_sleep_time(mut self, seconds: f64) -> Self {
        assert!(
            seconds.is_finite() && seconds > 0.0,
            "high_sleep_time must be finite and > 0"
        );
        self.config.high_sleep_time = seconds;
        self
    }

    /// Set the correlation tolerance of the final verdict.
    ///
    /// # Panics
    ///
    /// Panics if `range` is not finite and positive.
    pub fn correlation_error_range(mut self, range: f64) -> Self {
        assert!(
            range.is_finite() && range > 0.0,
            "correlation_error_range must be finite and > 0"
        );
        self.config.correlation_error_range = range;
        self
    }

    /// Set the slope tolerance of the final verdict.
    ///
    /// # Panics
    ///
    /// Panics if `range` is not finite and positive.
    pub fn slope_error_range(mut self, range: f64) -> Self {
        assert!(
            range.is_finite() && range > 0.0,
            "slope_error_range must be finite and > 0"
        );
        self.config.slope_error_range = range;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run the check against one candidate injection point.
    ///
    /// Sends up to `requests_limit` probes (one extra pair when the budget
    /// is odd), strictly one at a time, and returns whether the observed
    /// latency tracks the requested delay within the configured tolerances.
    ///
    /// Fails with [`ProbeError::InvalidRequestLimit`] before any request is
    /// sent when the budget cannot fit a probe pair, and with
    /// [`ProbeError::Transport`] when the sender fails; transport failures
    /// are never retried.
    pub fn check<S>(&self, sender: &mut S) -> Result<bool, ProbeError>
    where
        S: ProbeSender + ?Sized,
    {
        let config = &self.config;
        if config.requests_limit < MINIMUM_REQUEST_LIMIT {
            return Err(ProbeError::InvalidRequestLimit {
                limit: config.requests_limit,
                minimum: MINIMUM_REQUEST_LIMIT,
            });
        }

        let mut regression = OnlineRegression::new();
        let mut requests_left = config.requests_limit as i64;

        while requests_left > 0 {
            if !send_and_check(sender, config.high_sleep_time, &mut regression)? {
                return Ok(false);
            }
            if !send_and_check(sender, LOW_SLEEP_TIME_SECONDS, &mut regression)? {
                return Ok(false);
            }
            requests_left -= 2;
        }

        let verdict = regression.is_within_confidence(
            config.correlation_error_range,
            EXPECTED_SLOPE,
            config.slope_error_range,
        );
        tracing::debug!(
            "verdict={} after {} probes: slope={:.3} correlation={:.3}",
            verdict,
            regression.count(),
            regression.slope(),
            regression.correlation()
        );
        Ok(verdict)
    }
}

/// Send one probe, fold it into the fit, and apply the early-exit checks.
///
/// Returns `Ok(false)` when the target is already ruled out: either the
/// observed time undercuts the requested delay, or the fit has left the
/// wide pruning window and further probes cannot bring it back.
fn send_and_check<S>(
    sender: &mut S,
    requested_delay: f64,
    regression: &mut OnlineRegression,
) -> Result<bool, ProbeError>
where
    S: ProbeSender + ?Sized,
{
    let observed = sender
        .probe(requested_delay)
        .map_err(ProbeError::Transport)?;
    tracing::debug!(
        "probe requested={:.1}s observed={:.3}s",
        requested_delay,
        observed
    );

    if observed < requested_delay {
        // The target did not delay as requested; the injected sleep is not
        // being executed.
        tracing::debug!(
            "observed {:.3}s under requested {:.1}s, ruling target out",
            observed,
            requested_delay
        );
        return Ok(false);
    }

    regression.add_point(requested_delay, observed);
    let plausible = regression.is_within_confidence(
        PRUNE_CORRELATION_ERROR_RANGE,
        EXPECTED_SLOPE,
        PRUNE_SLOPE_ERROR_RANGE,
    );
    if !plausible {
        tracing::debug!(
            "fit left pruning window: slope={:.3} correlation={:.3}",
            regression.slope(),
            regression.correlation()
        );
    }
    Ok(plausible)
}

/// Check whether a target's response latency depends on a requested delay.
///
/// Convenience entry point over [`TimingProbe`] taking all parameters
/// positionally: the probe budget, the high requested delay in seconds, the
/// sender, and the correlation and slope tolerances of the final verdict.
pub fn check_timing_dependence<S>(
    requests_limit: u32,
    high_sleep_time_seconds: f64,
    sender: &mut S,
    correlation_error_range: f64,
    slope_error_range: f64,
) -> Result<bool, ProbeError>
where
    S: ProbeSender + ?Sized,
{
    TimingProbe::with_config(ProbeConfig {
        requests_limit,
        high_sleep_time: high_sleep_time_seconds,
        correlation_error_range,
        slope_error_range,
    })
    .check(sender)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sender that records requested delays and answers from a script.
    struct ScriptedSender {
        requested: Vec<f64>,
        respond: Box<dyn FnMut(f64) -> Result<f64, TransportError>>,
    }

    impl ScriptedSender {
        fn new(respond: impl FnMut(f64) -> Result<f64, TransportError> + 'static) -> Self {
            Self {
                requested: Vec::new(),
                respond: Box::new(respond),
            }
        }
    }

    impl ProbeSender for ScriptedSender {
        fn probe(&mut self, requested_delay_seconds: f64) -> Result<f64, TransportError> {
            self.requested.push(requested_delay_seconds);
            (self.respond)(requested_delay_seconds)
        }
    }

    #[test]
    fn alternates_high_and_low_delays() {
        let mut sender = ScriptedSender::new(|delay| Ok(delay));
        let result = check_timing_dependence(4, 10.0, &mut sender, 0.2, 0.2).unwrap();

        assert!(result, "Exact y = x sender should be flagged injectable");
        assert_eq!(
            sender.requested,
            vec![10.0, 1.0, 10.0, 1.0],
            "Probes should alternate high and low delays"
        );
    }

    #[test]
    fn odd_budget_still_sends_whole_pairs() {
        let mut sender = ScriptedSender::new(|delay| Ok(delay));
        let result = check_timing_dependence(5, 10.0, &mut sender, 0.2, 0.2).unwrap();

        assert!(result);
        // 5 -> 3 -> 1 -> -1: three whole pairs.
        assert_eq!(sender.requested.len(), 6);
    }

    #[test]
    fn under_delaying_target_ruled_out_within_first_pair() {
        let mut sender = ScriptedSender::new(|_| Ok(0.3));
        let result = check_timing_dependence(100, 10.0, &mut sender, 0.2, 0.2).unwrap();

        assert!(!result);
        assert!(
            sender.requested.len() <= 2,
            "Early exit should fire within the first probe pair, sent {}",
            sender.requested.len()
        );
    }

    #[test]
    fn under_delaying_low_probe_exits_after_exactly_two() {
        // High probe looks delayed, low probe comes back too fast.
        let mut sender = ScriptedSender::new(|delay| if delay > 1.0 { Ok(delay) } else { Ok(0.2) });
        let result = check_timing_dependence(100, 10.0, &mut sender, 0.2, 0.2).unwrap();

        assert!(!result);
        assert_eq!(sender.requested.len(), 2);
    }

    #[test]
    fn constant_latency_target_pruned_early() {
        // Always slower than requested, but flat at 30s: no correlation
        // with the requested delay, slope 0.
        let mut sender = ScriptedSender::new(|_| Ok(30.0));
        let result = check_timing_dependence(100, 10.0, &mut sender, 0.2, 0.2).unwrap();

        assert!(!result);
        assert!(
            sender.requested.len() <= 4,
            "Wide-tolerance pruning should stop an uncorrelated target, sent {}",
            sender.requested.len()
        );
    }

    #[test]
    fn transport_error_propagates_and_stops_probing() {
        let mut sender = ScriptedSender::new(|delay| {
            if delay > 1.0 {
                Ok(delay)
            } else {
                Err("connection reset".into())
            }
        });
        let err = check_timing_dependence(4, 10.0, &mut sender, 0.2, 0.2).unwrap_err();

        assert!(matches!(err, ProbeError::Transport(_)));
        assert_eq!(
            sender.requested.len(),
            2,
            "No probe may follow a transport failure"
        );
    }

    #[test]
    fn request_limit_below_minimum_rejected_before_io() {
        let mut sender = ScriptedSender::new(|delay| Ok(delay));
        let err = check_timing_dependence(1, 10.0, &mut sender, 0.2, 0.2).unwrap_err();

        assert!(matches!(
            err,
            ProbeError::InvalidRequestLimit {
                limit: 1,
                minimum: 2
            }
        ));
        assert!(
            sender.requested.is_empty(),
            "Configuration errors must surface before any request is sent"
        );
    }

    #[test]
    fn probe_error_display() {
        let err = ProbeError::InvalidRequestLimit {
            limit: 1,
            minimum: 2,
        };
        assert_eq!(
            err.to_string(),
            "Request limit 1 too small: need at least 2 probes for a fit"
        );

        let err = ProbeError::Transport("timed out".into());
        assert_eq!(err.to_string(), "Probe transport failed: timed out");
    }

    #[test]
    fn closure_senders_work_through_blanket_impl() {
        let mut calls = 0u32;
        let mut sender = |delay: f64| -> Result<f64, TransportError> {
            calls += 1;
            Ok(delay + 0.01)
        };

        let result = check_timing_dependence(2, 5.0, &mut sender, 0.2, 0.2).unwrap();
        assert!(result);
        assert_eq!(calls, 2);
    }
}
