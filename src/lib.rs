//! # latens
//!
//! Detect time-based blind injection by correlating requested delays with
//! observed response latency.
//!
//! A target parameter is considered injectable when a payload embedding a
//! server-side sleep (`SLEEP(n)`, `pg_sleep(n)`, `ping -c n`, ...) makes the
//! response time track the requested delay one-for-one. This crate provides
//! the decision core for that check: an incremental linear regression over
//! (requested delay, observed latency) pairs, and an adaptive sampling loop
//! that alternates a high and a low delay, prunes hopeless targets early,
//! and renders a pass/fail verdict within a fixed request budget.
//!
//! Everything network-related is the caller's concern: you supply a sender
//! closure that issues exactly one request embedding the requested delay and
//! returns the measured round-trip time in seconds.
//!
//! ## Quick Start
//!
//! ```
//! use latens::{TimingProbe, TransportError};
//!
//! // A stand-in target that executes the injected sleep verbatim.
//! let mut sender = |delay: f64| -> Result<f64, TransportError> { Ok(delay + 0.05) };
//!
//! let injectable = TimingProbe::new()
//!     .requests_limit(4)
//!     .high_sleep_time(10.0)
//!     .check(&mut sender)
//!     .unwrap();
//!
//! assert!(injectable);
//! ```
//!
//! Probes are strictly sequential: the latency measurement is only
//! meaningful while exactly one request is in flight, so the sampler blocks
//! on every probe and never pipelines.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod constants;
mod sampler;

pub mod statistics;

pub use config::ProbeConfig;
pub use constants::{
    DEFAULT_CORRELATION_ERROR_RANGE, DEFAULT_HIGH_SLEEP_TIME_SECONDS, DEFAULT_REQUEST_LIMIT,
    DEFAULT_SLOPE_ERROR_RANGE, EXPECTED_SLOPE, LOW_SLEEP_TIME_SECONDS, MINIMUM_REQUEST_LIMIT,
    PRUNE_CORRELATION_ERROR_RANGE, PRUNE_SLOPE_ERROR_RANGE,
};
pub use sampler::{check_timing_dependence, ProbeError, ProbeSender, TimingProbe, TransportError};
pub use statistics::{OnlineRegression, RegressionSnapshot};
