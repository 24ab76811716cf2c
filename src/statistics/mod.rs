//! Incremental statistics for the timing-dependence check.

mod regression;

pub use regression::{OnlineRegression, RegressionSnapshot};
