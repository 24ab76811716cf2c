//! Online (streaming) simple linear regression using Welford's method.
//!
//! This module fits `y = slope * x + intercept` over a stream of samples
//! with O(1) memory and O(1) per-sample overhead, without storing history.
//! Variance and covariance terms are accumulated from one residual factor
//! taken against the pre-update running mean and one against the
//! post-update mean; that pairing is what keeps the accumulation numerically
//! stable on long streams, so do not replace it with a plain
//! sum-of-squares formula.

use serde::{Deserialize, Serialize};

/// Online least-squares fit of `y = slope * x + intercept`.
///
/// Each call to [`add_point`](Self::add_point) folds one (x, y) pair into
/// the fit in constant time. Until a second sample arrives there is nothing
/// to fit, and the accumulator reports the identity line with perfect
/// correlation (`slope = 1`, `intercept = 0`, `correlation = 1`) by
/// convention; confidence queries on an unwarmed accumulator therefore
/// succeed on zero evidence.
///
/// # Example
///
/// ```
/// use latens::OnlineRegression;
///
/// let mut fit = OnlineRegression::new();
/// for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)] {
///     fit.add_point(x, y);
/// }
/// assert!((fit.slope() - 2.0).abs() < 1e-10);
/// assert!((fit.correlation() - 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct OnlineRegression {
    /// Number of samples seen. Never decreases.
    count: u64,
    /// Running sum of x values.
    sum_x: f64,
    /// Running sum of y values.
    sum_y: f64,
    /// Accumulated variance term for x (variance times N, not variance).
    var_x: f64,
    /// Accumulated variance term for y (variance times N).
    var_y: f64,
    /// Accumulated covariance term (covariance times N).
    covar_xy: f64,
    /// Current fitted slope.
    slope: f64,
    /// Current fitted intercept.
    intercept: f64,
    /// Squared correlation of the fit, in [0, 1] for real data.
    correlation: f64,
}

impl Default for OnlineRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl OnlineRegression {
    /// Create an empty accumulator reporting the warm-up defaults.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            var_x: 0.0,
            var_y: 0.0,
            covar_xy: 0.0,
            slope: 1.0,
            intercept: 0.0,
            correlation: 1.0,
        }
    }

    /// Fold one sample into the fit.
    ///
    /// Accepts any finite values; the caller is responsible for ranges and
    /// signs. Never fails: the degenerate cases below are absorbed by
    /// documented substitutions instead.
    ///
    /// The very first sample only establishes the baseline (the pre-update
    /// running mean does not exist yet), so the derived values keep their
    /// warm-up defaults until a second sample arrives.
    ///
    /// A stream with constant y (a perfectly flat response line) drives the
    /// correlation formula into 0/0; the result is reported as `1.0`,
    /// treating the flat line as a degenerate perfect fit.
    pub fn add_point(&mut self, x: f64, y: f64) {
        if self.count == 0 {
            self.count = 1;
            self.sum_x = x;
            self.sum_y = y;
            return;
        }

        // Residual factors against the pre-update means.
        let n = self.count as f64;
        let x_adjustment = x - self.sum_x / n;
        let y_adjustment = y - self.sum_y / n;

        self.count += 1;
        self.sum_x += x;
        self.sum_y += y;

        // Residuals against the post-update means. Each accumulation pairs
        // one pre-update factor with one post-update factor.
        let n = self.count as f64;
        let mean_x = self.sum_x / n;
        let mean_y = self.sum_y / n;
        let x_residual = x - mean_x;
        let y_residual = y - mean_y;

        self.var_x += x_residual * x_adjustment;
        self.var_y += y_residual * y_adjustment;
        self.covar_xy += x_residual * y_adjustment;

        self.slope = self.covar_xy / self.var_x;

        // Squared, so the value is direction-insensitive: an inverse
        // relationship scores as high as a direct one. The slope check in
        // is_within_confidence is what rejects inverse relationships.
        let correlation = (self.slope * (self.var_x / self.var_y).sqrt()).powi(2);
        self.correlation = if correlation.is_nan() { 1.0 } else { correlation };

        self.intercept = mean_y - self.slope * mean_x;
    }

    /// Current fitted slope.
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Current fitted intercept.
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Current squared correlation.
    pub fn correlation(&self) -> f64 {
        self.correlation
    }

    /// Number of samples folded in so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Evaluate the fitted line at `x`.
    ///
    /// Only meaningful once the correlation is high and at least two
    /// samples have been seen; no guard is enforced here.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Whether the current fit lies within the given tolerance windows.
    ///
    /// True iff `correlation > 1 - correlation_error_range` and
    /// `|expected_slope - slope| < slope_error_range`. Both conditions are
    /// required; neither can be waived independently.
    pub fn is_within_confidence(
        &self,
        correlation_error_range: f64,
        expected_slope: f64,
        slope_error_range: f64,
    ) -> bool {
        self.correlation > 1.0 - correlation_error_range
            && (expected_slope - self.slope).abs() < slope_error_range
    }

    /// Point-in-time view of the fit, e.g. for attaching to an alert.
    pub fn snapshot(&self) -> RegressionSnapshot {
        RegressionSnapshot {
            count: self.count,
            slope: self.slope,
            intercept: self.intercept,
            correlation: self.correlation,
        }
    }
}

/// Snapshot of a regression fit at a point in time.
///
/// Returned by [`OnlineRegression::snapshot`]; serializable so scanners can
/// record the evidence behind a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionSnapshot {
    /// Number of samples behind the fit.
    pub count: u64,
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Squared correlation of the fit.
    pub correlation: f64,
}
