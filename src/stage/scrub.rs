//! Scrub smoothing
//!
//! Lets animation progress trail the raw scroll offset. The smoothed offset
//! closes the gap exponentially: after one scrub duration about 98% of it
//! is gone.

use std::time::Duration;

use tokio::time::Instant;

/// `-ln(0.02)`: decay rate that leaves 2% of the gap after one duration.
const SETTLE_RATE: f64 = 3.912_023_005_428_146;

/// Gaps smaller than this snap to the raw offset.
const SETTLE_EPSILON: f64 = 0.01;

/// Exponential follower of the raw scroll offset.
#[derive(Debug, Clone, Default)]
pub struct ScrubSmoother {
    lag: Option<Duration>,
    value: Option<f64>,
    target: f64,
    last: Option<Instant>,
}

impl ScrubSmoother {
    /// Creates a smoother; `None` or a zero lag follows the raw offset.
    #[must_use]
    pub fn new(lag: Option<Duration>) -> Self {
        Self {
            lag: lag.filter(|d| !d.is_zero()),
            ..Self::default()
        }
    }

    /// Configured lag.
    #[must_use]
    pub const fn lag(&self) -> Option<Duration> {
        self.lag
    }

    /// Current smoothed offset.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// Whether the smoothed offset has caught up with the raw one.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.value.is_none_or(|v| (v - self.target).abs() < SETTLE_EPSILON)
    }

    /// Feeds a raw offset and returns the smoothed one.
    pub fn update(&mut self, raw: f64, now: Instant) -> f64 {
        self.target = raw;
        self.advance(now)
    }

    /// Advances towards the last raw offset without a new sample.
    pub fn advance(&mut self, now: Instant) -> f64 {
        let raw = self.target;
        let previous_instant = self.last.replace(now);

        let (Some(lag), Some(current), Some(previous_instant)) =
            (self.lag, self.value, previous_instant)
        else {
            self.value = Some(raw);
            return raw;
        };
        if !raw.is_finite() || !current.is_finite() {
            self.value = Some(raw);
            return raw;
        }

        let dt = now.saturating_duration_since(previous_instant).as_secs_f64();
        let alpha = 1.0 - (-SETTLE_RATE * dt / lag.as_secs_f64()).exp();
        let mut next = (raw - current).mul_add(alpha, current);
        if (raw - next).abs() < SETTLE_EPSILON {
            next = raw;
        }
        self.value = Some(next);
        next
    }

    /// Places both the raw and smoothed offset at `offset` with no pending gap.
    pub fn seed(&mut self, offset: f64) {
        self.target = offset;
        self.value = Some(offset);
        self.last = None;
    }

    /// Forgets the smoothed value; the next update jumps.
    pub fn reset(&mut self) {
        self.value = None;
        self.last = None;
    }
}
