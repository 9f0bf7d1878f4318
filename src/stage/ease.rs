//! Easing curves for keyframe interpolation
//!
//! Every curve maps a normalized segment position `t ∈ [0, 1]` onto an
//! eased position with `f(0) = 0` and `f(1) = 1`, so resting keyframes are
//! always reached exactly.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Easing curve applied inside each keyframe segment.
///
/// - Linear: `f(t) = t`
/// - `QuadIn`: `f(t) = t²`, slow start
/// - `QuadOut`: `f(t) = 1 - (1 - t)²`, slow finish
/// - `QuadInOut`: quadratic acceleration then deceleration
/// - `SineInOut`: `f(t) = 0.5 × (1 - cos(π × t))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    /// Constant rate of change
    #[default]
    Linear,
    /// Quadratic ease-in
    #[serde(alias = "power2.in")]
    QuadIn,
    /// Quadratic ease-out
    #[serde(alias = "power2.out")]
    QuadOut,
    /// Quadratic ease-in-out
    #[serde(alias = "power2.inOut")]
    QuadInOut,
    /// Sinusoidal ease-in-out
    #[serde(alias = "sine.inOut")]
    SineInOut,
}

impl Ease {
    /// Applies the curve to `t`, clamping `t` to `[0, 1]` first.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv
            }
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let inv = (-2.0f64).mul_add(t, 2.0);
                    1.0 - inv * inv / 2.0
                }
            }
            Self::SineInOut => 0.5 * (1.0 - (PI * t).cos()),
        }
    }
}
