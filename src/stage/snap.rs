//! Snap-to-section resolution
//!
//! When scrolling stops, the stage can settle on the nearest section's rest
//! plateau. Snap points sit at the midpoint of each hold window.

use std::time::Duration;

use serde::Serialize;

use crate::config::schema::SnapConfig;

use super::span::ScrollSpan;
use super::timeline::PhaseWindows;

/// Offsets closer than this to a snap point are already snapped.
const SNAP_TOLERANCE: f64 = 0.5;

/// Where and how to snap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SnapTarget {
    /// Target section
    pub section: usize,
    /// Target offset
    pub offset: f64,
    /// Snap animation duration
    #[serde(with = "crate::config::schema::duration_str")]
    pub duration: Duration,
    /// Idle delay before the snap starts
    #[serde(with = "crate::config::schema::duration_str")]
    pub delay: Duration,
}

#[derive(Debug, Clone, Copy)]
struct SnapPoint {
    section: usize,
    offset: f64,
    span_len: f64,
}

/// Nearest-rest snap resolver.
#[derive(Debug, Clone)]
pub struct SnapResolver {
    config: SnapConfig,
    points: Vec<SnapPoint>,
}

impl SnapResolver {
    /// Builds snap points for `spans`; zero-length spans get none.
    #[must_use]
    pub fn new(config: SnapConfig, windows: PhaseWindows, spans: &[ScrollSpan]) -> Self {
        let rest = f64::midpoint(windows.enter_end, windows.exit_start);
        let points = spans
            .iter()
            .filter(|span| !span.is_empty())
            .map(|span| SnapPoint {
                section: span.section,
                offset: span.offset_at(rest),
                span_len: span.len(),
            })
            .collect();
        Self { config, points }
    }

    /// Whether snapping is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Snap point offsets in section order.
    #[must_use]
    pub fn points(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.offset).collect()
    }

    /// Nearest snap target for `offset`, or `None` when disabled, when there
    /// are no points, or when `offset` already sits on a point.
    #[must_use]
    pub fn resolve(&self, offset: f64) -> Option<SnapTarget> {
        if !self.config.enabled || !offset.is_finite() {
            return None;
        }
        let nearest = self
            .points
            .iter()
            .min_by(|a, b| (a.offset - offset).abs().total_cmp(&(b.offset - offset).abs()))?;

        let distance = (nearest.offset - offset).abs();
        if distance < SNAP_TOLERANCE {
            return None;
        }

        let max = self.config.max_duration;
        let min = self.config.min_duration.min(max);
        let proportional = max.mul_f64((distance / nearest.span_len).min(1.0));
        Some(SnapTarget {
            section: nearest.section,
            offset: nearest.offset,
            duration: proportional.clamp(min, max),
            delay: self.config.delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::span::SpanLayout;

    fn enabled() -> SnapConfig {
        SnapConfig {
            enabled: true,
            ..SnapConfig::default()
        }
    }

    fn resolver(config: SnapConfig) -> SnapResolver {
        SnapResolver::new(
            config,
            PhaseWindows::default(),
            &SpanLayout::default().uniform(3, 900.0),
        )
    }

    #[test]
    fn points_sit_mid_plateau() {
        let snap = resolver(enabled());
        assert_eq!(snap.points(), vec![800.0, 2400.0, 4000.0]);
    }

    #[test]
    fn resolves_to_nearest_point() {
        let snap = resolver(enabled());
        let target = snap.resolve(2000.0).unwrap();
        assert_eq!(target.section, 1);
        assert!((target.offset - 2400.0).abs() < f64::EPSILON);
        assert_eq!(target.delay, Duration::from_millis(100));
    }

    #[test]
    fn duration_is_clamped() {
        let snap = resolver(enabled());
        let near = snap.resolve(2390.0).unwrap();
        assert_eq!(near.duration, Duration::from_millis(300));
        let far = snap.resolve(1601.0).unwrap();
        assert!(far.duration <= Duration::from_millis(800));
        assert!(far.duration > Duration::from_millis(300));
    }

    #[test]
    fn on_point_or_disabled_yields_none() {
        assert!(resolver(enabled()).resolve(2400.2).is_none());
        assert!(resolver(SnapConfig::default()).resolve(2000.0).is_none());
        assert!(resolver(enabled()).resolve(f64::NAN).is_none());
    }
}
