//! Overlay effects
//!
//! Boundary crossings, in either direction, light up a full-viewport flash
//! and a horizontal sweep line. Each boundary is debounced independently so
//! jitter around the same boundary does not stack overlays.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::schema::{EffectConfig, FlashConfig, SweepConfig};
use crate::observability::metrics;

/// One fired overlay.
#[derive(Debug, Clone)]
pub struct OverlayActivation {
    /// Boundary (section index) that fired
    pub boundary: usize,
    /// When the overlay started
    pub started: Instant,
    flash: FlashConfig,
    sweep: SweepConfig,
}

impl OverlayActivation {
    /// Flash intensity at `now`: linear rise to the peak, then linear decay.
    #[must_use]
    pub fn flash_intensity(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started);
        let rise = self.flash.rise;
        if elapsed < rise {
            return self.flash.peak * ratio(elapsed, rise);
        }
        let decaying = elapsed - rise;
        if decaying >= self.flash.decay {
            return 0.0;
        }
        self.flash.peak * (1.0 - ratio(decaying, self.flash.decay))
    }

    /// Sweep line position at `now` in `[0, 1]`, or `None` while waiting
    /// for the delay or after the line has left the viewport.
    #[must_use]
    pub fn sweep_position(&self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.started);
        let moving = elapsed.checked_sub(self.sweep.delay)?;
        if moving > self.sweep.duration {
            return None;
        }
        Some(ratio(moving, self.sweep.duration))
    }

    /// Total lifetime of the overlay.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        let flash = self.flash.rise + self.flash.decay;
        let sweep = self.sweep.delay + self.sweep.duration;
        flash.max(sweep)
    }

    /// Whether both curves have completed.
    #[must_use]
    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) > self.lifetime()
    }
}

/// `part / whole` clamped to `[0, 1]`; a zero `whole` counts as done.
fn ratio(part: Duration, whole: Duration) -> f64 {
    if whole.is_zero() {
        return 1.0;
    }
    (part.as_secs_f64() / whole.as_secs_f64()).clamp(0.0, 1.0)
}

/// Combined overlay state at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayFrame {
    /// Strongest flash intensity among live overlays
    pub flash: f64,
    /// Positions of every visible sweep line
    pub sweeps: Vec<f64>,
    /// Boundaries with a live overlay
    pub active: Vec<usize>,
}

impl OverlayFrame {
    /// Whether nothing is visible.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.flash <= 0.0 && self.sweeps.is_empty()
    }
}

/// Debounced overlay dispatcher, one per mount.
#[derive(Debug)]
pub struct EffectBroadcaster {
    config: EffectConfig,
    last_fired: HashMap<usize, Instant>,
    live: Vec<OverlayActivation>,
    fired: u64,
    suppressed: u64,
}

impl EffectBroadcaster {
    /// Creates a broadcaster with an empty cooldown map.
    #[must_use]
    pub fn new(config: EffectConfig) -> Self {
        Self {
            config,
            last_fired: HashMap::new(),
            live: Vec::new(),
            fired: 0,
            suppressed: 0,
        }
    }

    /// Configured cooldown.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.config.cooldown
    }

    /// Overlays fired so far.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }

    /// Notifications dropped by the cooldown so far.
    #[must_use]
    pub const fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Overlays that have not finished yet (as of the last sample).
    #[must_use]
    pub fn live(&self) -> &[OverlayActivation] {
        &self.live
    }

    /// Requests an overlay for `boundary`.
    ///
    /// Fires only when strictly more than the cooldown has passed since the
    /// last accepted request for the same boundary. Dropped requests leave
    /// the cooldown untouched.
    pub fn notify_enter(&mut self, boundary: usize, now: Instant) -> Option<OverlayActivation> {
        if let Some(last) = self.last_fired.get(&boundary) {
            let since = now.saturating_duration_since(*last);
            if since <= self.config.cooldown {
                self.suppressed += 1;
                metrics::record_overlay_suppressed();
                debug!(boundary, since_ms = since.as_millis(), "overlay suppressed by cooldown");
                return None;
            }
        }

        self.last_fired.insert(boundary, now);
        self.fired += 1;
        metrics::record_overlay_fired();
        info!(boundary, "overlay fired");

        let activation = OverlayActivation {
            boundary,
            started: now,
            flash: self.config.flash.clone(),
            sweep: self.config.sweep.clone(),
        };
        self.live.push(activation.clone());
        Some(activation)
    }

    /// Samples every live overlay and prunes the finished ones.
    pub fn sample(&mut self, now: Instant) -> OverlayFrame {
        self.live.retain(|a| !a.is_finished(now));

        let mut frame = OverlayFrame::default();
        for activation in &self.live {
            frame.flash = frame.flash.max(activation.flash_intensity(now));
            if let Some(position) = activation.sweep_position(now) {
                frame.sweeps.push(position);
            }
            frame.active.push(activation.boundary);
        }
        frame
    }

    /// Drops live overlays and the cooldown map.
    pub fn clear(&mut self) {
        self.live.clear();
        self.last_fired.clear();
    }
}
