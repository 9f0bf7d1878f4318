//! Headless scroll replay
//!
//! Replays a scroll trace against an [`Orchestrator`] on a virtual clock so
//! a stage can be exercised without a browser. A trace looks like:
//!
//! ```yaml
//! viewport: 900
//! start: 0
//! steps:
//!   - type: scroll
//!     to: 1760
//!   - type: wait
//!     duration: 500ms
//!   - type: resize
//!     height: 700
//!   - type: settle
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::config::schema::duration_str;
use crate::error::{ScrollStageError, StageError};
use crate::stage::host::ScrollHost;
use crate::stage::orchestrator::{MountSummary, Orchestrator, StageFrame};
use crate::stage::pin::PinChange;
use crate::stage::snap::SnapTarget;

// ============================================================================
// Trace
// ============================================================================

/// A recorded or scripted sequence of host events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollTrace {
    /// Viewport height at mount
    #[serde(default = "default_viewport")]
    pub viewport: f64,
    /// Scroll offset at mount
    #[serde(default)]
    pub start: f64,
    /// Steps in order
    #[serde(default)]
    pub steps: Vec<TraceStep>,
}

/// Longest single `wait` a trace may contain.
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

const fn default_viewport() -> f64 {
    900.0
}

/// One host event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceStep {
    /// Scroll to an absolute offset
    Scroll {
        /// Target offset
        to: f64,
    },
    /// Advance the virtual clock
    Wait {
        /// How long to wait
        #[serde(with = "duration_str")]
        duration: Duration,
    },
    /// Resize the viewport (spans go stale)
    Resize {
        /// New viewport height
        height: f64,
    },
    /// The resize has settled; spans are recomputed
    Settle,
    /// Sample without scrolling
    Tick,
    /// Snap to the nearest section rest, if snapping is enabled
    Snap,
    /// Tear the stage down
    Unmount,
    /// Mount again
    Mount {
        /// Viewport height; defaults to the last one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        viewport: Option<f64>,
        /// Initial offset; defaults to the last offset
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<f64>,
    },
}

impl ScrollTrace {
    /// Parses a trace from YAML.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Trace` for malformed YAML or an unusable
    /// viewport.
    pub fn from_yaml(content: &str) -> Result<Self, StageError> {
        let trace: Self =
            serde_yaml::from_str(content).map_err(|e| StageError::Trace(e.to_string()))?;
        trace.check()?;
        Ok(trace)
    }

    /// Reads and parses a trace file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be read, or a stage error
    /// when it does not parse.
    pub fn load(path: &Path) -> Result<Self, ScrollStageError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }

    /// Builds a trace that scrolls through `offsets`, waiting `interval`
    /// before each one after the first.
    #[must_use]
    pub fn from_offsets(viewport: f64, offsets: &[f64], interval: Duration) -> Self {
        let mut steps = Vec::with_capacity(offsets.len() * 2);
        for (i, &to) in offsets.iter().enumerate() {
            if i > 0 && !interval.is_zero() {
                steps.push(TraceStep::Wait { duration: interval });
            }
            steps.push(TraceStep::Scroll { to });
        }
        Self {
            viewport,
            start: 0.0,
            steps,
        }
    }

    fn check(&self) -> Result<(), StageError> {
        let viewport_ok = |v: f64| v.is_finite() && v > 0.0;
        if !viewport_ok(self.viewport) {
            return Err(StageError::Trace(format!(
                "viewport must be positive, got {}",
                self.viewport
            )));
        }
        for (step, entry) in self.steps.iter().enumerate() {
            if let TraceStep::Wait { duration } = entry
                && *duration > MAX_WAIT
            {
                return Err(StageError::Trace(format!(
                    "step {step}: wait exceeds {}",
                    humantime::format_duration(MAX_WAIT)
                )));
            }
            let bad = match entry {
                TraceStep::Resize { height } => !viewport_ok(*height),
                TraceStep::Mount {
                    viewport: Some(v), ..
                } => !viewport_ok(*v),
                _ => false,
            };
            if bad {
                return Err(StageError::Trace(format!(
                    "step {step}: viewport height must be positive"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Report
// ============================================================================

/// One sampled frame.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    /// Index of the step that produced the frame
    pub step: usize,
    /// Virtual clock in milliseconds
    pub clock_ms: u64,
    /// The frame
    pub frame: StageFrame,
}

/// A resolved snap step.
#[derive(Debug, Clone, Serialize)]
pub struct SnapRecord {
    /// Step index
    pub step: usize,
    /// Offset the snap was resolved from
    pub from: f64,
    /// Resolved target, if any
    pub target: Option<SnapTarget>,
}

/// Aggregate counts over a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Boundary crossings dispatched
    pub crossings: usize,
    /// Overlays fired
    pub overlays_fired: usize,
    /// Overlay requests dropped by the cooldown
    pub overlays_suppressed: usize,
    /// Pin acquisitions
    pub pin_acquisitions: usize,
}

/// Everything a replay produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Stage name
    pub stage: String,
    /// Every mount performed, in order
    pub mounts: Vec<MountSummary>,
    /// Sampled frames
    pub samples: Vec<Sample>,
    /// Snap steps
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub snaps: Vec<SnapRecord>,
    /// Aggregate counts
    pub totals: Totals,
}

impl Totals {
    fn add(&mut self, frame: &StageFrame) {
        self.crossings += frame.crossings.len();
        self.overlays_fired += frame.overlays_fired.len();
        self.overlays_suppressed += frame.crossings.len() - frame.overlays_fired.len();
        self.pin_acquisitions += frame
            .pin_changes
            .iter()
            .filter(|c| matches!(c, PinChange::Acquired { .. }))
            .count();
    }
}

// ============================================================================
// Replay
// ============================================================================

/// Mounts `stage` and replays `trace` against it.
///
/// The stage is left mounted (unless the trace ends with `unmount`) so the
/// caller can inspect the host afterwards.
///
/// # Errors
///
/// Returns `StageError::NotMounted` when a step other than `mount`,
/// `unmount` or `wait` runs while the stage is unmounted.
pub fn run<H: ScrollHost>(
    stage: &mut Orchestrator<H>,
    trace: &ScrollTrace,
) -> Result<SimulationReport, StageError> {
    let origin = Instant::now();
    let mut clock = Duration::ZERO;
    let mut viewport = trace.viewport;
    let mut offset = trace.start;

    let mut report = SimulationReport {
        stage: stage.config().stage.name.clone(),
        mounts: vec![stage.mount(viewport, offset)],
        samples: Vec::new(),
        snaps: Vec::new(),
        totals: Totals::default(),
    };

    for (step, entry) in trace.steps.iter().enumerate() {
        debug!(step, ?entry, clock_ms = clock.as_millis(), "replaying step");
        let now = origin + clock;
        let frame = match entry {
            TraceStep::Scroll { to } => {
                offset = *to;
                Some(stage.on_scroll(offset, now).ok_or(StageError::NotMounted { step })?)
            }
            TraceStep::Wait { duration } => {
                clock += *duration;
                None
            }
            TraceStep::Resize { height } => {
                if !stage.is_mounted() {
                    return Err(StageError::NotMounted { step });
                }
                viewport = *height;
                stage.on_resize(viewport);
                None
            }
            TraceStep::Settle => {
                stage
                    .on_resize_settled()
                    .ok_or(StageError::NotMounted { step })?;
                None
            }
            TraceStep::Tick => Some(stage.tick(now).ok_or(StageError::NotMounted { step })?),
            TraceStep::Snap => {
                if !stage.is_mounted() {
                    return Err(StageError::NotMounted { step });
                }
                let target = stage.snap_target(offset);
                report.snaps.push(SnapRecord {
                    step,
                    from: offset,
                    target,
                });
                match target {
                    Some(target) => {
                        clock += target.delay + target.duration;
                        offset = target.offset;
                        stage.on_scroll(offset, origin + clock)
                    }
                    None => None,
                }
            }
            TraceStep::Unmount => {
                stage.unmount();
                None
            }
            TraceStep::Mount { viewport: v, at } => {
                viewport = v.unwrap_or(viewport);
                offset = at.unwrap_or(offset);
                report.mounts.push(stage.mount(viewport, offset));
                None
            }
        };

        if let Some(frame) = frame {
            report.totals.add(&frame);
            report.samples.push(Sample {
                step,
                clock_ms: u64::try_from(clock.as_millis()).unwrap_or(u64::MAX),
                frame,
            });
        }
    }

    Ok(report)
}
