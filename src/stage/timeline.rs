//! Phase timeline
//!
//! Each section's animation is an explicit keyframe table sampled by a
//! generic interpolator. Keyframe positions are local progress values, so
//! the same table drives any renderer: a frame loop, CSS custom properties,
//! or a tweening library.
//!
//! # Layout of a section program
//!
//! ```text
//! 0 ──── enter_end ════════ exit_start ──── 1
//!   enter      hold (rest plateau)      exit
//! ```
//!
//! Both window edges are closed on the resting side: at exactly `enter_end`
//! and exactly `exit_start` every element is fully at rest.

use serde::Serialize;

use crate::config::schema::TimelineConfig;

use super::ease::Ease;
use super::mapper::ScrollPosition;
use super::section::{Section, SectionRegistry};

/// Smallest share of the enter/exit window a single staggered item gets.
const MIN_ITEM_WINDOW_SHARE: f64 = 0.5;

// ============================================================================
// Phase state
// ============================================================================

/// Visual phase of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The section is still ahead of the viewport
    Before,
    /// Enter window
    Entering,
    /// Rest plateau
    Holding,
    /// Exit window
    Exiting,
    /// The section has been scrolled past
    After,
}

impl Phase {
    /// Whether this is one of the three active phases.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Entering | Self::Holding | Self::Exiting)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Before => "before",
            Self::Entering => "entering",
            Self::Holding => "holding",
            Self::Exiting => "exiting",
            Self::After => "after",
        };
        f.write_str(name)
    }
}

/// Phase and local progress of one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseState {
    /// Current phase
    pub phase: Phase,
    /// Local progress in `[0, 1]`
    pub local_progress: f64,
}

/// Boundaries of the enter and exit windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWindows {
    /// End of the enter window
    pub enter_end: f64,
    /// Start of the exit window
    pub exit_start: f64,
}

impl Default for PhaseWindows {
    fn default() -> Self {
        Self {
            enter_end: 0.20,
            exit_start: 0.80,
        }
    }
}

impl PhaseWindows {
    /// Classifies an active section's local progress.
    #[must_use]
    pub fn classify(&self, local_progress: f64) -> PhaseState {
        let p = local_progress.clamp(0.0, 1.0);
        let phase = if p < self.enter_end {
            Phase::Entering
        } else if p <= self.exit_start {
            Phase::Holding
        } else {
            Phase::Exiting
        };
        PhaseState {
            phase,
            local_progress: p,
        }
    }

    /// Length of the exit window.
    #[must_use]
    pub fn exit_len(&self) -> f64 {
        1.0 - self.exit_start
    }
}

// ============================================================================
// Transforms and keyframes
// ============================================================================

/// Visual properties of one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Horizontal translation
    pub translate_x: f64,
    /// Vertical translation
    pub translate_y: f64,
    /// Uniform scale
    pub scale: f64,
    /// Horizontal scale (connectors grow from zero width)
    pub scale_x: f64,
}

impl Transform {
    /// Fully visible, untransformed.
    pub const REST: Self = Self {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        scale_x: 1.0,
    };

    /// Interpolates towards `to`. `t <= 0` returns `self` and `t >= 1`
    /// returns `to` exactly.
    #[must_use]
    pub fn lerp(&self, to: &Self, t: f64) -> Self {
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *to;
        }
        let mix = |a: f64, b: f64| (b - a).mul_add(t, a);
        Self {
            opacity: mix(self.opacity, to.opacity),
            translate_x: mix(self.translate_x, to.translate_x),
            translate_y: mix(self.translate_y, to.translate_y),
            scale: mix(self.scale, to.scale),
            scale_x: mix(self.scale_x, to.scale_x),
        }
    }
}

/// A transform pinned to a local-progress position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Local progress position
    pub at: f64,
    /// Transform at that position
    pub transform: Transform,
}

/// An ordered keyframe table for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    keyframes: Vec<Keyframe>,
    ease: Ease,
}

impl Track {
    /// Builds a track; keyframes are sorted by position.
    #[must_use]
    pub fn new(mut keyframes: Vec<Keyframe>, ease: Ease) -> Self {
        keyframes.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { keyframes, ease }
    }

    /// Keyframes in order.
    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Samples the track at `progress` (clamped to `[0, 1]`).
    ///
    /// Before the first keyframe the first transform holds; after the last
    /// the last one holds. Zero-length segments resolve to their end.
    #[must_use]
    pub fn sample(&self, progress: f64) -> Transform {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        let (Some(first), Some(last)) = (self.keyframes.first(), self.keyframes.last()) else {
            return Transform::REST;
        };
        if p <= first.at {
            return first.transform;
        }

        for pair in self.keyframes.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if p <= to.at {
                let len = to.at - from.at;
                if len <= f64::EPSILON {
                    return to.transform;
                }
                let t = self.ease.apply((p - from.at) / len);
                return from.transform.lerp(&to.transform, t);
            }
        }

        last.transform
    }
}

// ============================================================================
// Section programs
// ============================================================================

/// Sampled transforms for every element of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFrame {
    /// Section index
    pub section: usize,
    /// Phase and local progress
    pub state: PhaseState,
    /// Primary text block
    pub text: Transform,
    /// Auxiliary panel
    pub panel: Transform,
    /// Staggered panel items
    pub items: Vec<Transform>,
    /// Connector decorations
    pub connectors: Vec<Transform>,
}

/// Keyframe tables for one section.
#[derive(Debug, Clone)]
struct SectionProgram {
    text: Track,
    panel: Track,
    items: Vec<Track>,
    connectors: Vec<Track>,
}

impl SectionProgram {
    fn sample(&self, section: usize, state: PhaseState) -> SectionFrame {
        let p = state.local_progress;
        SectionFrame {
            section,
            state,
            text: self.text.sample(p),
            panel: self.panel.sample(p),
            items: self.items.iter().map(|t| t.sample(p)).collect(),
            connectors: self.connectors.iter().map(|t| t.sample(p)).collect(),
        }
    }
}

/// Builds keyframe tables from the timeline configuration.
struct ProgramBuilder<'a> {
    config: &'a TimelineConfig,
    windows: PhaseWindows,
}

impl ProgramBuilder<'_> {
    fn build(&self, section: &Section) -> SectionProgram {
        let cfg = self.config;
        let w = self.windows;

        // Four-keyframe envelope: hidden -> rest plateau -> hidden.
        let envelope = |enter_from: Transform, exit_to: Transform| {
            Track::new(
                vec![
                    Keyframe { at: 0.0, transform: enter_from },
                    Keyframe { at: w.enter_end, transform: Transform::REST },
                    Keyframe { at: w.exit_start, transform: Transform::REST },
                    Keyframe { at: 1.0, transform: exit_to },
                ],
                cfg.ease,
            )
        };

        let text = envelope(
            Transform {
                opacity: 0.0,
                translate_y: cfg.text_offset,
                scale: cfg.text_scale,
                ..Transform::REST
            },
            Transform {
                opacity: 0.0,
                translate_y: -cfg.text_offset,
                scale: cfg.text_scale,
                ..Transform::REST
            },
        );

        let sign = section.alignment().panel_entry_sign();
        let panel = envelope(
            Transform {
                opacity: 0.0,
                translate_x: sign * cfg.panel_offset,
                scale: cfg.panel_scale,
                ..Transform::REST
            },
            Transform {
                opacity: 0.0,
                translate_x: -sign * cfg.panel_offset,
                scale: cfg.panel_scale,
                ..Transform::REST
            },
        );

        let item_enter = Transform {
            opacity: 0.0,
            translate_y: cfg.item_offset,
            ..Transform::REST
        };
        let item_exit = Transform {
            opacity: 0.0,
            translate_y: -cfg.item_offset,
            ..Transform::REST
        };
        let items = self.staggered(section.panel.stats.len(), item_enter, item_exit);

        let connector_hidden = Transform {
            scale_x: 0.0,
            ..Transform::REST
        };
        let connectors = self.staggered(section.panel.connectors, connector_hidden, connector_hidden);

        SectionProgram {
            text,
            panel,
            items,
            connectors,
        }
    }

    /// One track per element, each entering `i × stagger` later than the
    /// previous one and still resolving by the end of the window.
    fn staggered(&self, count: usize, enter_from: Transform, exit_to: Transform) -> Vec<Track> {
        let w = self.windows;
        (0..count)
            .map(|i| {
                let (enter_start, enter_stop) = stagger_slot(i, count, 0.0, w.enter_end, self.config.stagger);
                let (exit_begin, exit_stop) =
                    stagger_slot(i, count, w.exit_start, w.exit_len(), self.config.stagger);
                Track::new(
                    vec![
                        Keyframe { at: 0.0, transform: enter_from },
                        Keyframe { at: enter_start, transform: enter_from },
                        Keyframe { at: enter_stop, transform: Transform::REST },
                        Keyframe { at: exit_begin, transform: Transform::REST },
                        Keyframe { at: exit_stop, transform: exit_to },
                        Keyframe { at: 1.0, transform: exit_to },
                    ],
                    self.config.ease,
                )
            })
            .collect()
    }
}

/// Start and end of item `i`'s slot inside a window `[origin, origin + len]`.
///
/// The stagger is shrunk when `count` items would not fit while keeping at
/// least [`MIN_ITEM_WINDOW_SHARE`] of the window per item. The last item
/// always ends exactly at the window edge.
#[allow(clippy::cast_precision_loss)]
fn stagger_slot(i: usize, count: usize, origin: f64, len: f64, stagger: f64) -> (f64, f64) {
    if count <= 1 {
        return (origin, origin + len);
    }
    let gaps = (count - 1) as f64;
    let max_stagger = len * (1.0 - MIN_ITEM_WINDOW_SHARE) / gaps;
    let stagger = stagger.clamp(0.0, max_stagger);
    let duration = gaps.mul_add(-stagger, len);
    let start = (i as f64).mul_add(stagger, origin);
    let end = if i + 1 == count {
        origin + len
    } else {
        (start + duration).min(origin + len)
    };
    (start, end)
}

// ============================================================================
// PhaseTimeline
// ============================================================================

/// Per-section animation programs plus the shared phase windows.
#[derive(Debug, Clone)]
pub struct PhaseTimeline {
    windows: PhaseWindows,
    programs: Vec<SectionProgram>,
}

impl PhaseTimeline {
    /// Builds one program per registered section.
    #[must_use]
    pub fn new(config: &TimelineConfig, registry: &SectionRegistry) -> Self {
        let windows = PhaseWindows {
            enter_end: config.enter_end,
            exit_start: config.exit_start,
        };
        let builder = ProgramBuilder { config, windows };
        let programs = registry.iter().map(|s| builder.build(s)).collect();
        Self { windows, programs }
    }

    /// Phase windows in use.
    #[must_use]
    pub const fn windows(&self) -> PhaseWindows {
        self.windows
    }

    /// Number of section programs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether there are no programs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Phase state of every section for a mapped position.
    ///
    /// Exactly one section is active when the position is
    /// [`ScrollPosition::Active`]; before it everything is `After`, past it
    /// everything is `Before`.
    #[must_use]
    pub fn states(&self, position: &ScrollPosition) -> Vec<PhaseState> {
        (0..self.programs.len())
            .map(|section| self.state_of(section, position))
            .collect()
    }

    /// Phase state of one section for a mapped position.
    #[must_use]
    pub fn state_of(&self, section: usize, position: &ScrollPosition) -> PhaseState {
        match *position {
            ScrollPosition::PreHero => PhaseState {
                phase: Phase::Before,
                local_progress: 0.0,
            },
            ScrollPosition::Final => PhaseState {
                phase: Phase::After,
                local_progress: 1.0,
            },
            ScrollPosition::Active {
                section: active,
                local_progress,
            } => match section.cmp(&active) {
                std::cmp::Ordering::Less => PhaseState {
                    phase: Phase::After,
                    local_progress: 1.0,
                },
                std::cmp::Ordering::Equal => self.windows.classify(local_progress),
                std::cmp::Ordering::Greater => PhaseState {
                    phase: Phase::Before,
                    local_progress: 0.0,
                },
            },
        }
    }

    /// Sampled frame for the active section, if any.
    #[must_use]
    pub fn active_frame(&self, position: &ScrollPosition) -> Option<SectionFrame> {
        let section = position.active_section()?;
        self.frame(section, position)
    }

    /// Sampled frame for any section at a mapped position.
    ///
    /// Inactive sections sample their hidden endpoints (progress 0 before,
    /// 1 after).
    #[must_use]
    pub fn frame(&self, section: usize, position: &ScrollPosition) -> Option<SectionFrame> {
        let program = self.programs.get(section)?;
        Some(program.sample(section, self.state_of(section, position)))
    }
}
