//! Stage orchestrator
//!
//! Owns every per-mount component and routes host events through them:
//!
//! ```text
//! scroll offset ──▶ TriggerRegistry ──(channel)──▶ EffectBroadcaster
//!        │
//!        ├──▶ mapper ──▶ PinController ──▶ ScrollHost
//!        │
//!        └──▶ ScrubSmoother ──▶ mapper ──▶ PhaseTimeline ──▶ StageFrame
//! ```
//!
//! Everything is synchronous. Trigger callbacks only enqueue crossings; the
//! queue is drained before `on_scroll` returns, so no crossing outlives the
//! sample that produced it.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::schema::StageConfig;
use crate::observability::events::{EventEmitter, StageEvent};
use crate::observability::metrics;

use super::effect::{EffectBroadcaster, OverlayFrame};
use super::host::ScrollHost;
use super::mapper::{ScrollPosition, ScrollProgressMapper};
use super::pin::{PinChange, PinController};
use super::scrub::ScrubSmoother;
use super::section::SectionRegistry;
use super::snap::{SnapResolver, SnapTarget};
use super::span::ScrollSpan;
use super::timeline::{PhaseState, PhaseTimeline, SectionFrame};
use super::trigger::{BoundaryCrossing, TriggerCallbacks, TriggerRegistry, TriggerSpec};

// ============================================================================
// Output types
// ============================================================================

/// Everything a renderer needs for one sample.
#[derive(Debug, Clone, Serialize)]
pub struct StageFrame {
    /// Raw scroll offset
    pub offset: f64,
    /// Offset driving the animation (differs from `offset` while scrubbing)
    pub animated_offset: f64,
    /// Mapped position of `animated_offset`
    pub position: ScrollPosition,
    /// Phase of every section
    pub phases: Vec<PhaseState>,
    /// Sampled transforms of the active section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<SectionFrame>,
    /// Boundary crossings since the previous sample
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub crossings: Vec<BoundaryCrossing>,
    /// Boundaries whose overlay fired in this sample
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overlays_fired: Vec<usize>,
    /// Pin changes applied in this sample
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pin_changes: Vec<PinChange>,
    /// Currently pinned section
    pub pinned: Option<usize>,
    /// Translation compensating the pin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin_translation: Option<f64>,
    /// Overlay state
    pub overlay: OverlayFrame,
}

impl StageFrame {
    /// Active section index, if any.
    #[must_use]
    pub const fn active_section(&self) -> Option<usize> {
        self.position.active_section()
    }
}

/// Result of a mount.
#[derive(Debug, Clone, Serialize)]
pub struct MountSummary {
    /// Mount identifier
    pub mount_id: Uuid,
    /// Number of sections
    pub sections: usize,
    /// Number of boundary triggers registered
    pub triggers: usize,
    /// Sections skipped because their host target is missing
    pub skipped: Vec<usize>,
    /// Computed spans
    pub spans: Vec<ScrollSpan>,
    /// Section pinned at the initial offset
    pub pinned: Option<usize>,
}

// ============================================================================
// Mounted state
// ============================================================================

/// Everything derived at mount; dropped as a unit on unmount.
struct Mounted {
    id: Uuid,
    viewport: f64,
    registry: SectionRegistry,
    mapper: ScrollProgressMapper,
    timeline: PhaseTimeline,
    pins: PinController,
    triggers: TriggerRegistry,
    effects: EffectBroadcaster,
    snap: SnapResolver,
    scrub: ScrubSmoother,
    crossings: mpsc::UnboundedReceiver<BoundaryCrossing>,
    last_offset: f64,
    pending_viewport: Option<f64>,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Mounts a stage against a host and turns scroll events into frames.
pub struct Orchestrator<H: ScrollHost> {
    config: Arc<StageConfig>,
    host: H,
    events: Arc<EventEmitter>,
    mounted: Option<Mounted>,
}

impl<H: ScrollHost> std::fmt::Debug for Orchestrator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("stage", &self.config.stage.name)
            .field("mounted", &self.mounted.as_ref().map(|m| m.id))
            .finish_non_exhaustive()
    }
}

impl<H: ScrollHost> Orchestrator<H> {
    /// Creates an unmounted orchestrator.
    #[must_use]
    pub fn new(config: Arc<StageConfig>, host: H) -> Self {
        Self {
            config,
            host,
            events: Arc::new(EventEmitter::noop()),
            mounted: None,
        }
    }

    /// Routes structured events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    /// Stage configuration.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Whether the stage is mounted.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Identifier of the current mount.
    #[must_use]
    pub fn mount_id(&self) -> Option<Uuid> {
        self.mounted.as_ref().map(|m| m.id)
    }

    /// Spans in use (the last-known ones while a resize is unsettled).
    #[must_use]
    pub fn spans(&self) -> &[ScrollSpan] {
        self.mounted.as_ref().map_or(&[], |m| m.mapper.spans())
    }

    /// Number of live boundary triggers.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.triggers.len())
    }

    /// Whether a resize is waiting to settle.
    #[must_use]
    pub fn spans_stale(&self) -> bool {
        self.mounted.as_ref().is_some_and(|m| m.pins.is_stale())
    }

    /// Mounts the stage.
    ///
    /// Mounting while mounted unmounts first. Zero or one section mounts
    /// without any triggers.
    pub fn mount(&mut self, viewport_height: f64, initial_offset: f64) -> MountSummary {
        if self.mounted.is_some() {
            self.unmount();
        }

        let id = Uuid::new_v4();
        let registry = SectionRegistry::new(self.config.sections.clone());
        let spans = self
            .config
            .layout
            .span_layout()
            .compute(&registry.distance_overrides(), viewport_height);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut triggers = TriggerRegistry::new();
        let mut pinnable = Vec::new();
        let mut skipped = Vec::new();

        for section in registry.boundary_sections() {
            let index = section.index;
            if !self.host.has_target(index) {
                warn!(section = index, title = %section.title, "host target missing; section skipped");
                self.events.emit(StageEvent::TargetSkipped {
                    timestamp: Utc::now(),
                    section: index,
                });
                skipped.push(index);
                continue;
            }
            let Some(span) = spans.get(index) else {
                continue;
            };

            // The receiver lives in `Mounted` next to the registry, so sends
            // only fail after both are gone.
            let forward = tx.clone();
            let backward = tx.clone();
            let callbacks = TriggerCallbacks::new()
                .on_enter(move |crossing| {
                    forward.send(*crossing).ok();
                })
                .on_enter_back(move |crossing| {
                    backward.send(*crossing).ok();
                });
            triggers.register(
                TriggerSpec {
                    section: index,
                    start: span.start,
                    pinned: true,
                },
                callbacks,
            );
            pinnable.push(index);
        }
        drop(tx);

        triggers.observe(initial_offset);

        let mapper = ScrollProgressMapper::new(spans.clone());
        let mut pins = PinController::new(spans.clone(), pinnable);
        let initial = mapper.map(initial_offset);
        for change in pins.update(&initial, &mut self.host) {
            self.record_pin_change(&change);
        }
        let timeline = PhaseTimeline::new(&self.config.timeline, &registry);
        let snap = SnapResolver::new(self.config.snap.clone(), timeline.windows(), &spans);
        let mut scrub = ScrubSmoother::new(self.config.scrub);
        scrub.seed(initial_offset);

        let summary = MountSummary {
            mount_id: id,
            sections: registry.len(),
            triggers: triggers.len(),
            skipped,
            spans,
            pinned: pins.pinned(),
        };

        metrics::record_mount();
        metrics::set_triggers_registered(summary.triggers);
        info!(
            mount_id = %id,
            sections = summary.sections,
            triggers = summary.triggers,
            viewport = viewport_height,
            "stage mounted"
        );
        self.events.emit(StageEvent::Mounted {
            timestamp: Utc::now(),
            mount_id: id.to_string(),
            stage: self.config.stage.name.clone(),
            sections: summary.sections,
            triggers: summary.triggers,
            viewport: viewport_height,
        });

        self.mounted = Some(Mounted {
            id,
            viewport: viewport_height,
            registry,
            mapper,
            timeline,
            pins,
            triggers,
            effects: EffectBroadcaster::new(self.config.effects.clone()),
            snap,
            scrub,
            crossings: rx,
            last_offset: initial_offset,
            pending_viewport: None,
        });

        summary
    }

    /// Processes a scroll sample. Returns `None` when not mounted.
    pub fn on_scroll(&mut self, offset: f64, now: Instant) -> Option<StageFrame> {
        let mounted = self.mounted.as_mut()?;
        mounted.last_offset = offset;

        mounted.triggers.observe(offset);
        let mut crossings = Vec::new();
        let mut overlays_fired = Vec::new();
        while let Ok(crossing) = mounted.crossings.try_recv() {
            metrics::record_crossing(crossing.direction);
            self.events.emit(StageEvent::BoundaryCrossed {
                timestamp: Utc::now(),
                section: crossing.section,
                direction: crossing.direction,
            });
            if let Some(activation) = mounted.effects.notify_enter(crossing.section, now) {
                self.events.emit(StageEvent::OverlayFired {
                    timestamp: Utc::now(),
                    boundary: activation.boundary,
                });
                overlays_fired.push(activation.boundary);
            }
            crossings.push(crossing);
        }

        let raw_position = mounted.mapper.map(offset);
        let pin_changes = mounted.pins.update(&raw_position, &mut self.host);
        let animated_offset = mounted.scrub.update(offset, now);

        let frame = compose_frame(
            mounted,
            offset,
            animated_offset,
            now,
            crossings,
            overlays_fired,
            pin_changes,
        );
        for change in &frame.pin_changes {
            self.record_pin_change(change);
        }
        debug!(
            offset,
            active = ?frame.active_section(),
            crossings = frame.crossings.len(),
            "scroll sampled"
        );
        Some(frame)
    }

    /// Samples without a scroll change, advancing scrub smoothing and
    /// overlay curves. Returns `None` when not mounted.
    pub fn tick(&mut self, now: Instant) -> Option<StageFrame> {
        let mounted = self.mounted.as_mut()?;
        let offset = mounted.last_offset;
        let animated_offset = mounted.scrub.advance(now);
        Some(compose_frame(
            mounted,
            offset,
            animated_offset,
            now,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        ))
    }

    /// Records a viewport resize. Spans stay as they are until
    /// [`Self::on_resize_settled`].
    pub fn on_resize(&mut self, viewport_height: f64) {
        if let Some(mounted) = self.mounted.as_mut() {
            mounted.pending_viewport = Some(viewport_height);
            mounted.pins.mark_stale();
        }
    }

    /// Recomputes spans for the latest viewport and pushes them to the
    /// mapper, pin controller, triggers and snap resolver.
    ///
    /// Returns the new spans, or `None` when not mounted.
    pub fn on_resize_settled(&mut self) -> Option<Vec<ScrollSpan>> {
        let mounted = self.mounted.as_mut()?;
        let viewport = mounted.pending_viewport.take().unwrap_or(mounted.viewport);
        mounted.viewport = viewport;

        let spans = self
            .config
            .layout
            .span_layout()
            .compute(&mounted.registry.distance_overrides(), viewport);

        let moved = mounted
            .triggers
            .move_boundaries(spans.iter().map(|span| (span.section, span.start)));
        if moved > 0 {
            debug!(crossings = moved, "boundaries moved across the scroll offset");
        }
        mounted.mapper.replace_spans(spans.clone());
        mounted.pins.recompute(spans.clone(), &mut self.host);
        mounted.snap = SnapResolver::new(
            self.config.snap.clone(),
            mounted.timeline.windows(),
            &spans,
        );

        let total_length = spans.last().map_or(0.0, |s| s.end);
        metrics::record_spans_recomputed();
        info!(viewport, total_length, "spans recomputed");
        self.events.emit(StageEvent::SpansRecomputed {
            timestamp: Utc::now(),
            viewport,
            total_length,
        });
        Some(spans)
    }

    /// Nearest snap target for `offset`, when snapping is enabled.
    #[must_use]
    pub fn snap_target(&self, offset: f64) -> Option<SnapTarget> {
        self.mounted.as_ref()?.snap.resolve(offset)
    }

    /// Tears everything down. Pending crossings are discarded.
    ///
    /// Returns `false` when there was nothing to unmount.
    pub fn unmount(&mut self) -> bool {
        let Some(mut mounted) = self.mounted.take() else {
            return false;
        };

        let removed = mounted.triggers.teardown_all();
        if let Some(change) = mounted.pins.release_all(&mut self.host) {
            self.record_pin_change(&change);
        }
        mounted.effects.clear();
        metrics::set_triggers_registered(0);
        info!(mount_id = %mounted.id, triggers_removed = removed, "stage unmounted");
        self.events.emit(StageEvent::Unmounted {
            timestamp: Utc::now(),
            mount_id: mounted.id.to_string(),
            triggers_removed: removed,
        });
        true
    }

    fn record_pin_change(&self, change: &PinChange) {
        metrics::record_pin_change(change);
        let event = match *change {
            PinChange::Acquired {
                section,
                local_progress,
            } => {
                info!(section, local_progress, "pin acquired");
                StageEvent::PinAcquired {
                    timestamp: Utc::now(),
                    section,
                    local_progress,
                }
            }
            PinChange::Released { section, edge } => {
                info!(section, ?edge, "pin released");
                StageEvent::PinReleased {
                    timestamp: Utc::now(),
                    section,
                    edge,
                }
            }
        };
        self.events.emit(event);
    }
}

impl<H: ScrollHost> Drop for Orchestrator<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn compose_frame(
    mounted: &mut Mounted,
    offset: f64,
    animated_offset: f64,
    now: Instant,
    crossings: Vec<BoundaryCrossing>,
    overlays_fired: Vec<usize>,
    pin_changes: Vec<PinChange>,
) -> StageFrame {
    let position = mounted.mapper.map(animated_offset);
    metrics::set_active_section(active_gauge(&position, mounted.registry.len()));

    StageFrame {
        offset,
        animated_offset,
        position,
        phases: mounted.timeline.states(&position),
        active: mounted.timeline.active_frame(&position),
        crossings,
        overlays_fired,
        pin_changes,
        pinned: mounted.pins.pinned(),
        pin_translation: mounted.pins.pin_translation(offset),
        overlay: mounted.effects.sample(now),
    }
}

#[allow(clippy::cast_possible_wrap)]
fn active_gauge(position: &ScrollPosition, sections: usize) -> i64 {
    match *position {
        ScrollPosition::PreHero => -1,
        ScrollPosition::Active { section, .. } => section as i64,
        ScrollPosition::Final => sections as i64,
    }
}
