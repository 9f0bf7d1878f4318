//! Scroll stage core
//!
//! Maps scroll offsets to sections, animates each section through its
//! enter/hold/exit phases, pins the viewport during a section's dwell and
//! fires debounced overlays on boundary crossings.

pub mod ease;
pub mod effect;
pub mod host;
pub mod mapper;
pub mod orchestrator;
pub mod pin;
pub mod scrub;
pub mod section;
pub mod snap;
pub mod span;
pub mod timeline;
pub mod trigger;

pub use effect::{EffectBroadcaster, OverlayActivation, OverlayFrame};
pub use host::{HeadlessHost, ScrollHost};
pub use mapper::{ScrollPosition, ScrollProgressMapper};
pub use orchestrator::{MountSummary, Orchestrator, StageFrame};
pub use pin::{PinChange, PinController, PinEdge};
pub use section::{Alignment, Section, SectionRegistry};
pub use span::{ScrollSpan, SpanLayout};
pub use timeline::{Phase, PhaseState, PhaseTimeline, SectionFrame, Transform};
pub use trigger::{BoundaryCrossing, Direction, TriggerHandle, TriggerRegistry};
