//! Pin controller
//!
//! Decides which section, if any, holds the viewport pin. The controller
//! only consumes mapped positions; it never maps offsets itself.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use super::host::ScrollHost;
use super::mapper::ScrollPosition;
use super::span::ScrollSpan;

/// Which end of its span a pin was released from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinEdge {
    /// Released scrolling backward past the span start
    Start,
    /// Released scrolling forward past the span end
    End,
}

/// A change in pin ownership.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PinChange {
    /// A section acquired the pin
    Acquired {
        /// Pinned section
        section: usize,
        /// Local progress at acquisition
        local_progress: f64,
    },
    /// A section released the pin
    Released {
        /// Released section
        section: usize,
        /// Edge the scroll left through
        edge: PinEdge,
    },
}

/// Tracks the single pinned section.
#[derive(Debug, Clone, Default)]
pub struct PinController {
    spans: Vec<ScrollSpan>,
    pinnable: BTreeSet<usize>,
    pinned: Option<usize>,
    stale: bool,
}

impl PinController {
    /// Creates a controller; only sections in `pinnable` are ever pinned.
    #[must_use]
    pub fn new(spans: Vec<ScrollSpan>, pinnable: impl IntoIterator<Item = usize>) -> Self {
        Self {
            spans,
            pinnable: pinnable.into_iter().collect(),
            pinned: None,
            stale: false,
        }
    }

    /// Currently pinned section.
    #[must_use]
    pub const fn pinned(&self) -> Option<usize> {
        self.pinned
    }

    /// Whether `section` can be pinned.
    #[must_use]
    pub fn is_pinnable(&self, section: usize) -> bool {
        self.pinnable.contains(&section)
    }

    /// Whether spans are waiting for a resize to settle.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Applies a mapped position, pinning or releasing through `host`.
    ///
    /// Returns the changes in the order they were applied: a release always
    /// precedes the acquisition that replaced it.
    pub fn update<H: ScrollHost + ?Sized>(
        &mut self,
        position: &ScrollPosition,
        host: &mut H,
    ) -> Vec<PinChange> {
        let mut changes = Vec::new();

        let target = match *position {
            ScrollPosition::Active {
                section,
                local_progress,
            } if self.is_pinnable(section) => Some((section, local_progress)),
            _ => None,
        };

        if let Some(current) = self.pinned {
            if target.map(|(section, _)| section) == Some(current) {
                return changes;
            }
            let edge = release_edge(current, position);
            host.unpin(current);
            self.pinned = None;
            debug!(section = current, ?edge, "pin released");
            changes.push(PinChange::Released {
                section: current,
                edge,
            });
        }

        if let Some((section, local_progress)) = target {
            let Some(span) = self.spans.get(section) else {
                warn!(section, "no span for pinnable section");
                return changes;
            };
            host.pin(section, span);
            self.pinned = Some(section);
            debug!(section, local_progress, "pin acquired");
            changes.push(PinChange::Acquired {
                section,
                local_progress,
            });
        }

        changes
    }

    /// Translation the host applies to keep the pinned section in place.
    #[must_use]
    pub fn pin_translation(&self, offset: f64) -> Option<f64> {
        let span = self.spans.get(self.pinned?)?;
        Some((offset - span.start).clamp(0.0, span.len().max(0.0)))
    }

    /// Flags the spans as out of date after a viewport resize.
    pub fn mark_stale(&mut self) {
        if !self.stale {
            warn!("viewport resized; pin spans stale until resize settles");
        }
        self.stale = true;
    }

    /// Installs freshly computed spans and re-pins the pinned section on
    /// `host` against its new span.
    pub fn recompute<H: ScrollHost + ?Sized>(&mut self, spans: Vec<ScrollSpan>, host: &mut H) {
        self.spans = spans;
        self.stale = false;

        let Some(section) = self.pinned else {
            return;
        };
        if let Some(span) = self.spans.get(section) {
            host.pin(section, span);
            debug!(section, start = span.start, end = span.end, "pin span refreshed");
        } else {
            host.unpin(section);
            self.pinned = None;
            warn!(section, "pinned section lost its span; pin released");
        }
    }

    /// Releases any pin without a position, e.g. on unmount.
    pub fn release_all<H: ScrollHost + ?Sized>(&mut self, host: &mut H) -> Option<PinChange> {
        let section = self.pinned.take()?;
        host.unpin(section);
        Some(PinChange::Released {
            section,
            edge: PinEdge::Start,
        })
    }
}

fn release_edge(pinned: usize, position: &ScrollPosition) -> PinEdge {
    match *position {
        ScrollPosition::PreHero => PinEdge::Start,
        ScrollPosition::Final => PinEdge::End,
        ScrollPosition::Active { section, .. } => {
            if section > pinned {
                PinEdge::End
            } else {
                PinEdge::Start
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::host::{HeadlessHost, HostCall};
    use crate::stage::mapper::ScrollProgressMapper;
    use crate::stage::span::SpanLayout;

    fn setup() -> (PinController, ScrollProgressMapper, HeadlessHost) {
        let spans = SpanLayout::default().uniform(4, 900.0);
        let pins = PinController::new(spans.clone(), [1, 2, 3]);
        (pins, ScrollProgressMapper::new(spans), HeadlessHost::new())
    }

    #[test]
    fn hero_is_never_pinned() {
        let (mut pins, mapper, mut host) = setup();
        let changes = pins.update(&mapper.map(800.0), &mut host);
        assert!(changes.is_empty());
        assert_eq!(pins.pinned(), None);
    }

    #[test]
    fn forward_scroll_hands_pin_over() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(2000.0), &mut host);
        assert_eq!(pins.pinned(), Some(1));

        let changes = pins.update(&mapper.map(3300.0), &mut host);
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes[0],
            PinChange::Released {
                section: 1,
                edge: PinEdge::End
            }
        );
        assert!(matches!(changes[1], PinChange::Acquired { section: 2, .. }));
        assert_eq!(host.pinned(), Some(2));
    }

    #[test]
    fn backward_release_uses_start_edge() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(2000.0), &mut host);
        let changes = pins.update(&mapper.map(100.0), &mut host);
        assert_eq!(
            changes,
            vec![PinChange::Released {
                section: 1,
                edge: PinEdge::Start
            }]
        );
        assert_eq!(host.pinned(), None);
    }

    #[test]
    fn reentry_restores_progress() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(5000.0), &mut host);
        pins.update(&mapper.map(7000.0), &mut host);

        let changes = pins.update(&mapper.map(5600.0), &mut host);
        let acquired = changes
            .iter()
            .find_map(|c| match c {
                PinChange::Acquired {
                    section,
                    local_progress,
                } => Some((*section, *local_progress)),
                PinChange::Released { .. } => None,
            })
            .unwrap();
        assert_eq!(acquired.0, 3);
        assert!((acquired.1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn same_section_is_not_repinned() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(2000.0), &mut host);
        assert!(pins.update(&mapper.map(2500.0), &mut host).is_empty());
        assert_eq!(host.pin_count(), 1);
    }

    #[test]
    fn final_releases_with_end_edge() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(6000.0), &mut host);
        let changes = pins.update(&mapper.map(1e6), &mut host);
        assert_eq!(
            changes,
            vec![PinChange::Released {
                section: 3,
                edge: PinEdge::End
            }]
        );
    }

    #[test]
    fn translation_tracks_offset_inside_span() {
        let (mut pins, mapper, mut host) = setup();
        assert!(pins.pin_translation(2000.0).is_none());
        pins.update(&mapper.map(2000.0), &mut host);
        assert!((pins.pin_translation(2000.0).unwrap() - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stale_spans_kept_until_recompute() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(2000.0), &mut host);
        pins.mark_stale();
        assert!(pins.is_stale());
        assert!((pins.pin_translation(2000.0).unwrap() - 400.0).abs() < f64::EPSILON);

        let spans = SpanLayout::default().compute(&[Some(800.0), None, None, None], 900.0);
        pins.recompute(spans.clone(), &mut host);
        assert!(!pins.is_stale());
        assert!((pins.pin_translation(2000.0).unwrap() - 1200.0).abs() < f64::EPSILON);
        assert_eq!(
            host.calls().last(),
            Some(&HostCall::Pin {
                section: 1,
                span: spans[1],
            })
        );
    }

    #[test]
    fn recompute_without_pin_leaves_host_alone() {
        let (mut pins, _, mut host) = setup();
        pins.recompute(SpanLayout::default().uniform(4, 600.0), &mut host);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn release_all_unpins_host() {
        let (mut pins, mapper, mut host) = setup();
        pins.update(&mapper.map(2000.0), &mut host);
        assert!(pins.release_all(&mut host).is_some());
        assert!(pins.release_all(&mut host).is_none());
        assert!(matches!(host.calls().last(), Some(HostCall::Unpin { section: 1 })));
    }
}
