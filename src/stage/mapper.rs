//! Scroll progress mapping
//!
//! A pure function from a document scroll offset to the active section and
//! its local progress. Out-of-range offsets are states, not faults.

use serde::Serialize;

use super::span::ScrollSpan;

/// Where a scroll offset lands relative to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollPosition {
    /// Before the first span; no section is active
    PreHero,
    /// Inside a section's span
    Active {
        /// Active section index
        section: usize,
        /// Position within the span, in `[0, 1]`
        local_progress: f64,
    },
    /// At or past the end of the last span
    Final,
}

impl ScrollPosition {
    /// Active section index, if any.
    #[must_use]
    pub const fn active_section(&self) -> Option<usize> {
        match self {
            Self::Active { section, .. } => Some(*section),
            Self::PreHero | Self::Final => None,
        }
    }

    /// Local progress of the active section, if any.
    #[must_use]
    pub const fn local_progress(&self) -> Option<f64> {
        match self {
            Self::Active { local_progress, .. } => Some(*local_progress),
            Self::PreHero | Self::Final => None,
        }
    }
}

/// Maps offsets onto an ordered list of contiguous spans.
#[derive(Debug, Clone, Default)]
pub struct ScrollProgressMapper {
    spans: Vec<ScrollSpan>,
}

impl ScrollProgressMapper {
    /// Creates a mapper over `spans`, which must be ordered and contiguous.
    #[must_use]
    pub const fn new(spans: Vec<ScrollSpan>) -> Self {
        Self { spans }
    }

    /// Current spans.
    #[must_use]
    pub fn spans(&self) -> &[ScrollSpan] {
        &self.spans
    }

    /// Replaces the spans after a layout change.
    pub fn replace_spans(&mut self, spans: Vec<ScrollSpan>) {
        self.spans = spans;
    }

    /// Span for a section.
    #[must_use]
    pub fn span(&self, section: usize) -> Option<&ScrollSpan> {
        self.spans.get(section)
    }

    /// Maps an offset.
    ///
    /// `NaN` and `-inf` map to [`ScrollPosition::PreHero`], `+inf` to
    /// [`ScrollPosition::Final`].
    #[must_use]
    pub fn map(&self, offset: f64) -> ScrollPosition {
        let (Some(first), Some(last)) = (self.spans.first(), self.spans.last()) else {
            return ScrollPosition::PreHero;
        };

        if offset.is_nan() || offset < first.start {
            return ScrollPosition::PreHero;
        }
        if offset >= last.end {
            return ScrollPosition::Final;
        }

        // First span whose end lies beyond the offset; zero-length spans are
        // skipped because their end equals their start.
        let idx = self.spans.partition_point(|span| span.end <= offset);
        self.spans.get(idx).map_or(ScrollPosition::Final, |span| {
            ScrollPosition::Active {
                section: span.section,
                local_progress: span.local_progress(offset),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::span::SpanLayout;

    fn five_sections() -> ScrollProgressMapper {
        ScrollProgressMapper::new(SpanLayout::default().uniform(5, 900.0))
    }

    #[test]
    fn midpoint_of_second_span() {
        let mapper = five_sections();
        match mapper.map(2400.0) {
            ScrollPosition::Active {
                section,
                local_progress,
            } => {
                assert_eq!(section, 1);
                assert!((local_progress - 0.5).abs() < 1e-12);
            }
            other => panic!("expected active section, got {other:?}"),
        }
    }

    #[test]
    fn ten_percent_into_second_span() {
        let mapper = five_sections();
        let position = mapper.map(1760.0);
        assert_eq!(position.active_section(), Some(1));
        assert!((position.local_progress().unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn span_boundary_belongs_to_next_section() {
        let mapper = five_sections();
        let position = mapper.map(1600.0);
        assert_eq!(position.active_section(), Some(1));
        assert!((position.local_progress().unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn before_first_span_is_pre_hero() {
        let layout = SpanLayout {
            lead_in: 500.0,
            ..SpanLayout::default()
        };
        let mapper = ScrollProgressMapper::new(layout.uniform(3, 900.0));
        assert_eq!(mapper.map(100.0), ScrollPosition::PreHero);
        assert_eq!(mapper.map(-1.0), ScrollPosition::PreHero);
        assert_eq!(mapper.map(500.0).active_section(), Some(0));
    }

    #[test]
    fn past_last_span_is_final() {
        let mapper = five_sections();
        assert_eq!(mapper.map(8000.0), ScrollPosition::Final);
        assert_eq!(mapper.map(1e12), ScrollPosition::Final);
    }

    #[test]
    fn non_finite_offsets() {
        let mapper = five_sections();
        assert_eq!(mapper.map(f64::NAN), ScrollPosition::PreHero);
        assert_eq!(mapper.map(f64::NEG_INFINITY), ScrollPosition::PreHero);
        assert_eq!(mapper.map(f64::INFINITY), ScrollPosition::Final);
    }

    #[test]
    fn empty_mapper_is_always_pre_hero() {
        let mapper = ScrollProgressMapper::default();
        assert_eq!(mapper.map(0.0), ScrollPosition::PreHero);
        assert_eq!(mapper.map(1e9), ScrollPosition::PreHero);
    }

    #[test]
    fn zero_length_span_is_skipped() {
        let spans = SpanLayout::default().compute(&[None, Some(0.0), None], 900.0);
        let mapper = ScrollProgressMapper::new(spans);
        assert_eq!(mapper.map(1600.0).active_section(), Some(2));
    }
}
