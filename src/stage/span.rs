//! Scroll spans
//!
//! Each section owns a contiguous, half-open `[start, end)` range of
//! document scroll offsets. Spans are laid out back to back in section order
//! starting at the stage's lead-in.

use serde::Serialize;

/// Default per-section scroll distance in document units.
pub const DEFAULT_SPAN_DISTANCE: f64 = 1600.0;

/// The scroll range owned by one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollSpan {
    /// Section index
    pub section: usize,
    /// First offset inside the span
    pub start: f64,
    /// First offset past the span
    pub end: f64,
}

impl ScrollSpan {
    /// Span length in scroll units.
    #[must_use]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the span has no length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Whether `offset` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, offset: f64) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Linear position of `offset` inside the span, clamped to `[0, 1]`.
    #[must_use]
    pub fn local_progress(&self, offset: f64) -> f64 {
        if self.is_empty() {
            return if offset >= self.start { 1.0 } else { 0.0 };
        }
        ((offset - self.start) / self.len()).clamp(0.0, 1.0)
    }

    /// Offset at a given local progress.
    #[must_use]
    pub fn offset_at(&self, local_progress: f64) -> f64 {
        self.len().mul_add(local_progress.clamp(0.0, 1.0), self.start)
    }
}

/// How long each section's span is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpanDistance {
    /// Fixed number of scroll units per section
    Fixed(f64),
    /// Multiple of the viewport height per section
    Viewports(f64),
}

impl Default for SpanDistance {
    fn default() -> Self {
        Self::Fixed(DEFAULT_SPAN_DISTANCE)
    }
}

impl SpanDistance {
    /// Resolves the distance against the current viewport height.
    #[must_use]
    pub fn resolve(self, viewport_height: f64) -> f64 {
        match self {
            Self::Fixed(units) => units,
            Self::Viewports(multiple) => multiple * viewport_height.max(0.0),
        }
    }
}

/// Computes spans for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpanLayout {
    /// Stage-wide per-section distance
    pub distance: SpanDistance,
    /// Scroll units before the first span (the pre-hero zone)
    pub lead_in: f64,
}

impl SpanLayout {
    /// Lays out one span per section.
    ///
    /// `overrides[i]`, when present, replaces the stage-wide distance for
    /// section `i`. Negative or non-finite distances collapse to zero length
    /// so the spans stay contiguous and ordered.
    #[must_use]
    pub fn compute(&self, overrides: &[Option<f64>], viewport_height: f64) -> Vec<ScrollSpan> {
        let default_distance = self.distance.resolve(viewport_height);
        let mut cursor = self.lead_in.max(0.0);

        overrides
            .iter()
            .enumerate()
            .map(|(section, distance)| {
                let distance = distance.unwrap_or(default_distance);
                let distance = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
                let span = ScrollSpan {
                    section,
                    start: cursor,
                    end: cursor + distance,
                };
                cursor = span.end;
                span
            })
            .collect()
    }

    /// Convenience for `count` sections without overrides.
    #[must_use]
    pub fn uniform(&self, count: usize, viewport_height: f64) -> Vec<ScrollSpan> {
        self.compute(&vec![None; count], viewport_height)
    }
}
