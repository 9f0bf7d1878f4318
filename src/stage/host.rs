//! Scroll host abstraction
//!
//! The host is whatever owns the real document: it knows which section
//! elements exist and applies pin compensation. The orchestrator never
//! touches rendering directly.

use std::collections::HashSet;

use super::span::ScrollSpan;

/// Document-side collaborator of the orchestrator.
pub trait ScrollHost {
    /// Whether the element for `section` exists.
    fn has_target(&self, section: usize) -> bool;

    /// Pins `section` to the viewport for the duration of `span`.
    fn pin(&mut self, section: usize, span: &ScrollSpan);

    /// Releases the pin on `section`.
    fn unpin(&mut self, section: usize);
}

/// One recorded host call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCall {
    /// `pin(section, span)`
    Pin {
        /// Pinned section
        section: usize,
        /// Span at the time of pinning
        span: ScrollSpan,
    },
    /// `unpin(section)`
    Unpin {
        /// Released section
        section: usize,
    },
}

/// In-memory host for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    missing: HashSet<usize>,
    pinned: Option<usize>,
    calls: Vec<HostCall>,
}

impl HeadlessHost {
    /// Host where every section target exists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Host where the listed section targets are absent.
    #[must_use]
    pub fn with_missing(missing: impl IntoIterator<Item = usize>) -> Self {
        Self {
            missing: missing.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Currently pinned section.
    #[must_use]
    pub const fn pinned(&self) -> Option<usize> {
        self.pinned
    }

    /// Every pin/unpin call received, in order.
    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Number of `pin` calls received.
    #[must_use]
    pub fn pin_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Pin { .. }))
            .count()
    }
}

impl ScrollHost for HeadlessHost {
    fn has_target(&self, section: usize) -> bool {
        !self.missing.contains(&section)
    }

    fn pin(&mut self, section: usize, span: &ScrollSpan) {
        self.pinned = Some(section);
        self.calls.push(HostCall::Pin {
            section,
            span: *span,
        });
    }

    fn unpin(&mut self, section: usize) {
        if self.pinned == Some(section) {
            self.pinned = None;
        }
        self.calls.push(HostCall::Unpin { section });
    }
}
