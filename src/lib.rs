//! `scrollstage` - Scroll-driven section animation orchestrator
//!
//! Maps a document scroll offset onto an ordered list of content sections,
//! drives each section through enter/hold/exit phases, pins the viewport
//! while a section dwells and fires debounced transition overlays when a
//! section boundary is crossed.

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod simulation;
pub mod stage;
