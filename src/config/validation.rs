//! Configuration validation
//!
//! Semantic checks on a deserialized [`StageConfig`]. Validation collects
//! every issue instead of stopping at the first one.

use crate::config::loader::ConfigLimits;
use crate::config::schema::{EffectConfig, LayoutConfig, SnapConfig, StageConfig, TimelineConfig};
use crate::error::{Severity, ValidationIssue};
use crate::stage::section::Section;

// ============================================================================
// Public API
// ============================================================================

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &StageConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        if config.stage.name.trim().is_empty() {
            self.add_error("stage.name", "Stage name is required and cannot be empty");
        }

        self.validate_layout(&config.layout);
        self.validate_timeline(&config.timeline);
        self.validate_effects(&config.effects);
        self.validate_snap(&config.snap);
        self.validate_sections(config, limits);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Tunables
    // ========================================================================

    fn validate_layout(&mut self, layout: &LayoutConfig) {
        if layout.span.is_some() && layout.span_viewports.is_some() {
            self.add_error(
                "layout",
                "'span' and 'span_viewports' are mutually exclusive",
            );
        }
        if let Some(span) = layout.span
            && !(span.is_finite() && span > 0.0)
        {
            self.add_error("layout.span", "Span must be a positive number of scroll units");
        }
        if let Some(multiple) = layout.span_viewports
            && !(multiple.is_finite() && multiple > 0.0)
        {
            self.add_error(
                "layout.span_viewports",
                "Viewport multiple must be positive",
            );
        }
        if !(layout.lead_in.is_finite() && layout.lead_in >= 0.0) {
            self.add_error("layout.lead_in", "Lead-in cannot be negative");
        }
    }

    fn validate_timeline(&mut self, timeline: &TimelineConfig) {
        let enter_end = timeline.enter_end;
        let exit_start = timeline.exit_start;
        let ordered = enter_end > 0.0 && enter_end <= exit_start && exit_start < 1.0;
        if !ordered {
            self.add_error(
                "timeline",
                &format!(
                    "Phase windows must satisfy 0 < enter_end <= exit_start < 1 \
                     (got enter_end {enter_end}, exit_start {exit_start})"
                ),
            );
        }
        if !(timeline.stagger.is_finite() && timeline.stagger >= 0.0) {
            self.add_error("timeline.stagger", "Stagger cannot be negative");
        }
        for (field, scale) in [
            ("timeline.text_scale", timeline.text_scale),
            ("timeline.panel_scale", timeline.panel_scale),
        ] {
            if !(scale.is_finite() && scale > 0.0) {
                self.add_error(field, "Scale must be positive");
            }
        }
        for (field, offset) in [
            ("timeline.text_offset", timeline.text_offset),
            ("timeline.panel_offset", timeline.panel_offset),
            ("timeline.item_offset", timeline.item_offset),
        ] {
            if !offset.is_finite() {
                self.add_error(field, "Offset must be a finite number");
            }
        }
    }

    fn validate_effects(&mut self, effects: &EffectConfig) {
        if effects.cooldown.is_zero() {
            self.add_warning(
                "effects.cooldown",
                "Zero cooldown disables overlay debouncing",
            );
        }
        if !(0.0..=1.0).contains(&effects.flash.peak) {
            self.add_error("effects.flash.peak", "Flash peak must be within [0, 1]");
        }
        if effects.sweep.duration.is_zero() {
            self.add_error("effects.sweep.duration", "Sweep duration must be non-zero");
        }
    }

    fn validate_snap(&mut self, snap: &SnapConfig) {
        if snap.min_duration > snap.max_duration {
            self.add_error(
                "snap",
                "snap.min_duration cannot exceed snap.max_duration",
            );
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_sections(&mut self, config: &StageConfig, limits: &ConfigLimits) {
        let sections = &config.sections;
        match sections.len() {
            0 => self.add_warning(
                "sections",
                "No sections defined; the stage mounts without triggers",
            ),
            1 => self.add_warning(
                "sections",
                "Only the hero section is defined; no boundaries will fire",
            ),
            n if n > limits.max_sections => self.add_error(
                "sections",
                &format!("Too many sections ({n}, limit {})", limits.max_sections),
            ),
            _ => {}
        }

        let max_stats = sections.iter().map(|s| s.panel.stats.len()).max().unwrap_or(0);
        if max_stats > 1 && timeline_stagger_overflows(&config.timeline, max_stats) {
            self.add_warning(
                "timeline.stagger",
                "Stagger does not fit the enter window for the largest panel; it will be shrunk",
            );
        }

        for (position, section) in sections.iter().enumerate() {
            self.validate_section(position, section, limits);
        }
    }

    fn validate_section(&mut self, position: usize, section: &Section, limits: &ConfigLimits) {
        let path = format!("sections[{position}]");

        if section.title.trim().is_empty() {
            self.add_error(&format!("{path}.title"), "Section title cannot be empty");
        }
        if section.index != 0 && section.index != position {
            self.add_warning(
                &format!("{path}.index"),
                &format!(
                    "Section index {} disagrees with list position {position}; list order wins",
                    section.index
                ),
            );
        }
        if section.accent_color.rgb().is_none() {
            self.add_warning(
                &format!("{path}.accent_color"),
                &format!("'{}' is not a #rgb or #rrggbb color", section.accent_color),
            );
        }
        for (i, cta) in section.call_to_actions.iter().enumerate() {
            if cta.text.trim().is_empty() || cta.href.trim().is_empty() {
                self.add_warning(
                    &format!("{path}.call_to_actions[{i}]"),
                    "Call to action has an empty text or href",
                );
            }
        }
        if section.panel.stats.len() > limits.max_panel_items {
            self.add_error(
                &format!("{path}.panel.stats"),
                &format!(
                    "Too many stat items ({}, limit {})",
                    section.panel.stats.len(),
                    limits.max_panel_items
                ),
            );
        }
        if section.panel.connectors > limits.max_panel_items {
            self.add_error(
                &format!("{path}.panel.connectors"),
                &format!(
                    "Too many connectors ({}, limit {})",
                    section.panel.connectors, limits.max_panel_items
                ),
            );
        }
        if let Some(distance) = section.scroll_distance {
            if !(distance.is_finite() && distance >= 0.0) {
                self.add_error(
                    &format!("{path}.scroll_distance"),
                    "Scroll distance must be a non-negative number",
                );
            } else if distance == 0.0 {
                self.add_warning(
                    &format!("{path}.scroll_distance"),
                    "Zero scroll distance; the section is never active",
                );
            }
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Whether `items` staggered items leave less than half the enter window
/// to each item.
#[allow(clippy::cast_precision_loss)]
fn timeline_stagger_overflows(timeline: &TimelineConfig, items: usize) -> bool {
    let gaps = (items - 1) as f64;
    timeline.stagger * gaps > timeline.enter_end * 0.5
}
