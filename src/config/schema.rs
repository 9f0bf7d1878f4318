//! Configuration schema types
//!
//! A stage file describes the section list plus the tunables for span
//! layout, phase windows, overlay effects, snapping and scrub smoothing.
//! Durations are humantime strings (`900ms`, `1s 500ms`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::stage::ease::Ease;
use crate::stage::section::Section;
use crate::stage::span::{DEFAULT_SPAN_DISTANCE, SpanDistance, SpanLayout};

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root configuration for a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StageConfig {
    /// Stage metadata (required)
    pub stage: StageMetadata,

    /// Span layout
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Phase windows and element offsets
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Overlay effects and their debounce
    #[serde(default)]
    pub effects: EffectConfig,

    /// Snap-to-section behaviour
    #[serde(default)]
    pub snap: SnapConfig,

    /// Lag between raw scroll and animation progress
    #[serde(
        default,
        with = "option_duration_str",
        skip_serializing_if = "Option::is_none"
    )]
    pub scrub: Option<Duration>,

    /// Ordered content sections; the first is the hero
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl StageConfig {
    /// Minimal configuration around a section list, everything else default.
    #[must_use]
    pub fn with_sections(name: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            stage: StageMetadata {
                name: name.into(),
                description: None,
            },
            layout: LayoutConfig::default(),
            timeline: TimelineConfig::default(),
            effects: EffectConfig::default(),
            snap: SnapConfig::default(),
            scrub: None,
            sections,
        }
    }
}

/// Stage identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetadata {
    /// Stage name (required)
    pub name: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// Layout
// ============================================================================

/// Span layout configuration.
///
/// `span` and `span_viewports` are mutually exclusive; with neither set each
/// section spans [`DEFAULT_SPAN_DISTANCE`] units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Fixed scroll distance per section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<f64>,

    /// Scroll distance per section as a multiple of the viewport height
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_viewports: Option<f64>,

    /// Scroll units before the first span
    #[serde(default)]
    pub lead_in: f64,
}

impl LayoutConfig {
    /// Builds the span layout. A fixed `span` wins if both are present;
    /// validation rejects that combination before it gets here.
    #[must_use]
    pub fn span_layout(&self) -> SpanLayout {
        let distance = match (self.span, self.span_viewports) {
            (Some(units), _) => SpanDistance::Fixed(units),
            (None, Some(multiple)) => SpanDistance::Viewports(multiple),
            (None, None) => SpanDistance::Fixed(DEFAULT_SPAN_DISTANCE),
        };
        SpanLayout {
            distance,
            lead_in: self.lead_in,
        }
    }
}

// ============================================================================
// Timeline
// ============================================================================

/// Phase windows and element offsets for every section timeline.
///
/// Windows are expressed in local progress: `[0, enter_end)` enters,
/// `[enter_end, exit_start]` holds, `(exit_start, 1]` exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// End of the enter window
    pub enter_end: f64,
    /// Start of the exit window
    pub exit_start: f64,
    /// Delay between consecutive panel items, in local progress
    pub stagger: f64,
    /// Easing inside each keyframe segment
    pub ease: Ease,
    /// Vertical travel of the text block
    pub text_offset: f64,
    /// Text scale when hidden
    pub text_scale: f64,
    /// Horizontal travel of the panel
    pub panel_offset: f64,
    /// Panel scale when hidden
    pub panel_scale: f64,
    /// Vertical travel of each panel item
    pub item_offset: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            enter_end: 0.20,
            exit_start: 0.80,
            stagger: 0.03,
            ease: Ease::Linear,
            text_offset: 60.0,
            text_scale: 0.95,
            panel_offset: 80.0,
            panel_scale: 0.92,
            item_offset: 20.0,
        }
    }
}

// ============================================================================
// Effects
// ============================================================================

/// Overlay effect configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Minimum time between two overlays for the same boundary
    #[serde(with = "duration_str")]
    pub cooldown: Duration,
    /// Full-viewport tint pulse
    pub flash: FlashConfig,
    /// Horizontal scanner line
    pub sweep: SweepConfig,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(900),
            flash: FlashConfig::default(),
            sweep: SweepConfig::default(),
        }
    }
}

/// Flash pulse curve: linear rise to `peak`, then linear decay to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashConfig {
    /// Peak tint intensity in `[0, 1]`
    pub peak: f64,
    /// Time to reach the peak
    #[serde(with = "duration_str")]
    pub rise: Duration,
    /// Time to fade back to zero
    #[serde(with = "duration_str")]
    pub decay: Duration,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            peak: 0.35,
            rise: Duration::from_millis(100),
            decay: Duration::from_millis(500),
        }
    }
}

/// Sweep line curve: waits `delay`, then travels the viewport in `duration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Delay before the line starts moving
    #[serde(with = "duration_str")]
    pub delay: Duration,
    /// Travel time across the viewport
    #[serde(with = "duration_str")]
    pub duration: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(50),
            duration: Duration::from_millis(800),
        }
    }
}

// ============================================================================
// Snap
// ============================================================================

/// Snap-to-section configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Whether snapping is active
    pub enabled: bool,
    /// Shortest snap animation
    #[serde(with = "duration_str")]
    pub min_duration: Duration,
    /// Longest snap animation
    #[serde(with = "duration_str")]
    pub max_duration: Duration,
    /// Idle time before a snap starts
    #[serde(with = "duration_str")]
    pub delay: Duration,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_duration: Duration::from_millis(300),
            max_duration: Duration::from_millis(800),
            delay: Duration::from_millis(100),
        }
    }
}

// ============================================================================
// Duration (de)serialization
// ============================================================================

/// Humantime string <-> `Duration`.
pub mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes as a humantime string.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    /// Deserializes from a humantime string such as `900ms`.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a valid humantime duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

/// Optional humantime string <-> `Option<Duration>`.
pub mod option_duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes `Some` as a humantime string and `None` as null.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => super::duration_str::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional humantime string.
    ///
    /// # Errors
    ///
    /// Fails when a present string is not a valid humantime duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let yaml = "stage:\n  name: demo\n";
        let config: StageConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.stage.name, "demo");
        assert!(config.sections.is_empty());
        assert_eq!(config.effects.cooldown, Duration::from_millis(900));
        assert!((config.timeline.enter_end - 0.2).abs() < f64::EPSILON);
        assert!(config.scrub.is_none());
        assert!(!config.snap.enabled);
    }

    #[test]
    fn durations_parse_from_humantime() {
        let yaml = r"
stage:
  name: demo
scrub: 1500ms
effects:
  cooldown: 1s
  flash:
    rise: 80ms
";
        let config: StageConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scrub, Some(Duration::from_millis(1500)));
        assert_eq!(config.effects.cooldown, Duration::from_secs(1));
        assert_eq!(config.effects.flash.rise, Duration::from_millis(80));
        assert_eq!(config.effects.flash.decay, Duration::from_millis(500));
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let yaml = "stage:\n  name: demo\neffects:\n  cooldown: soon\n";
        let result: Result<StageConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn layout_prefers_fixed_span() {
        let layout = LayoutConfig {
            span: Some(1200.0),
            span_viewports: None,
            lead_in: 0.0,
        };
        assert_eq!(layout.span_layout().distance, SpanDistance::Fixed(1200.0));

        let layout = LayoutConfig {
            span: None,
            span_viewports: Some(1.5),
            lead_in: 300.0,
        };
        let built = layout.span_layout();
        assert_eq!(built.distance, SpanDistance::Viewports(1.5));
        assert!((built.lead_in - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn durations_round_trip_through_yaml() {
        let config = StageConfig::with_sections("demo", vec![]);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("cooldown: 900ms"));
        let back: StageConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.effects.cooldown, config.effects.cooldown);
    }
}
