//! Section registry
//!
//! Ordered, read-only description of the content sections a stage scrolls
//! through. Section 0 is the hero: it maps and animates like any other
//! section but never gets a boundary trigger or a pin.

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a section's text block.
///
/// The panel always sits on the opposite side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Text on the left, panel enters from the right
    Left,
    /// Text on the right, panel enters from the left
    Right,
}

impl Alignment {
    /// Default alignment for a section ordinal: even sections left, odd right.
    #[must_use]
    pub const fn alternating(ordinal: usize) -> Self {
        if ordinal % 2 == 0 { Self::Left } else { Self::Right }
    }

    /// Sign of the panel's entry offset on the x axis.
    ///
    /// `+1.0` when the panel enters from the right, `-1.0` from the left.
    #[must_use]
    pub const fn panel_entry_sign(self) -> f64 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

/// Accent color in `#rrggbb` (or `#rgb`) notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccentColor(pub String);

impl AccentColor {
    /// Parses the color into RGB components.
    ///
    /// Returns `None` when the value is not a 3- or 6-digit hex color.
    #[must_use]
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.0.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some((r, g, b))
            }
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
                Some((digit(0)?, digit(1)?, digit(2)?))
            }
            _ => None,
        }
    }
}

impl Default for AccentColor {
    fn default() -> Self {
        Self("#d4a853".to_string())
    }
}

impl std::fmt::Display for AccentColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A call-to-action link rendered under the section copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    /// Link text
    pub text: String,
    /// Link target
    pub href: String,
}

/// A single stat item inside the section panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatItem {
    /// Headline value (e.g. "4K")
    pub value: String,
    /// Caption under the value
    #[serde(default)]
    pub label: String,
}

/// Auxiliary panel content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    /// Staggered stat items
    #[serde(default)]
    pub stats: Vec<StatItem>,
    /// Number of connector decorations drawn between stats
    #[serde(default)]
    pub connectors: usize,
}

/// One content section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Position in the stage; renumbered from list order by the registry
    #[serde(default)]
    pub index: usize,

    /// Small uppercase label above the title
    #[serde(default)]
    pub label: String,

    /// Section headline
    pub title: String,

    /// Body copy
    #[serde(default)]
    pub copy: String,

    /// Text alignment; alternates by ordinal when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,

    /// Accent color for the panel and overlays
    #[serde(default)]
    pub accent_color: AccentColor,

    /// Links rendered under the copy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_to_actions: Vec<CallToAction>,

    /// Panel content
    #[serde(default)]
    pub panel: Panel,

    /// Overrides the stage-wide scroll distance for this section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_distance: Option<f64>,
}

impl Section {
    /// Creates a section with only a title; everything else defaulted.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            index: 0,
            label: String::new(),
            title: title.into(),
            copy: String::new(),
            alignment: None,
            accent_color: AccentColor::default(),
            call_to_actions: Vec::new(),
            panel: Panel::default(),
            scroll_distance: None,
        }
    }

    /// Resolved text alignment.
    #[must_use]
    pub fn alignment(&self) -> Alignment {
        self.alignment
            .unwrap_or_else(|| Alignment::alternating(self.index))
    }
}

/// Ordered, immutable list of sections.
#[derive(Debug, Clone, Default)]
pub struct SectionRegistry {
    sections: Vec<Section>,
}

impl SectionRegistry {
    /// Builds a registry; list order is authoritative and `index` is
    /// rewritten to match it.
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        let sections = sections
            .into_iter()
            .enumerate()
            .map(|(ordinal, mut section)| {
                section.index = ordinal;
                section
            })
            .collect();
        Self { sections }
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the registry holds no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// All sections in order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// The hero (first) section, if any.
    #[must_use]
    pub fn hero(&self) -> Option<&Section> {
        self.sections.first()
    }

    /// Sections that own a boundary: every section except the hero.
    pub fn boundary_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().skip(1)
    }

    /// Per-section scroll distance overrides, in order.
    #[must_use]
    pub fn distance_overrides(&self) -> Vec<Option<f64>> {
        self.sections.iter().map(|s| s.scroll_distance).collect()
    }
}
