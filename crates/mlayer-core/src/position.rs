#![forbid(unsafe_code)]

//! Placement of a layer body inside the viewport.
//!
//! A position spec is one of:
//!
//! - a bare number (`"120"`): margin-top in pixels;
//! - `"<edge>-<offset>"` with edge in `left`, `right`, `top`, `bottom`,
//!   `center` (offset optional, defaults to 0);
//! - anything else: a fixed 30px top margin.
//!
//! # Invariants
//!
//! - [`compute`] is pure: the same inputs always produce the same styles.
//! - The output only ever addresses the layer's own body element.
//!
//! # Failure Modes
//!
//! - Unparseable offsets are treated as 0.
//! - Negative results (content taller than the viewport for `bottom`) are
//!   emitted as-is; the host decides how to render them.

use crate::value::px;

/// Gap reserved around content that does not fit the viewport.
pub const CENTER_GAP: f64 = 60.0;

/// Top margin used for specs that match no rule.
pub const FALLBACK_MARGIN: f64 = CENTER_GAP / 2.0;

/// Edge named by a position spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
    Center,
}

impl Edge {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "center" => Some(Self::Center),
            _ => None,
        }
    }
}

/// Parsed position spec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionSpec {
    /// Bare number: margin-top in pixels.
    Offset(f64),
    /// Edge anchored with an offset in pixels.
    Anchored { edge: Edge, offset: f64 },
    /// Nothing matched.
    Fallback,
}

impl PositionSpec {
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if let Ok(value) = spec.parse::<f64>() {
            if value.is_finite() {
                return Self::Offset(value);
            }
        }

        let mut parts = spec.split('-');
        let edge = parts.next().and_then(Edge::parse);
        let offset = parts.next().map_or(0.0, leading_int);

        match edge {
            Some(edge) => Self::Anchored { edge, offset },
            None => Self::Fallback,
        }
    }
}

/// Parse the leading integer of `s` (`"20px"` → 20); 0 when there is none.
fn leading_int(s: &str) -> f64 {
    let s = s.trim_start();
    let digits = s.strip_prefix('+').unwrap_or(s);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<f64>().unwrap_or(0.0)
}

/// Horizontal float applied with side anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    Left,
    Right,
}

impl Float {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Style deltas for the layer body, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionStyle {
    pub margin_top: Option<f64>,
    pub margin_bottom: Option<f64>,
    pub margin_left: Option<f64>,
    pub margin_right: Option<f64>,
    pub float: Option<Float>,
}

impl PositionStyle {
    fn top(value: f64) -> Self {
        Self {
            margin_top: Some(value),
            ..Self::default()
        }
    }

    /// Style declarations in a stable order.
    pub fn declarations(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::with_capacity(3);
        if let Some(v) = self.margin_top {
            out.push(("margin-top", px(v)));
        }
        if let Some(v) = self.margin_bottom {
            out.push(("margin-bottom", px(v)));
        }
        if let Some(v) = self.margin_left {
            out.push(("margin-left", px(v)));
        }
        if let Some(v) = self.margin_right {
            out.push(("margin-right", px(v)));
        }
        if let Some(float) = self.float {
            out.push(("float", float.as_str().to_owned()));
        }
        out
    }
}

/// Compute body styles for a spec, viewport height, and content height.
pub fn compute(spec: &str, viewport_height: f64, content_height: f64) -> PositionStyle {
    match PositionSpec::parse(spec) {
        PositionSpec::Offset(value) => PositionStyle::top(value),
        PositionSpec::Anchored { edge, offset } => match edge {
            Edge::Left => PositionStyle {
                margin_left: Some(offset),
                float: Some(Float::Left),
                ..PositionStyle::default()
            },
            Edge::Right => PositionStyle {
                margin_right: Some(offset),
                float: Some(Float::Right),
                ..PositionStyle::default()
            },
            Edge::Top => PositionStyle::top(offset),
            Edge::Bottom => PositionStyle::top(viewport_height - content_height - offset),
            Edge::Center => center(viewport_height, content_height),
        },
        PositionSpec::Fallback => PositionStyle::top(FALLBACK_MARGIN),
    }
}

fn center(viewport_height: f64, content_height: f64) -> PositionStyle {
    if content_height > viewport_height - CENTER_GAP {
        let half = CENTER_GAP / 2.0;
        PositionStyle {
            margin_top: Some(half),
            margin_bottom: Some(half),
            ..PositionStyle::default()
        }
    } else {
        PositionStyle::top((viewport_height - content_height) / 2.0)
    }
}
