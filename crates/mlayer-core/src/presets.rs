#![forbid(unsafe_code)]

//! Animation presets and the keyframe lookup seam.
//!
//! The keyframe bodies are opaque data. The engine only needs a pair of
//! declaration blocks (0% and 100%) per preset; [`BuiltinKeyframes`] ships a
//! default table and hosts may substitute their own [`KeyframeSource`].

use std::fmt;

/// Named entrance/exit animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationPreset {
    Scale,
    Top,
    Bottom,
    Left,
    Right,
    Zoom,
    Rotate,
    RotateX,
    RotateY,
    ScaleX,
    ScaleY,
    Loading,
}

impl AnimationPreset {
    pub const ALL: [AnimationPreset; 12] = [
        Self::Scale,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::Zoom,
        Self::Rotate,
        Self::RotateX,
        Self::RotateY,
        Self::ScaleX,
        Self::ScaleY,
        Self::Loading,
    ];

    /// Look up a preset by its (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Zoom => "zoom",
            Self::Rotate => "rotate",
            Self::RotateX => "rotatex",
            Self::RotateY => "rotatey",
            Self::ScaleX => "scalex",
            Self::ScaleY => "scaley",
            Self::Loading => "loading",
        }
    }

    /// Keyframe rule name for the entrance.
    pub fn enter_name(self) -> String {
        self.name().to_owned()
    }

    /// Keyframe rule name for the exit.
    pub fn exit_name(self) -> String {
        format!("{}_close", self.name())
    }
}

impl fmt::Display for AnimationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declaration blocks for the start (0%) and end (100%) of an entrance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyframes {
    pub from: String,
    pub to: String,
}

impl Keyframes {
    /// `@keyframes` rule playing `from` → `to`.
    pub fn enter_rule(&self, name: &str) -> String {
        format!("@keyframes {name} {{ 0% {{ {} }} 100% {{ {} }} }}", self.from, self.to)
    }

    /// `@keyframes` rule playing the entrance backwards.
    pub fn exit_rule(&self, name: &str) -> String {
        format!("@keyframes {name} {{ 0% {{ {} }} 100% {{ {} }} }}", self.to, self.from)
    }
}

/// Keyframe data table.
pub trait KeyframeSource {
    fn keyframes(&self, preset: AnimationPreset) -> Option<Keyframes>;
}

/// Default keyframe table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinKeyframes;

fn frame(opacity: u8, transform: &str, origin: Option<&str>) -> String {
    match origin {
        Some(origin) => {
            format!("opacity: {opacity}; transform: {transform}; transform-origin: {origin};")
        }
        None => format!("opacity: {opacity}; transform: {transform};"),
    }
}

impl KeyframeSource for BuiltinKeyframes {
    fn keyframes(&self, preset: AnimationPreset) -> Option<Keyframes> {
        let (from, to, origin) = match preset {
            AnimationPreset::Zoom | AnimationPreset::Scale => ("scale(0.8)", "scale(1)", None),
            AnimationPreset::Top => ("translate(0px, -100px)", "translate(0px, 0px)", None),
            AnimationPreset::Bottom => ("translate(0px, 20px)", "translate(0px, 0px)", None),
            AnimationPreset::Left => ("translate(-100px, 0px)", "translate(0px, 0px)", None),
            AnimationPreset::Right => ("translate(100px, 0px)", "translate(0px, 0px)", None),
            AnimationPreset::Rotate => ("rotate(-30deg)", "rotate(0deg)", None),
            AnimationPreset::RotateX => ("rotatex(-90deg)", "rotatex(0deg)", Some("center")),
            AnimationPreset::RotateY => ("rotatey(-90deg)", "rotatey(0deg)", Some("center")),
            AnimationPreset::ScaleX => ("scalex(0)", "scalex(1)", Some("center")),
            AnimationPreset::ScaleY => ("scaley(0)", "scaley(1)", Some("center")),
            AnimationPreset::Loading => ("none", "none", None),
        };
        Some(Keyframes {
            from: frame(0, from, origin),
            to: frame(1, to, origin),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_case_insensitively() {
        assert_eq!(AnimationPreset::from_name("RotateX"), Some(AnimationPreset::RotateX));
        assert_eq!(AnimationPreset::from_name("bounce"), None);
    }

    #[test]
    fn exit_rule_reverses_frames() {
        let kf = BuiltinKeyframes.keyframes(AnimationPreset::Top).expect("top");
        let enter = kf.enter_rule("top");
        let exit = kf.exit_rule("top_close");
        assert!(enter.starts_with("@keyframes top { 0% { opacity: 0;"));
        assert!(exit.starts_with("@keyframes top_close { 0% { opacity: 1;"));
        assert_eq!(AnimationPreset::Top.exit_name(), "top_close");
    }

    #[test]
    fn builtin_table_covers_every_preset() {
        for preset in AnimationPreset::ALL {
            assert!(BuiltinKeyframes.keyframes(preset).is_some(), "{preset}");
        }
    }
}
