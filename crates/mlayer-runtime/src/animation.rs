#![forbid(unsafe_code)]

//! Enter and exit animations.
//!
//! Keyframe rules live in one shared stylesheet node. The node is created on
//! first use and removed when the last layer that used it is torn down. Each
//! preset's rules are inserted at most once per stylesheet lifetime.
//!
//! Animation is best effort. Without host support, or with an unknown preset,
//! playing is a no-op and the layer simply appears or disappears.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `supports_animation()` is false | no stylesheet, no element styles |
//! | preset name unknown | no-op |
//! | `insert_rule` fails | logged at `warn`, element styles still applied |

use std::time::Duration;

use ahash::AHashSet;
use mlayer_core::{AnimationPreset, KeyframeSource, LayerHost, NodeId};

use crate::settings::LockPolicy;

/// Which half of the animation to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Enter,
    Exit,
}

pub struct AnimationController {
    sheet_id: String,
    policy: LockPolicy,
    sheet: Option<NodeId>,
    users: usize,
    inserted: AHashSet<String>,
    source: Box<dyn KeyframeSource>,
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("sheet_id", &self.sheet_id)
            .field("sheet", &self.sheet)
            .field("users", &self.users)
            .field("inserted", &self.inserted.len())
            .finish()
    }
}

impl AnimationController {
    pub fn new(
        sheet_id: impl Into<String>,
        policy: LockPolicy,
        source: Box<dyn KeyframeSource>,
    ) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            policy,
            sheet: None,
            users: 0,
            inserted: AHashSet::new(),
            source,
        }
    }

    /// Play `preset` on `node`.
    ///
    /// `holds_sheet` tracks whether the calling layer already counts as a
    /// stylesheet user; it is set the first time the layer touches the sheet.
    /// Returns whether anything was applied.
    pub fn play(
        &mut self,
        host: &mut dyn LayerHost,
        node: NodeId,
        preset_name: &str,
        direction: Direction,
        duration: Duration,
        holds_sheet: &mut bool,
    ) -> bool {
        if !host.supports_animation() {
            return false;
        }
        let Some(preset) = AnimationPreset::from_name(preset_name) else {
            tracing::debug!(preset = preset_name, "unknown animation preset");
            return false;
        };
        let Some(frames) = self.source.keyframes(preset) else {
            return false;
        };

        let sheet = match self.sheet {
            Some(sheet) => sheet,
            None => {
                let sheet = host.ensure_stylesheet(&self.sheet_id);
                self.sheet = Some(sheet);
                sheet
            }
        };
        if !*holds_sheet {
            *holds_sheet = true;
            self.users += 1;
        }

        let (name, rule) = match direction {
            Direction::Enter => {
                let name = preset.enter_name();
                let rule = frames.enter_rule(&name);
                (name, rule)
            }
            Direction::Exit => {
                let name = preset.exit_name();
                let rule = frames.exit_rule(&name);
                (name, rule)
            }
        };
        if !self.inserted.contains(&name) {
            match host.insert_rule(sheet, &rule) {
                Ok(()) => {
                    self.inserted.insert(name.clone());
                }
                Err(err) => tracing::warn!(error = %err, rule = %name, "keyframe rule rejected"),
            }
        }

        host.set_style(node, "animation-name", &name);
        host.set_style(
            node,
            "animation-duration",
            &format!("{}ms", duration.as_millis()),
        );
        host.set_style(node, "animation-timing-function", "ease");
        host.set_style(node, "animation-fill-mode", "both");
        true
    }

    /// Drop one stylesheet user.
    pub fn release(&mut self, host: &mut dyn LayerHost) {
        self.users = self.users.saturating_sub(1);
        if self.policy == LockPolicy::RefCounted && self.users > 0 {
            return;
        }
        if let Some(sheet) = self.sheet.take() {
            host.remove_stylesheet(sheet);
            self.inserted.clear();
            tracing::debug!(sheet = %self.sheet_id, "keyframe stylesheet removed");
        }
    }

    pub fn users(&self) -> usize {
        self.users
    }

    pub fn has_sheet(&self) -> bool {
        self.sheet.is_some()
    }
}
