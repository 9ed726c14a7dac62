#![forbid(unsafe_code)]

//! The five layer kinds and their default option tables.
//!
//! Kinds differ only by defaults; every kind goes through the same
//! instantiation routine.

use std::fmt;

use crate::config::{ModalConfig, keys};
use crate::value::ConfigValue;

/// Auto-close delay applied to loading layers, in milliseconds.
pub const LOADING_AUTO_CLOSE_MS: i64 = 3000;

/// Layer kind variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LayerKind {
    /// General dialog, usually hosting a content unit.
    Dialog,
    /// Message with a single confirm button.
    Alert,
    /// Message with confirm and cancel buttons.
    Confirm,
    /// Transient busy indicator without buttons.
    Loading,
    /// Bottom-anchored action sheet.
    Actions,
}

impl LayerKind {
    pub const ALL: [LayerKind; 5] = [
        Self::Dialog,
        Self::Alert,
        Self::Confirm,
        Self::Loading,
        Self::Actions,
    ];

    /// Default options layered between the caller's and the global defaults.
    pub fn defaults(self) -> ModalConfig {
        match self {
            Self::Dialog => ModalConfig::new()
                .modal_class("modal-dialog")
                .animate("top")
                .position("center")
                .set(keys::TEMPLATE, ConfigValue::Null)
                .width(550)
                .cancel_text(false)
                .confirm_text(false),
            Self::Alert => ModalConfig::new()
                .modal_class("modal-alert")
                .animate("zoom")
                .template("")
                .cancel_text(false),
            Self::Confirm => ModalConfig::new()
                .modal_class("modal-confirm")
                .animate("scale")
                .template(""),
            Self::Loading => ModalConfig::new()
                .modal_class("modal-loading")
                .animate("loading")
                .template("Loading")
                .auto_close(LOADING_AUTO_CLOSE_MS)
                .confirm_text(false)
                .cancel_text(false),
            Self::Actions => ModalConfig::new()
                .modal_class("modal-action")
                .animate("bottom")
                .position("bottom-20")
                .confirm_text(false)
                .set(keys::HEADER, false)
                .template("")
                .width("30%"),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::Alert => "alert",
            Self::Confirm => "confirm",
            Self::Loading => "loading",
            Self::Actions => "actions",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
