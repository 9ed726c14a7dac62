#![forbid(unsafe_code)]

//! Core types for mlayer modal layers.
//!
//! This crate holds everything that does not depend on the runtime:
//!
//! - [`value`]: loosely typed option values with JavaScript-like truthiness.
//! - [`config`]: the option builder and the three-level resolver.
//! - [`kind`]: the five layer kinds and their default tables.
//! - [`position`]: the pure position calculator.
//! - [`presets`]: animation presets and the keyframe lookup seam.
//! - [`callback`]: triggers and the [`Resolution`] result type.
//! - [`host`]: the [`LayerHost`] contract and host events.

pub mod callback;
pub mod config;
pub mod content;
pub mod host;
pub mod kind;
pub mod position;
pub mod presets;
pub mod value;

pub use callback::{LayerCallback, PendingResolution, Resolution, Trigger, callback};
pub use config::{ModalConfig, ResolvedConfig, TemplateRef, keys, resolve};
pub use content::{ContentHandle, LayerContent};
pub use host::{
    HostError, HostEvent, LayerHost, LayerId, LayerMount, LayerNodes, ListenerId, ListenerKind,
    ListenerSet, NodeId, PageMetrics,
};
pub use kind::LayerKind;
pub use position::{PositionSpec, PositionStyle};
pub use presets::{AnimationPreset, BuiltinKeyframes, KeyframeSource, Keyframes};
pub use value::ConfigValue;
