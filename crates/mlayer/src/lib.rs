#![forbid(unsafe_code)]

//! mlayer public facade.
//!
//! Re-exports the configuration types from `mlayer-core` and the service from
//! `mlayer-runtime`, plus a [`prelude`] for the common imports.

pub use mlayer_core::{
    AnimationPreset, ConfigValue, ContentHandle, HostError, HostEvent, KeyframeSource,
    LayerCallback, LayerContent, LayerHost, LayerId, LayerKind, LayerMount, LayerNodes,
    ListenerId, ListenerKind, ModalConfig, NodeId, PageMetrics, Resolution, ResolvedConfig,
    Trigger, callback, keys, resolve,
};
pub use mlayer_runtime::{
    LayerError, LayerHandle, LayerPhase, LayerService, LockPolicy, ServiceConfig,
};
#[cfg(feature = "serde")]
pub use mlayer_runtime::ServiceSettings;

pub mod prelude {
    pub use crate::{
        ConfigValue, HostEvent, LayerError, LayerHandle, LayerHost, LayerPhase, LayerService,
        ModalConfig, Resolution, Trigger,
    };
}
