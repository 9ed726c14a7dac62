#![forbid(unsafe_code)]

//! Layer lifecycle runtime for mlayer.
//!
//! [`LayerService`] is the entry point: it creates layers through one
//! operation per [`LayerKind`](mlayer_core::LayerKind), hands back a
//! [`LayerHandle`], and drives every layer through its state machine as the
//! host delivers input and time.
//!
//! The runtime is single-threaded. Handles and callbacks are `Rc`-based and
//! not `Send`.
//!
//! # Example
//!
//! ```ignore
//! use mlayer_runtime::LayerService;
//! use mlayer_core::ModalConfig;
//!
//! let mut service = LayerService::new(host);
//! let layer = service.confirm(ModalConfig::new().title("Discard changes?"))?;
//! layer.confirm_callback(|_| true);
//!
//! // In the host's frame loop:
//! service.tick()?;
//! ```

pub mod animation;
pub mod error;
pub mod handle;
pub mod instance;
mod registry;
pub mod scheduler;
pub mod scroll_lock;
pub mod service;
pub mod settings;

pub use error::LayerError;
pub use handle::LayerHandle;
pub use instance::LayerPhase;
pub use scroll_lock::ScrollLock;
pub use service::LayerService;
#[cfg(feature = "serde")]
pub use settings::ServiceSettings;
pub use settings::{LockPolicy, ServiceConfig};
