#![forbid(unsafe_code)]

//! Test harness for mlayer.
//!
//! [`MockHost`] implements [`LayerHost`](mlayer_core::LayerHost) in memory,
//! recording classes, inline styles, listeners, stylesheet rules, and an
//! ordered effect log. Lifecycle integration tests live in this crate's
//! `tests/` directory.

pub mod content;
pub mod mock;

pub use content::RecordingContent;
pub use mock::{HostCounters, MockHost, MountRecord};
