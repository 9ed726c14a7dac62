#![forbid(unsafe_code)]

//! Service-wide settings.
//!
//! [`ServiceConfig`] carries the global option defaults shared by every
//! layer kind, plus the engine knobs that are not per-layer options: settle
//! delay, lock policy, lock class, and the keyframe stylesheet id.
//!
//! With the `serde` feature, settings can be loaded from JSON through
//! [`ServiceSettings`]:
//!
//! ```json
//! {
//!   "settle_delay_ms": 20,
//!   "lock_policy": "ref_counted",
//!   "defaults": { "title": "Notice", "animateTime": 250 }
//! }
//! ```

use std::time::Duration;

use mlayer_core::ModalConfig;

/// Default delay between opening and becoming visible.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Exit delay used when a layer's `animateTime` is absent or malformed.
pub const DEFAULT_ANIMATE_TIME: Duration = Duration::from_millis(300);

/// Class added to the page root while scrolling is locked.
pub const DEFAULT_LOCK_CLASS: &str = "no-scroll";

/// Id of the shared keyframe stylesheet.
pub const DEFAULT_STYLESHEET_ID: &str = "mlayer-keyframes";

/// How page-level resources shared by layers are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LockPolicy {
    /// Unlock when the last holder releases.
    #[default]
    RefCounted,
    /// Unlock on every release, even with other layers still open.
    Legacy,
}

/// Settings for a [`LayerService`](crate::LayerService).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub global_defaults: ModalConfig,
    pub settle_delay: Duration,
    pub default_animate_time: Duration,
    pub lock_policy: LockPolicy,
    pub lock_class: String,
    pub stylesheet_id: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            global_defaults: ModalConfig::global_defaults(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            default_animate_time: DEFAULT_ANIMATE_TIME,
            lock_policy: LockPolicy::default(),
            lock_class: DEFAULT_LOCK_CLASS.to_string(),
            stylesheet_id: DEFAULT_STYLESHEET_ID.to_string(),
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub fn global_defaults(mut self, defaults: ModalConfig) -> Self {
        self.global_defaults = defaults;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn default_animate_time(mut self, time: Duration) -> Self {
        self.default_animate_time = time;
        self
    }

    #[must_use]
    pub fn lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    #[must_use]
    pub fn lock_class(mut self, class: impl Into<String>) -> Self {
        self.lock_class = class.into();
        self
    }

    #[must_use]
    pub fn stylesheet_id(mut self, id: impl Into<String>) -> Self {
        self.stylesheet_id = id.into();
        self
    }
}

#[cfg(feature = "serde")]
pub use self::persisted::ServiceSettings;

#[cfg(feature = "serde")]
mod persisted {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use mlayer_core::ConfigValue;
    use serde::{Deserialize, Serialize};

    use super::{LockPolicy, ServiceConfig};
    use crate::error::LayerError;

    /// Serializable form of [`ServiceConfig`].
    ///
    /// `defaults` entries override the built-in global defaults key by key.
    /// Callback and content slots cannot be expressed here.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ServiceSettings {
        pub settle_delay_ms: Option<u64>,
        pub default_animate_time_ms: Option<u64>,
        pub lock_policy: Option<LockPolicy>,
        pub lock_class: Option<String>,
        pub stylesheet_id: Option<String>,
        pub defaults: BTreeMap<String, ConfigValue>,
    }

    impl ServiceSettings {
        pub fn from_json(json: &str) -> Result<Self, LayerError> {
            serde_json::from_str(json).map_err(|e| LayerError::InvalidSettings(e.to_string()))
        }

        /// Apply over the built-in settings.
        pub fn into_config(self) -> ServiceConfig {
            let base = ServiceConfig::default();
            let mut defaults = base.global_defaults.clone();
            for (key, value) in self.defaults {
                defaults = defaults.set(key, value);
            }
            ServiceConfig {
                global_defaults: defaults,
                settle_delay: self
                    .settle_delay_ms
                    .map_or(base.settle_delay, Duration::from_millis),
                default_animate_time: self
                    .default_animate_time_ms
                    .map_or(base.default_animate_time, Duration::from_millis),
                lock_policy: self.lock_policy.unwrap_or(base.lock_policy),
                lock_class: self.lock_class.unwrap_or(base.lock_class),
                stylesheet_id: self.stylesheet_id.unwrap_or(base.stylesheet_id),
            }
        }
    }

    impl ServiceConfig {
        /// Parse JSON settings and apply them over the defaults.
        pub fn from_json(json: &str) -> Result<Self, LayerError> {
            ServiceSettings::from_json(json).map(ServiceSettings::into_config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlayer_core::{ConfigValue, keys};

    #[test]
    fn defaults() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.settle_delay, Duration::from_millis(20));
        assert_eq!(cfg.lock_policy, LockPolicy::RefCounted);
        assert_eq!(cfg.lock_class, "no-scroll");
        assert_eq!(
            cfg.global_defaults.get(keys::ANIMATE_TIME),
            Some(&ConfigValue::Int(300))
        );
    }

    #[test]
    fn builder_overrides() {
        let cfg = ServiceConfig::default()
            .settle_delay(Duration::ZERO)
            .lock_policy(LockPolicy::Legacy)
            .lock_class("locked");
        assert_eq!(cfg.settle_delay, Duration::ZERO);
        assert_eq!(cfg.lock_policy, LockPolicy::Legacy);
        assert_eq!(cfg.lock_class, "locked");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn loads_json() {
        let cfg = ServiceConfig::from_json(
            r#"{"settle_delay_ms": 5, "lock_policy": "legacy", "defaults": {"title": "Hi"}}"#,
        )
        .expect("valid settings");
        assert_eq!(cfg.settle_delay, Duration::from_millis(5));
        assert_eq!(cfg.lock_policy, LockPolicy::Legacy);
        assert_eq!(
            cfg.global_defaults.get(keys::TITLE),
            Some(&ConfigValue::from("Hi"))
        );
        assert_eq!(cfg.stylesheet_id, DEFAULT_STYLESHEET_ID);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn rejects_malformed_json() {
        let err = ServiceConfig::from_json("{").unwrap_err();
        assert!(matches!(err, crate::LayerError::InvalidSettings(_)));
    }
}
