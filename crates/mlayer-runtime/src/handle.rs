#![forbid(unsafe_code)]

//! Caller-facing proxy for one layer.
//!
//! A [`LayerHandle`] is bound by id to exactly one layer. It holds only a weak
//! reference to the service registry: once the layer is destroyed, or the
//! service dropped, every operation is a silent no-op.
//!
//! Trigger operations are queued and take effect on the service's next
//! [`pump`](crate::LayerService::pump) (or `dispatch`, `advance`, `tick`).
//!
//! # Example
//!
//! ```ignore
//! let layer = service.confirm(ModalConfig::new().title("Delete file?"))?;
//! layer.confirm_callback(|_| {
//!     delete_file();
//!     true
//! });
//! layer.on_confirm(None);
//! service.pump()?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use mlayer_core::{ConfigValue, LayerId, Resolution, Trigger, callback};

use crate::instance::LayerPhase;
use crate::registry::{Command, Registry};

/// Handle returned by every factory operation.
pub struct LayerHandle {
    id: LayerId,
    registry: Weak<RefCell<Registry>>,
}

impl fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerHandle")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish()
    }
}

impl LayerHandle {
    pub(crate) fn new(id: LayerId, registry: &Rc<RefCell<Registry>>) -> Self {
        Self {
            id,
            registry: Rc::downgrade(registry),
        }
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// The layer's `data` payload, if it is still alive.
    pub fn data(&self) -> Option<ConfigValue> {
        self.registry.upgrade()?.borrow().data(self.id)
    }

    pub fn phase(&self) -> LayerPhase {
        self.registry
            .upgrade()
            .map_or(LayerPhase::Destroyed, |r| r.borrow().phase(self.id))
    }

    pub fn is_alive(&self) -> bool {
        self.phase() != LayerPhase::Destroyed
    }

    pub fn on_confirm(&self, data: Option<ConfigValue>) {
        self.trigger(Trigger::Confirm, data);
    }

    pub fn on_cancel(&self, data: Option<ConfigValue>) {
        self.trigger(Trigger::Cancel, data);
    }

    pub fn on_close(&self) {
        self.trigger(Trigger::Close, None);
    }

    pub fn on_check(&self, data: Option<ConfigValue>) {
        self.trigger(Trigger::Check, data);
    }

    /// Register the confirm callback. A `true` answer closes the layer.
    pub fn confirm_callback<F, R>(&self, f: F)
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.register(Trigger::Confirm, f);
    }

    pub fn cancel_callback<F, R>(&self, f: F)
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.register(Trigger::Cancel, f);
    }

    pub fn close_callback<F, R>(&self, f: F)
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.register(Trigger::Close, f);
    }

    /// Register the keystroke callback. Without one, keystrokes keep the
    /// layer open.
    pub fn check_callback<F, R>(&self, f: F)
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.register(Trigger::Check, f);
    }

    /// Tear down layers immediately: the first layer whose element id is
    /// `element_id`, or every layer when `None`.
    pub fn remove(&self, element_id: Option<&str>) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().push(Command::Remove {
                element_id: element_id.map(str::to_owned),
            });
        }
    }

    fn trigger(&self, trigger: Trigger, payload: Option<ConfigValue>) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        if !registry.contains(self.id) {
            tracing::trace!(layer = %self.id, %trigger, "trigger on destroyed layer ignored");
            return;
        }
        registry.push(Command::Trigger {
            layer: self.id,
            trigger,
            payload,
        });
    }

    fn register<F, R>(&self, trigger: Trigger, f: F)
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .borrow_mut()
                .set_callback(self.id, trigger, callback(f));
        }
    }
}
