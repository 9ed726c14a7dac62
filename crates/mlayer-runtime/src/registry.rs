#![forbid(unsafe_code)]

//! State shared between the service and its handles.
//!
//! Handles never reach into a live instance. They read the phase mirror and
//! the data payload here, register callbacks here, and enqueue [`Command`]s
//! that the service applies on its next pump. Callbacks therefore run with no
//! registry borrow held, and a callback calling back into a handle cannot
//! re-enter the state machine.

use std::collections::VecDeque;

use ahash::AHashMap;
use mlayer_core::{ConfigValue, LayerCallback, LayerId, Trigger};

use crate::instance::LayerPhase;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Trigger {
        layer: LayerId,
        trigger: Trigger,
        payload: Option<ConfigValue>,
    },
    Remove {
        element_id: Option<String>,
    },
}

pub(crate) struct LayerEntry {
    phase: LayerPhase,
    data: Option<ConfigValue>,
    callbacks: AHashMap<Trigger, LayerCallback>,
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: AHashMap<LayerId, LayerEntry>,
    commands: VecDeque<Command>,
}

impl Registry {
    pub fn insert(&mut self, layer: LayerId, data: Option<ConfigValue>) {
        self.entries.insert(
            layer,
            LayerEntry {
                phase: LayerPhase::Created,
                data,
                callbacks: AHashMap::new(),
            },
        );
    }

    pub fn remove(&mut self, layer: LayerId) {
        self.entries.remove(&layer);
    }

    #[inline]
    pub fn contains(&self, layer: LayerId) -> bool {
        self.entries.contains_key(&layer)
    }

    /// Phase mirror. Unknown layers are destroyed.
    pub fn phase(&self, layer: LayerId) -> LayerPhase {
        self.entries
            .get(&layer)
            .map_or(LayerPhase::Destroyed, |entry| entry.phase)
    }

    pub fn set_phase(&mut self, layer: LayerId, phase: LayerPhase) {
        if let Some(entry) = self.entries.get_mut(&layer) {
            entry.phase = phase;
        }
    }

    pub fn data(&self, layer: LayerId) -> Option<ConfigValue> {
        self.entries.get(&layer)?.data.clone()
    }

    pub fn set_callback(&mut self, layer: LayerId, trigger: Trigger, callback: LayerCallback) {
        if let Some(entry) = self.entries.get_mut(&layer) {
            entry.callbacks.insert(trigger, callback);
        }
    }

    /// Handle-registered callback, cloned so it can be invoked unborrowed.
    pub fn callback(&self, layer: LayerId, trigger: Trigger) -> Option<LayerCallback> {
        self.entries.get(&layer)?.callbacks.get(&trigger).cloned()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlayer_core::{Resolution, callback};

    #[test]
    fn unknown_layers_read_as_destroyed() {
        let registry = Registry::default();
        assert_eq!(registry.phase(LayerId::next()), LayerPhase::Destroyed);
    }

    #[test]
    fn callbacks_are_per_trigger() {
        let mut registry = Registry::default();
        let id = LayerId::next();
        registry.insert(id, Some(ConfigValue::from("payload")));
        registry.set_callback(id, Trigger::Confirm, callback(|_| false));

        assert!(registry.callback(id, Trigger::Confirm).is_some());
        assert!(registry.callback(id, Trigger::Cancel).is_none());
        let cb = registry.callback(id, Trigger::Confirm).expect("registered");
        assert!(matches!(cb(None), Resolution::Stay));
        assert_eq!(registry.data(id), Some(ConfigValue::from("payload")));

        registry.remove(id);
        assert!(registry.callback(id, Trigger::Confirm).is_none());
        assert!(!registry.contains(id));
    }

    #[test]
    fn commands_are_fifo() {
        let mut registry = Registry::default();
        registry.push(Command::Remove { element_id: None });
        registry.push(Command::Remove {
            element_id: Some("a".into()),
        });
        assert_eq!(registry.pop(), Some(Command::Remove { element_id: None }));
        assert!(registry.pop().is_some());
        assert!(registry.pop().is_none());
    }
}
