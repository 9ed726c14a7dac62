#![forbid(unsafe_code)]

//! Content units for tests.

use std::cell::RefCell;
use std::rc::Rc;

use mlayer_core::{ConfigValue, ContentHandle, LayerContent};

/// Content unit that remembers the data it was bound to.
#[derive(Debug, Clone)]
pub struct RecordingContent {
    name: String,
    bound: Rc<RefCell<Vec<ConfigValue>>>,
}

impl RecordingContent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Wrap a clone in a [`ContentHandle`]; `self` keeps observing it.
    pub fn handle(&self) -> ContentHandle {
        ContentHandle::new(self.clone())
    }

    /// Payloads received so far.
    pub fn bound(&self) -> Vec<ConfigValue> {
        self.bound.borrow().clone()
    }
}

impl LayerContent for RecordingContent {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind_data(&self, data: &ConfigValue) {
        self.bound.borrow_mut().push(data.clone());
    }
}
