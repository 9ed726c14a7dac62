#![forbid(unsafe_code)]

//! Opaque content handles inserted into a layer's body slot.

use std::fmt;
use std::rc::Rc;

use crate::value::ConfigValue;

/// Externally rendered body content.
///
/// The engine never inspects the content. It hands the layer's `data` payload
/// to [`bind_data`](LayerContent::bind_data) (object payloads only) and asks
/// the host to insert the handle into the content slot.
pub trait LayerContent {
    /// Diagnostic name, used in logs and by test hosts.
    fn name(&self) -> &str;

    /// Receive the layer's data payload before insertion.
    fn bind_data(&self, _data: &ConfigValue) {}
}

/// Shared reference to a [`LayerContent`] unit.
#[derive(Clone)]
pub struct ContentHandle(Rc<dyn LayerContent>);

impl ContentHandle {
    pub fn new(content: impl LayerContent + 'static) -> Self {
        Self(Rc::new(content))
    }

    pub fn from_rc(content: Rc<dyn LayerContent>) -> Self {
        Self(content)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Forward a payload; non-map payloads are ignored.
    pub fn bind_data(&self, data: &ConfigValue) {
        if data.as_map().is_some() {
            self.0.bind_data(data);
        }
    }

    /// Whether two handles point at the same content unit.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHandle").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder(RefCell<Vec<ConfigValue>>);

    impl LayerContent for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn bind_data(&self, data: &ConfigValue) {
            self.0.borrow_mut().push(data.clone());
        }
    }

    #[test]
    fn only_map_payloads_are_bound() {
        let rec = Rc::new(Recorder(RefCell::new(Vec::new())));
        let handle = ContentHandle::from_rc(rec.clone());
        handle.bind_data(&ConfigValue::from("123456"));
        handle.bind_data(&ConfigValue::map([("id", 7)]));
        assert_eq!(rec.0.borrow().len(), 1);
        assert_eq!(format!("{handle:?}"), "ContentHandle(\"recorder\")");
    }
}
