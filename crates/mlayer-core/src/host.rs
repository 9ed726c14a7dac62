#![forbid(unsafe_code)]

//! The contract between the layer engine and the page it runs in.
//!
//! The engine never touches a DOM directly. Every effect (creating the layer
//! nodes, toggling classes, inline styles, stylesheet rules, document
//! listeners, measurement) goes through [`LayerHost`]. User input comes back
//! as [`HostEvent`]s.
//!
//! # Failure Modes
//!
//! | Operation | Failure | Engine behavior |
//! |-----------|---------|-----------------|
//! | `mount` | container or slot missing | propagated to the factory caller |
//! | `insert_content` | content unit failed | propagated to the pump caller |
//! | `insert_rule` | restricted stylesheet access | logged and ignored |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;

use crate::callback::Trigger;
use crate::content::ContentHandle;
use crate::kind::LayerKind;
use crate::value::ConfigValue;

/// Global counter for unique layer IDs.
static LAYER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a layer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    /// Allocate a new unique layer ID.
    pub fn next() -> Self {
        Self(LAYER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Host-side node reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Host-side listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Listener a layer can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Document-level keydown (Escape handling).
    DocumentKeydown,
    /// Click on the layer backdrop.
    BackdropClick,
    /// Click on the layer body; stops propagation to the backdrop.
    BodyClickStop,
}

impl ListenerKind {
    pub const fn flag(self) -> ListenerSet {
        match self {
            Self::DocumentKeydown => ListenerSet::KEYDOWN,
            Self::BackdropClick => ListenerSet::BACKDROP_CLICK,
            Self::BodyClickStop => ListenerSet::BODY_CLICK_STOP,
        }
    }
}

bitflags! {
    /// Set of listeners held by one layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ListenerSet: u8 {
        const KEYDOWN = 1 << 0;
        const BACKDROP_CLICK = 1 << 1;
        const BODY_CLICK_STOP = 1 << 2;
    }
}

/// Everything the host needs to build a layer's node tree.
#[derive(Debug, Clone)]
pub struct LayerMount<'a> {
    pub layer: LayerId,
    pub kind: LayerKind,
    pub element_id: Option<&'a str>,
    /// Container selector; `None` mounts under the document body.
    pub container: Option<&'a str>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub show_header: bool,
    pub show_close: bool,
    pub close_text: Option<String>,
    pub confirm_text: Option<String>,
    pub cancel_text: Option<String>,
    pub header_styles: Vec<(String, String)>,
}

/// Nodes created for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerNodes {
    /// Layer root; also the backdrop.
    pub root: NodeId,
    /// The body box that is sized, positioned, and animated.
    pub body: NodeId,
    /// Slot receiving the template or content unit.
    pub content: NodeId,
}

/// Page measurements used by the scroll lock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageMetrics {
    /// Width of the page root's client box.
    pub client_width: f64,
    /// Width of the window's layout viewport.
    pub viewport_width: f64,
}

impl PageMetrics {
    /// A vertical scrollbar is showing when the client box is narrower than
    /// the viewport.
    pub fn has_scrollbar(&self) -> bool {
        self.client_width < self.viewport_width
    }
}

/// Input delivered by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Document keydown, seen by every layer holding a keydown listener.
    KeyDown { key: String },
    /// Key released inside a layer.
    KeyUp {
        layer: LayerId,
        payload: Option<ConfigValue>,
    },
    /// Click on a layer's backdrop.
    BackdropClick { layer: LayerId },
    /// Click inside a layer's body.
    BodyClick { layer: LayerId },
    /// A layer button or routed markup action.
    Action {
        layer: LayerId,
        trigger: Trigger,
        payload: Option<ConfigValue>,
    },
}

/// Errors reported by a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The mount container selector matched nothing.
    ContainerNotFound(String),
    /// A required slot is missing from the layer markup.
    MissingSlot(&'static str),
    /// A stylesheet rule could not be inserted.
    RuleRejected(String),
    /// A content unit failed to render.
    Content(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerNotFound(sel) => write!(f, "container not found: {sel}"),
            Self::MissingSlot(slot) => write!(f, "layer markup is missing the {slot} slot"),
            Self::RuleRejected(rule) => write!(f, "stylesheet rejected rule: {rule}"),
            Self::Content(msg) => write!(f, "content unit failed: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Page operations the engine relies on.
pub trait LayerHost {
    /// Build the layer node tree under its container, hidden.
    fn mount(&mut self, mount: &LayerMount<'_>) -> Result<LayerNodes, HostError>;

    /// Detach and destroy a layer's node tree.
    fn unmount(&mut self, nodes: &LayerNodes);

    fn set_visible(&mut self, node: NodeId, visible: bool);

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    fn set_style(&mut self, node: NodeId, property: &str, value: &str);

    fn remove_style(&mut self, node: NodeId, property: &str);

    /// Current inline style value.
    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    fn insert_markup(&mut self, slot: NodeId, markup: &str);

    fn insert_content(&mut self, slot: NodeId, content: &ContentHandle) -> Result<(), HostError>;

    /// The page root (document body).
    fn page_root(&self) -> NodeId;

    fn page_metrics(&self) -> PageMetrics;

    /// Width of a native scrollbar, measured with an offscreen 100×100
    /// `overflow: scroll` probe.
    fn probe_scrollbar_width(&mut self) -> f64;

    fn client_height(&self, node: NodeId) -> f64;

    /// Whether the environment can play CSS animations.
    fn supports_animation(&self) -> bool;

    /// Return the stylesheet node with this id, creating it if needed.
    fn ensure_stylesheet(&mut self, id: &str) -> NodeId;

    fn insert_rule(&mut self, sheet: NodeId, rule: &str) -> Result<(), HostError>;

    fn remove_stylesheet(&mut self, sheet: NodeId);

    fn add_listener(&mut self, kind: ListenerKind, node: NodeId) -> ListenerId;

    fn remove_listener(&mut self, listener: ListenerId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_ids_are_unique() {
        let a = LayerId::next();
        let b = LayerId::next();
        assert_ne!(a, b);
        assert!(b.id() > a.id());
    }

    #[test]
    fn listener_flags() {
        let set = ListenerKind::DocumentKeydown.flag() | ListenerKind::BackdropClick.flag();
        assert!(set.contains(ListenerSet::KEYDOWN));
        assert!(!set.contains(ListenerSet::BODY_CLICK_STOP));
    }

    #[test]
    fn scrollbar_detection() {
        let metrics = PageMetrics {
            client_width: 1008.0,
            viewport_width: 1024.0,
        };
        assert!(metrics.has_scrollbar());
        let metrics = PageMetrics {
            client_width: 1024.0,
            viewport_width: 1024.0,
        };
        assert!(!metrics.has_scrollbar());
    }

    #[test]
    fn host_error_display() {
        assert_eq!(
            HostError::MissingSlot("body").to_string(),
            "layer markup is missing the body slot"
        );
    }
}
