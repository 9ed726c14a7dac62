#![forbid(unsafe_code)]

//! In-memory [`LayerHost`] that records every effect.
//!
//! Nodes are plain records (classes, inline styles, visibility, inserted
//! markup or content). The page root is node `0`. Every host call is also
//! appended to an effect log so tests can assert on ordering.

use std::collections::{BTreeMap, BTreeSet};

use ahash::{AHashMap, AHashSet};
use mlayer_core::{
    ContentHandle, HostError, LayerHost, LayerId, LayerKind, LayerMount, LayerNodes, ListenerId,
    ListenerKind, NodeId, PageMetrics,
};

const PAGE: NodeId = NodeId(0);
const PAGE_WIDTH: f64 = 1024.0;
const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

#[derive(Debug, Clone, Default)]
struct NodeState {
    classes: BTreeSet<String>,
    styles: BTreeMap<String, String>,
    visible: bool,
    markup: Option<String>,
    content: Option<String>,
    client_height: f64,
}

/// What the host was asked to mount.
#[derive(Debug, Clone, PartialEq)]
pub struct MountRecord {
    pub layer: LayerId,
    pub kind: LayerKind,
    pub element_id: Option<String>,
    pub container: Option<String>,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub show_header: bool,
    pub show_close: bool,
    pub confirm_text: Option<String>,
    pub cancel_text: Option<String>,
    pub header_styles: Vec<(String, String)>,
    pub nodes: LayerNodes,
}

/// Call counts for host operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCounters {
    pub mounts: u32,
    pub unmounts: u32,
    pub listeners_added: u32,
    pub listeners_removed: u32,
    pub stylesheets_created: u32,
    pub stylesheets_removed: u32,
    pub scrollbar_probes: u32,
}

#[derive(Debug)]
pub struct MockHost {
    next_node: u64,
    next_listener: u64,
    nodes: AHashMap<NodeId, NodeState>,
    layers: AHashMap<LayerId, LayerNodes>,
    mounts: Vec<MountRecord>,
    listeners: AHashMap<ListenerId, (ListenerKind, NodeId)>,
    sheets: AHashMap<String, NodeId>,
    rules: Vec<String>,
    missing_containers: AHashSet<String>,
    metrics: PageMetrics,
    scrollbar_width: f64,
    body_height: f64,
    animation: bool,
    reject_rules: bool,
    fail_content: bool,
    counters: HostCounters,
    log: Vec<String>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    /// A host with no scrollbar, animation support, and an 800px viewport.
    pub fn new() -> Self {
        let mut nodes = AHashMap::new();
        nodes.insert(
            PAGE,
            NodeState {
                visible: true,
                client_height: DEFAULT_VIEWPORT_HEIGHT,
                ..NodeState::default()
            },
        );
        Self {
            next_node: 1,
            next_listener: 1,
            nodes,
            layers: AHashMap::new(),
            mounts: Vec::new(),
            listeners: AHashMap::new(),
            sheets: AHashMap::new(),
            rules: Vec::new(),
            missing_containers: AHashSet::new(),
            metrics: PageMetrics {
                client_width: PAGE_WIDTH,
                viewport_width: PAGE_WIDTH,
            },
            scrollbar_width: 0.0,
            body_height: 0.0,
            animation: true,
            reject_rules: false,
            fail_content: false,
            counters: HostCounters::default(),
            log: Vec::new(),
        }
    }

    // --- Configuration ---------------------------------------------------

    /// Show a native scrollbar of `width` pixels.
    #[must_use]
    pub fn with_scrollbar(mut self, width: f64) -> Self {
        self.scrollbar_width = width;
        self.metrics.client_width = PAGE_WIDTH - width;
        self
    }

    #[must_use]
    pub fn without_animation(mut self) -> Self {
        self.animation = false;
        self
    }

    /// Fail every `insert_rule`.
    #[must_use]
    pub fn rejecting_rules(mut self) -> Self {
        self.reject_rules = true;
        self
    }

    /// Fail every `insert_content`.
    #[must_use]
    pub fn failing_content(mut self) -> Self {
        self.fail_content = true;
        self
    }

    /// Make `selector` unresolvable at mount time.
    #[must_use]
    pub fn with_missing_container(mut self, selector: &str) -> Self {
        self.missing_containers.insert(selector.to_owned());
        self
    }

    /// Client height given to every layer body mounted from now on.
    #[must_use]
    pub fn with_body_height(mut self, height: f64) -> Self {
        self.body_height = height;
        self
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.set_client_height(PAGE, height);
    }

    pub fn set_client_height(&mut self, node: NodeId, height: f64) {
        self.nodes.entry(node).or_default().client_height = height;
    }

    // --- Inspection --------------------------------------------------------

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.classes.contains(class))
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    pub fn markup(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node)?.markup.as_deref()
    }

    /// Name of the content unit inserted into `node`.
    pub fn content(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(&node)?.content.as_deref()
    }

    pub fn node_exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Nodes of a mounted layer.
    pub fn nodes_of(&self, layer: LayerId) -> Option<LayerNodes> {
        self.layers.get(&layer).copied()
    }

    pub fn mounts(&self) -> &[MountRecord] {
        &self.mounts
    }

    pub fn mounted_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Active listeners of `kind`.
    pub fn listeners_of(&self, kind: ListenerKind) -> usize {
        self.listeners.values().filter(|(k, _)| *k == kind).count()
    }

    /// Every rule the host accepted, in insertion order.
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    pub fn live_stylesheets(&self) -> usize {
        self.sheets.len()
    }

    pub fn stylesheets_created(&self) -> u32 {
        self.counters.stylesheets_created
    }

    pub fn stylesheets_removed(&self) -> u32 {
        self.counters.stylesheets_removed
    }

    pub fn counters(&self) -> HostCounters {
        self.counters
    }

    /// Effect log, one line per mutating call.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Log lines touching `node`.
    pub fn log_for(&self, node: NodeId) -> Vec<&str> {
        let tag = format!("#{} ", node.0);
        self.log
            .iter()
            .filter(|line| line.contains(&tag))
            .map(String::as_str)
            .collect()
    }

    fn alloc(&mut self, state: NodeState) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, state);
        id
    }

    fn record(&mut self, line: String) {
        tracing::trace!(target: "mlayer_harness", "{line}");
        self.log.push(line);
    }
}

impl LayerHost for MockHost {
    fn mount(&mut self, mount: &LayerMount<'_>) -> Result<LayerNodes, HostError> {
        if let Some(container) = mount.container {
            if self.missing_containers.contains(container) {
                return Err(HostError::ContainerNotFound(container.to_owned()));
            }
        }
        let root = self.alloc(NodeState::default());
        let body = self.alloc(NodeState {
            visible: true,
            client_height: self.body_height,
            ..NodeState::default()
        });
        let content = self.alloc(NodeState {
            visible: true,
            ..NodeState::default()
        });
        let nodes = LayerNodes {
            root,
            body,
            content,
        };
        self.layers.insert(mount.layer, nodes);
        self.mounts.push(MountRecord {
            layer: mount.layer,
            kind: mount.kind,
            element_id: mount.element_id.map(str::to_owned),
            container: mount.container.map(str::to_owned),
            title: mount.title.clone(),
            sub_title: mount.sub_title.clone(),
            show_header: mount.show_header,
            show_close: mount.show_close,
            confirm_text: mount.confirm_text.clone(),
            cancel_text: mount.cancel_text.clone(),
            header_styles: mount.header_styles.clone(),
            nodes,
        });
        self.counters.mounts += 1;
        self.record(format!("mount {} #{} ", mount.layer, root.0));
        Ok(nodes)
    }

    fn unmount(&mut self, nodes: &LayerNodes) {
        for node in [nodes.root, nodes.body, nodes.content] {
            self.nodes.remove(&node);
        }
        self.layers.retain(|_, n| *n != *nodes);
        self.counters.unmounts += 1;
        self.record(format!("unmount #{} ", nodes.root.0));
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        self.nodes.entry(node).or_default().visible = visible;
        self.record(format!("visible #{} {visible}", node.0));
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        self.nodes
            .entry(node)
            .or_default()
            .classes
            .insert(class.to_owned());
        self.record(format!("add_class #{} {class}", node.0));
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.classes.remove(class);
        }
        self.record(format!("remove_class #{} {class}", node.0));
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        self.nodes
            .entry(node)
            .or_default()
            .styles
            .insert(property.to_owned(), value.to_owned());
        self.record(format!("set_style #{} {property}: {value}", node.0));
    }

    fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.styles.remove(property);
        }
        self.record(format!("remove_style #{} {property}", node.0));
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.nodes.get(&node)?.styles.get(property).cloned()
    }

    fn insert_markup(&mut self, slot: NodeId, markup: &str) {
        self.nodes.entry(slot).or_default().markup = Some(markup.to_owned());
        self.record(format!("insert_markup #{} {markup}", slot.0));
    }

    fn insert_content(&mut self, slot: NodeId, content: &ContentHandle) -> Result<(), HostError> {
        if self.fail_content {
            return Err(HostError::Content(content.name().to_owned()));
        }
        self.nodes.entry(slot).or_default().content = Some(content.name().to_owned());
        self.record(format!("insert_content #{} {}", slot.0, content.name()));
        Ok(())
    }

    fn page_root(&self) -> NodeId {
        PAGE
    }

    fn page_metrics(&self) -> PageMetrics {
        self.metrics
    }

    fn probe_scrollbar_width(&mut self) -> f64 {
        self.counters.scrollbar_probes += 1;
        self.scrollbar_width
    }

    fn client_height(&self, node: NodeId) -> f64 {
        self.nodes.get(&node).map_or(0.0, |n| n.client_height)
    }

    fn supports_animation(&self) -> bool {
        self.animation
    }

    fn ensure_stylesheet(&mut self, id: &str) -> NodeId {
        if let Some(sheet) = self.sheets.get(id) {
            return *sheet;
        }
        let sheet = self.alloc(NodeState::default());
        self.sheets.insert(id.to_owned(), sheet);
        self.counters.stylesheets_created += 1;
        self.record(format!("stylesheet #{} {id}", sheet.0));
        sheet
    }

    fn insert_rule(&mut self, sheet: NodeId, rule: &str) -> Result<(), HostError> {
        if self.reject_rules {
            return Err(HostError::RuleRejected(rule.to_owned()));
        }
        self.rules.push(rule.to_owned());
        self.record(format!("insert_rule #{} {rule}", sheet.0));
        Ok(())
    }

    fn remove_stylesheet(&mut self, sheet: NodeId) {
        self.sheets.retain(|_, node| *node != sheet);
        self.nodes.remove(&sheet);
        self.counters.stylesheets_removed += 1;
        self.record(format!("remove_stylesheet #{} ", sheet.0));
    }

    fn add_listener(&mut self, kind: ListenerKind, node: NodeId) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (kind, node));
        self.counters.listeners_added += 1;
        self.record(format!("add_listener #{} {kind:?}", node.0));
        id
    }

    fn remove_listener(&mut self, listener: ListenerId) {
        if let Some((kind, node)) = self.listeners.remove(&listener) {
            self.counters.listeners_removed += 1;
            self.record(format!("remove_listener #{} {kind:?}", node.0));
        }
    }
}
