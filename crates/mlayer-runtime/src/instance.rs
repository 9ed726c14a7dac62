#![forbid(unsafe_code)]

//! One live layer and its state machine.
//!
//! ```text
//! CREATED ──open──▶ OPENING ──settle──▶ VISIBLE ──trigger──▶ RESOLVING
//!                                          ▲                    │ │
//!                                          └──────── stay ──────┘ │ close
//!                                                                 ▼
//!                               DESTROYED ◀──destroy── CLOSING ◀──┘
//! ```
//!
//! A trigger may arrive before the layer is visible. RESOLVING then remembers
//! the lifecycle phase it interrupted (`resume`), and the open and settle
//! steps keep advancing that remembered phase so a "stay" answer lands where
//! the layer would have been anyway.
//!
//! # Invariants
//!
//! - The scroll lock is acquired once, in the open step, and released once,
//!   in the destroy step, only if it was acquired.
//! - Every registered listener is removed in the destroy step.
//! - DESTROYED is terminal; every step is a no-op afterwards.

use std::fmt;
use std::task::{Context, Poll};
use std::time::Duration;

use mlayer_core::position;
use mlayer_core::{
    LayerHost, LayerId, LayerKind, LayerNodes, ListenerId, ListenerKind, ListenerSet,
    NodeId, PendingResolution, Resolution, ResolvedConfig, TemplateRef,
};

use crate::animation::{AnimationController, Direction};
use crate::error::LayerError;
use crate::scheduler::{Scheduler, TimerKind};
use crate::scroll_lock::ScrollLock;
use crate::settings::ServiceConfig;

/// Lifecycle phase of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerPhase {
    Created,
    Opening,
    Visible,
    Resolving,
    Closing,
    Destroyed,
}

impl LayerPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Opening => "opening",
            Self::Visible => "visible",
            Self::Resolving => "resolving",
            Self::Closing => "closing",
            Self::Destroyed => "destroyed",
        }
    }

    /// Whether the layer can still be triggered.
    #[inline]
    pub const fn accepts_triggers(self) -> bool {
        matches!(self, Self::Created | Self::Opening | Self::Visible)
    }
}

impl fmt::Display for LayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed service state the state machine steps need.
pub(crate) struct Env<'a> {
    pub host: &'a mut dyn LayerHost,
    pub lock: &'a mut ScrollLock,
    pub animation: &'a mut AnimationController,
    pub scheduler: &'a mut Scheduler,
    pub settings: &'a ServiceConfig,
}

/// What a resolution asks the service to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Close,
    Stay,
    Suspended,
}

struct PendingClose {
    future: PendingResolution,
    forced: bool,
}

pub(crate) struct LayerInstance {
    id: LayerId,
    kind: LayerKind,
    config: ResolvedConfig,
    nodes: LayerNodes,
    phase: LayerPhase,
    resume: LayerPhase,
    shown: bool,
    listeners: Vec<(ListenerKind, ListenerId)>,
    listener_set: ListenerSet,
    pending: Option<PendingClose>,
    holds_lock: bool,
    holds_sheet: bool,
}

impl fmt::Debug for LayerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("phase", &self.phase)
            .field("listeners", &self.listener_set)
            .field("pending", &self.pending.is_some())
            .field("holds_lock", &self.holds_lock)
            .finish()
    }
}

impl LayerInstance {
    pub fn new(id: LayerId, kind: LayerKind, config: ResolvedConfig, nodes: LayerNodes) -> Self {
        Self {
            id,
            kind,
            config,
            nodes,
            phase: LayerPhase::Created,
            resume: LayerPhase::Created,
            shown: false,
            listeners: Vec::new(),
            listener_set: ListenerSet::empty(),
            pending: None,
            holds_lock: false,
            holds_sheet: false,
        }
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[inline]
    pub fn phase(&self) -> LayerPhase {
        self.phase
    }

    #[inline]
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    #[inline]
    pub fn listens(&self, set: ListenerSet) -> bool {
        self.listener_set.contains(set)
    }

    /// The open/visible progress, looking through RESOLVING.
    fn lifecycle(&self) -> LayerPhase {
        if self.phase == LayerPhase::Resolving {
            self.resume
        } else {
            self.phase
        }
    }

    fn set_lifecycle(&mut self, to: LayerPhase) {
        if self.phase == LayerPhase::Resolving {
            self.resume = to;
        } else {
            self.phase = to;
        }
        tracing::debug!(layer = %self.id, phase = %to, "layer phase");
    }

    fn animate_time(&self, settings: &ServiceConfig) -> Duration {
        self.config
            .animate_time()
            .unwrap_or(settings.default_animate_time)
    }

    pub fn listen(&mut self, host: &mut dyn LayerHost, kind: ListenerKind, node: NodeId) {
        let id = host.add_listener(kind, node);
        self.listeners.push((kind, id));
        self.listener_set |= kind.flag();
        tracing::trace!(layer = %self.id, ?kind, "listener added");
    }

    /// CREATED → OPENING: style the nodes, insert content, lock scrolling.
    pub fn open(&mut self, env: &mut Env<'_>) -> Result<(), LayerError> {
        if self.lifecycle() != LayerPhase::Created {
            return Ok(());
        }
        let host = &mut *env.host;
        let LayerNodes { root, body, content } = self.nodes;

        for class in self.config.modal_classes() {
            host.add_class(root, class);
        }
        if let Some(width) = self.config.width() {
            host.set_style(body, "width", &width);
        }
        if let Some(height) = self.config.height() {
            host.set_style(body, "height", &height);
        }
        for (property, value) in self.config.body_styles() {
            host.set_style(body, &property, &value);
        }

        match self.config.template() {
            TemplateRef::Content(handle) => {
                if let Some(data) = self.config.data() {
                    handle.bind_data(data);
                }
                host.insert_content(content, handle)?;
            }
            TemplateRef::Markup(markup) => host.insert_markup(content, markup),
            TemplateRef::Empty => {}
        }

        env.lock.acquire(host);
        self.holds_lock = true;
        self.set_lifecycle(LayerPhase::Opening);
        env.scheduler
            .schedule(self.id, TimerKind::Settle, env.settings.settle_delay);
        Ok(())
    }

    /// OPENING → VISIBLE: show, animate in, position.
    ///
    /// Returns whether the layer became visible.
    pub fn settle(&mut self, env: &mut Env<'_>) -> bool {
        if self.lifecycle() != LayerPhase::Opening {
            return false;
        }
        let host = &mut *env.host;
        let body = self.nodes.body;
        host.set_visible(self.nodes.root, true);

        if let Some(preset) = self.config.animate() {
            let duration = self.animate_time(env.settings);
            env.animation.play(
                host,
                body,
                &preset,
                Direction::Enter,
                duration,
                &mut self.holds_sheet,
            );
        }

        if let Some(spec) = self.config.position() {
            let viewport = host.client_height(host.page_root());
            let content = host.client_height(body);
            let style = position::compute(&spec, viewport, content);
            for (property, value) in style.declarations() {
                host.set_style(body, property, &value);
            }
        }

        self.shown = true;
        self.set_lifecycle(LayerPhase::Visible);
        true
    }

    /// Enter RESOLVING. Fails if the layer does not accept triggers.
    pub fn begin_resolving(&mut self) -> bool {
        if !self.phase.accepts_triggers() {
            return false;
        }
        self.resume = self.phase;
        self.phase = LayerPhase::Resolving;
        tracing::debug!(layer = %self.id, resume = %self.resume, "layer resolving");
        true
    }

    /// Apply a callback's answer. With `forced`, every answer closes; a
    /// pending answer still waits for its future first.
    pub fn apply(&mut self, resolution: Resolution, forced: bool) -> Step {
        match resolution {
            Resolution::Close => Step::Close,
            Resolution::Stay if forced => Step::Close,
            Resolution::Stay => {
                self.stay();
                Step::Stay
            }
            Resolution::Pending(future) => {
                self.pending = Some(PendingClose { future, forced });
                Step::Suspended
            }
        }
    }

    fn stay(&mut self) {
        if self.phase == LayerPhase::Resolving {
            self.phase = self.resume;
            tracing::debug!(layer = %self.id, phase = %self.phase, "layer stays open");
        }
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }

    /// Poll the pending resolution once.
    pub fn poll_pending(&mut self, cx: &mut Context<'_>) -> Option<Step> {
        let pending = self.pending.as_mut()?;
        match pending.future.as_mut().poll(cx) {
            Poll::Ready(close) => {
                let forced = pending.forced;
                self.pending = None;
                if close || forced {
                    Some(Step::Close)
                } else {
                    self.stay();
                    Some(Step::Stay)
                }
            }
            Poll::Pending => None,
        }
    }

    /// → CLOSING: play the exit animation and schedule destruction.
    pub fn begin_close(&mut self, env: &mut Env<'_>) {
        if matches!(self.phase, LayerPhase::Closing | LayerPhase::Destroyed) {
            return;
        }
        self.pending = None;
        self.phase = LayerPhase::Closing;
        tracing::debug!(layer = %self.id, phase = %self.phase, "layer phase");

        let delay = self.animate_time(env.settings);
        let preset = if self.shown { self.config.animate() } else { None };
        if let Some(preset) = preset {
            env.animation.play(
                &mut *env.host,
                self.nodes.body,
                &preset,
                Direction::Exit,
                delay,
                &mut self.holds_sheet,
            );
        }
        env.scheduler.schedule(self.id, TimerKind::Destroy, delay);
    }

    /// → DESTROYED: release everything the layer holds and unmount it.
    pub fn destroy(&mut self, env: &mut Env<'_>) {
        if self.phase == LayerPhase::Destroyed {
            return;
        }
        let host = &mut *env.host;
        if self.holds_lock {
            env.lock.release(host);
            self.holds_lock = false;
        }
        if self.holds_sheet {
            env.animation.release(host);
            self.holds_sheet = false;
        }
        for (kind, listener) in self.listeners.drain(..) {
            host.remove_listener(listener);
            tracing::trace!(layer = %self.id, ?kind, "listener removed");
        }
        self.listener_set = ListenerSet::empty();
        host.unmount(&self.nodes);
        env.scheduler.cancel_layer(self.id);
        self.pending = None;
        self.phase = LayerPhase::Destroyed;
        tracing::debug!(layer = %self.id, kind = %self.kind, "layer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlayer_core::{BuiltinKeyframes, LayerMount, ModalConfig, resolve};
    use mlayer_harness::MockHost;

    use crate::settings::LockPolicy;

    struct Rig {
        host: MockHost,
        lock: ScrollLock,
        animation: AnimationController,
        scheduler: Scheduler,
        settings: ServiceConfig,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                host: MockHost::new().with_scrollbar(15.0),
                lock: ScrollLock::new(LockPolicy::RefCounted, "no-scroll"),
                animation: AnimationController::new(
                    "kf",
                    LockPolicy::RefCounted,
                    Box::new(BuiltinKeyframes),
                ),
                scheduler: Scheduler::new(),
                settings: ServiceConfig::default(),
            }
        }

        fn env(&mut self) -> Env<'_> {
            Env {
                host: &mut self.host,
                lock: &mut self.lock,
                animation: &mut self.animation,
                scheduler: &mut self.scheduler,
                settings: &self.settings,
            }
        }

        fn instance(&mut self, kind: LayerKind, caller: ModalConfig) -> LayerInstance {
            let config = resolve(&kind.defaults(), caller, &self.settings.global_defaults);
            let id = LayerId::next();
            let nodes = self
                .host
                .mount(&LayerMount {
                    layer: id,
                    kind,
                    element_id: None,
                    container: None,
                    title: None,
                    sub_title: None,
                    show_header: false,
                    show_close: false,
                    close_text: None,
                    confirm_text: None,
                    cancel_text: None,
                    header_styles: Vec::new(),
                })
                .expect("mount");
            LayerInstance::new(id, kind, config, nodes)
        }
    }

    #[test]
    fn full_lifecycle_pairs_lock() {
        let mut rig = Rig::new();
        let mut layer = rig.instance(LayerKind::Alert, ModalConfig::new());

        layer.open(&mut rig.env()).expect("open");
        assert_eq!(layer.phase(), LayerPhase::Opening);
        assert_eq!(rig.lock.holders(), 1);

        assert!(layer.settle(&mut rig.env()));
        assert_eq!(layer.phase(), LayerPhase::Visible);

        assert!(layer.begin_resolving());
        assert_eq!(layer.apply(Resolution::Close, false), Step::Close);
        layer.begin_close(&mut rig.env());
        assert_eq!(layer.phase(), LayerPhase::Closing);

        layer.destroy(&mut rig.env());
        assert_eq!(layer.phase(), LayerPhase::Destroyed);
        assert_eq!((rig.lock.acquisitions(), rig.lock.releases()), (1, 1));

        layer.destroy(&mut rig.env());
        assert_eq!(rig.lock.releases(), 1);
    }

    #[test]
    fn stay_returns_to_previous_phase() {
        let mut rig = Rig::new();
        let mut layer = rig.instance(LayerKind::Confirm, ModalConfig::new());
        layer.open(&mut rig.env()).expect("open");
        layer.settle(&mut rig.env());

        assert!(layer.begin_resolving());
        assert!(!layer.begin_resolving());
        assert_eq!(layer.apply(Resolution::Stay, false), Step::Stay);
        assert_eq!(layer.phase(), LayerPhase::Visible);
    }

    #[test]
    fn forced_stay_closes() {
        let mut rig = Rig::new();
        let mut layer = rig.instance(LayerKind::Confirm, ModalConfig::new());
        assert!(layer.begin_resolving());
        assert_eq!(layer.apply(Resolution::Stay, true), Step::Close);
    }

    #[test]
    fn opening_advances_through_resolving() {
        let mut rig = Rig::new();
        let mut layer = rig.instance(LayerKind::Dialog, ModalConfig::new());
        assert!(layer.begin_resolving());
        layer.open(&mut rig.env()).expect("open");
        assert_eq!(layer.phase(), LayerPhase::Resolving);
        assert_eq!(layer.apply(Resolution::Stay, false), Step::Stay);
        assert_eq!(layer.phase(), LayerPhase::Opening);
    }

    #[test]
    fn closing_before_open_never_locks() {
        let mut rig = Rig::new();
        let mut layer = rig.instance(LayerKind::Alert, ModalConfig::new());
        layer.begin_close(&mut rig.env());
        layer.open(&mut rig.env()).expect("open is a no-op");
        layer.destroy(&mut rig.env());
        assert_eq!((rig.lock.acquisitions(), rig.lock.releases()), (0, 0));
        assert_eq!(rig.host.mounted_layers(), 0);
    }

    #[test]
    fn settle_applies_position_and_sizes() {
        let mut rig = Rig::new();
        rig.host.set_viewport_height(800.0);
        let mut layer = rig.instance(
            LayerKind::Actions,
            ModalConfig::new().position("bottom-20"),
        );
        rig.host.set_client_height(layer.nodes.body, 300.0);

        layer.open(&mut rig.env()).expect("open");
        layer.settle(&mut rig.env());
        let body = layer.nodes.body;
        assert_eq!(rig.host.style(body, "margin-top").as_deref(), Some("480px"));
        assert_eq!(rig.host.style(body, "width").as_deref(), Some("30%"));
    }

    #[test]
    fn destroy_releases_listeners() {
        let mut rig = Rig::new();
        let mut layer = rig.instance(LayerKind::Alert, ModalConfig::new());
        let page = rig.host.page_root();
        layer.listen(&mut rig.host, ListenerKind::DocumentKeydown, page);
        assert!(layer.listens(ListenerSet::KEYDOWN));
        assert_eq!(rig.host.active_listeners(), 1);
        layer.destroy(&mut rig.env());
        assert_eq!(rig.host.active_listeners(), 0);
        assert!(!layer.listens(ListenerSet::KEYDOWN));
    }
}
