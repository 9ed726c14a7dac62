#![forbid(unsafe_code)]

//! The layer service: factory entry points and the pump.
//!
//! [`LayerService`] owns the host, every live layer, the timer queue, the
//! scroll lock, and the keyframe stylesheet. Nothing happens on its own: the
//! host drives the service by
//!
//! - calling a factory operation ([`dialog`](LayerService::dialog),
//!   [`alert`](LayerService::alert), ...),
//! - forwarding input through [`dispatch`](LayerService::dispatch),
//! - moving time with [`advance`](LayerService::advance) or
//!   [`tick`](LayerService::tick).
//!
//! Each of those ends with a [`pump`](LayerService::pump), which applies
//! queued handle commands, fires due timers, and polls suspended
//! resolutions until nothing more can progress.
//!
//! # Callback selection
//!
//! A trigger resolves through the callback registered on the handle, or
//! closes when there is none. If the configuration also carries a
//! `<trigger>Callback`, that callback runs next with the same payload and the
//! layer closes whatever either answers; a pending answer is still awaited
//! first.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | container or slot missing at mount | factory returns `Err`, no layer is created |
//! | content unit fails at open | the layer is torn down, `pump` returns `Err` |
//! | trigger while resolving | ignored, logged at `debug` |
//! | trigger on a destroyed layer | ignored |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::task::{Context, Waker};
use std::time::Duration;

use mlayer_core::{
    BuiltinKeyframes, ConfigValue, HostEvent, KeyframeSource, LayerHost, LayerId, LayerKind,
    LayerMount, ListenerKind, ListenerSet, ModalConfig, Resolution, Trigger, resolve,
};
use web_time::Instant;

use crate::animation::AnimationController;
use crate::error::LayerError;
use crate::handle::LayerHandle;
use crate::instance::{Env, LayerInstance, LayerPhase, Step};
use crate::registry::{Command, Registry};
use crate::scheduler::{Scheduler, Timer, TimerKind};
use crate::scroll_lock::ScrollLock;
use crate::settings::ServiceConfig;

/// Factory and lifecycle driver for modal layers.
pub struct LayerService<H: LayerHost> {
    host: H,
    settings: ServiceConfig,
    registry: Rc<RefCell<Registry>>,
    instances: BTreeMap<LayerId, LayerInstance>,
    scheduler: Scheduler,
    lock: ScrollLock,
    animation: AnimationController,
    last_tick: Option<Instant>,
}

impl<H: LayerHost> std::fmt::Debug for LayerService<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerService")
            .field("now", &self.scheduler.now())
            .field("layers", &self.instances.len())
            .field("timers", &self.scheduler.len())
            .field("lock", &self.lock)
            .finish()
    }
}

fn is_escape(key: &str) -> bool {
    matches!(key, "Escape" | "Esc")
}

impl<H: LayerHost> LayerService<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, ServiceConfig::default())
    }

    pub fn with_config(host: H, settings: ServiceConfig) -> Self {
        Self::with_keyframes(host, settings, Box::new(BuiltinKeyframes))
    }

    /// Use a custom keyframe table.
    pub fn with_keyframes(
        host: H,
        settings: ServiceConfig,
        keyframes: Box<dyn KeyframeSource>,
    ) -> Self {
        let lock = ScrollLock::new(settings.lock_policy, settings.lock_class.clone());
        let animation = AnimationController::new(
            settings.stylesheet_id.clone(),
            settings.lock_policy,
            keyframes,
        );
        Self {
            host,
            settings,
            registry: Rc::new(RefCell::new(Registry::default())),
            instances: BTreeMap::new(),
            scheduler: Scheduler::new(),
            lock,
            animation,
            last_tick: None,
        }
    }

    // --- Factory ---------------------------------------------------------

    pub fn dialog(&mut self, config: ModalConfig) -> Result<LayerHandle, LayerError> {
        self.open(LayerKind::Dialog, config)
    }

    pub fn alert(&mut self, config: ModalConfig) -> Result<LayerHandle, LayerError> {
        self.open(LayerKind::Alert, config)
    }

    pub fn confirm(&mut self, config: ModalConfig) -> Result<LayerHandle, LayerError> {
        self.open(LayerKind::Confirm, config)
    }

    /// Loading indicator; auto-cancels after 3 seconds unless `autoClose` is
    /// overridden.
    pub fn loading(&mut self, config: ModalConfig) -> Result<LayerHandle, LayerError> {
        self.open(LayerKind::Loading, config)
    }

    pub fn actions(&mut self, config: ModalConfig) -> Result<LayerHandle, LayerError> {
        self.open(LayerKind::Actions, config)
    }

    /// Create a layer of `kind`. The layer is mounted hidden and opens on
    /// the next pump.
    pub fn open(&mut self, kind: LayerKind, config: ModalConfig) -> Result<LayerHandle, LayerError> {
        let span = tracing::debug_span!("layer_open", kind = %kind);
        let _guard = span.enter();

        let config = resolve(&kind.defaults(), config, &self.settings.global_defaults);
        if let Some(before) = config.before_callback().cloned() {
            if before(config.data()).is_pending() {
                tracing::debug!("pending before callback dropped");
            }
        }

        let id = LayerId::next();
        let nodes = self.host.mount(&LayerMount {
            layer: id,
            kind,
            element_id: config.element_id(),
            container: config.container(),
            title: config.title(),
            sub_title: config.sub_title(),
            show_header: config.show_header(),
            show_close: config.show_close(),
            close_text: config.close_text(),
            confirm_text: config.confirm_text(),
            cancel_text: config.cancel_text(),
            header_styles: config.header_styles(),
        })?;

        let data = config.data().cloned();
        let on_esc = config.on_esc();
        let on_backdrop = config.on_backdrop();
        let auto_close = config.auto_close();

        let mut instance = LayerInstance::new(id, kind, config, nodes);
        if on_esc {
            let page = self.host.page_root();
            instance.listen(&mut self.host, ListenerKind::DocumentKeydown, page);
        }
        if on_backdrop {
            instance.listen(&mut self.host, ListenerKind::BackdropClick, nodes.root);
            instance.listen(&mut self.host, ListenerKind::BodyClickStop, nodes.body);
        }

        self.scheduler.schedule(id, TimerKind::Open, Duration::ZERO);
        if let Some(delay) = auto_close {
            self.scheduler.schedule(id, TimerKind::AutoClose, delay);
        }
        self.registry.borrow_mut().insert(id, data);
        self.instances.insert(id, instance);
        tracing::debug!(layer = %id, "layer created");
        Ok(LayerHandle::new(id, &self.registry))
    }

    // --- Driving -----------------------------------------------------------

    /// Deliver host input, then pump.
    pub fn dispatch(&mut self, event: HostEvent) -> Result<(), LayerError> {
        match event {
            HostEvent::KeyDown { key } => {
                if is_escape(&key) {
                    let targets: Vec<LayerId> = self
                        .instances
                        .iter()
                        .filter(|(_, layer)| layer.listens(ListenerSet::KEYDOWN))
                        .map(|(id, _)| *id)
                        .collect();
                    for id in targets {
                        self.trigger(id, Trigger::Cancel, None);
                    }
                }
            }
            HostEvent::KeyUp { layer, payload } => self.trigger(layer, Trigger::Check, payload),
            HostEvent::BackdropClick { layer } => {
                let listens = self
                    .instances
                    .get(&layer)
                    .is_some_and(|l| l.listens(ListenerSet::BACKDROP_CLICK));
                if listens {
                    self.trigger(layer, Trigger::Close, None);
                }
            }
            HostEvent::BodyClick { layer } => {
                tracing::trace!(layer = %layer, "body click stopped");
            }
            HostEvent::Action {
                layer,
                trigger,
                payload,
            } => self.trigger(layer, trigger, payload),
        }
        self.pump()
    }

    /// Apply queued commands, fire due timers, and poll suspended
    /// resolutions until nothing changes.
    pub fn pump(&mut self) -> Result<(), LayerError> {
        loop {
            let mut progressed = false;
            while let Some(command) = self.next_command() {
                progressed = true;
                self.apply_command(command);
            }
            while let Some(timer) = self.scheduler.pop_due() {
                progressed = true;
                self.fire(timer)?;
            }
            progressed |= self.poll_pending();
            if !progressed {
                return Ok(());
            }
        }
    }

    /// Move the virtual clock forward by `delta`, firing timers in order.
    ///
    /// An error stops the clock at the due time of the timer that failed;
    /// later timers fire on the next call.
    pub fn advance(&mut self, delta: Duration) -> Result<(), LayerError> {
        let target = self.scheduler.now() + delta;
        self.pump()?;
        while let Some(due) = self.scheduler.next_due() {
            if due > target {
                break;
            }
            self.scheduler.set_now(due);
            self.pump()?;
        }
        self.scheduler.set_now(target);
        self.pump()
    }

    /// Advance by the wall-clock time since the previous tick.
    pub fn tick(&mut self) -> Result<(), LayerError> {
        let now = Instant::now();
        let delta = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);
        self.advance(delta)
    }

    /// Tear down layers immediately, bypassing callbacks and animation: the
    /// first layer whose element id matches, or all layers for `None`.
    ///
    /// Returns the number of layers removed.
    pub fn remove(&mut self, element_id: Option<&str>) -> usize {
        let targets: Vec<LayerId> = match element_id {
            Some(wanted) => self
                .instances
                .iter()
                .find(|(_, layer)| layer.config().element_id() == Some(wanted))
                .map(|(id, _)| *id)
                .into_iter()
                .collect(),
            None => self.instances.keys().copied().collect(),
        };
        for id in &targets {
            self.destroy(*id);
        }
        targets.len()
    }

    // --- Queries -----------------------------------------------------------

    pub fn phase(&self, layer: LayerId) -> LayerPhase {
        self.instances
            .get(&layer)
            .map_or(LayerPhase::Destroyed, LayerInstance::phase)
    }

    /// Number of layers not yet destroyed.
    pub fn open_layers(&self) -> usize {
        self.instances.len()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn scroll_lock(&self) -> &ScrollLock {
        &self.lock
    }

    pub fn settings(&self) -> &ServiceConfig {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // --- Internals -----------------------------------------------------------

    fn parts(&mut self) -> (&mut BTreeMap<LayerId, LayerInstance>, Env<'_>) {
        (
            &mut self.instances,
            Env {
                host: &mut self.host,
                lock: &mut self.lock,
                animation: &mut self.animation,
                scheduler: &mut self.scheduler,
                settings: &self.settings,
            },
        )
    }

    fn next_command(&self) -> Option<Command> {
        self.registry.borrow_mut().pop()
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::Trigger {
                layer,
                trigger,
                payload,
            } => self.trigger(layer, trigger, payload),
            Command::Remove { element_id } => {
                let removed = self.remove(element_id.as_deref());
                tracing::debug!(removed, "layers removed");
            }
        }
    }

    fn fire(&mut self, timer: Timer) -> Result<(), LayerError> {
        let layer = timer.layer;
        tracing::trace!(layer = %layer, kind = ?timer.kind, "timer fired");
        match timer.kind {
            TimerKind::Open => {
                let (instances, mut env) = self.parts();
                let opened = match instances.get_mut(&layer) {
                    Some(instance) => instance.open(&mut env),
                    None => Ok(()),
                };
                if let Err(err) = opened {
                    tracing::warn!(layer = %layer, error = %err, "layer failed to open");
                    self.destroy(layer);
                    return Err(err);
                }
            }
            TimerKind::Settle => {
                let (instances, mut env) = self.parts();
                let after = instances.get_mut(&layer).and_then(|instance| {
                    if !instance.settle(&mut env) {
                        return None;
                    }
                    let config = instance.config();
                    let after = config.after_callback().cloned()?;
                    Some((after, config.data().cloned()))
                });
                if let Some((after, data)) = after {
                    let _ = after(data.as_ref());
                }
            }
            TimerKind::AutoClose => self.trigger(layer, Trigger::Cancel, None),
            TimerKind::Destroy => self.destroy(layer),
        }
        self.sync(layer);
        Ok(())
    }

    fn trigger(&mut self, layer: LayerId, trigger: Trigger, payload: Option<ConfigValue>) {
        let Some(instance) = self.instances.get_mut(&layer) else {
            tracing::trace!(layer = %layer, %trigger, "trigger on destroyed layer ignored");
            return;
        };
        if instance.phase() == LayerPhase::Resolving {
            tracing::debug!(layer = %layer, %trigger, "layer already resolving; trigger ignored");
            return;
        }
        if !instance.begin_resolving() {
            tracing::trace!(layer = %layer, %trigger, phase = %instance.phase(), "trigger ignored");
            return;
        }

        let configured = instance.config().trigger_callback(trigger).cloned();
        let forced = configured.is_some();
        let registered = self.registry.borrow().callback(layer, trigger);
        let mut resolution = match registered {
            Some(callback) => callback(payload.as_ref()),
            None => Resolution::Close,
        };
        if let Some(configured) = configured {
            let answer = configured(payload.as_ref());
            if answer.is_pending() {
                if resolution.is_pending() {
                    tracing::debug!(layer = %layer, %trigger, "second pending answer dropped");
                } else {
                    resolution = answer;
                }
            }
        }

        let step = instance.apply(resolution, forced);
        tracing::debug!(layer = %layer, %trigger, ?step, forced, "trigger resolved");
        if step == Step::Close {
            self.close(layer);
        }
        self.sync(layer);
    }

    fn close(&mut self, layer: LayerId) {
        let (instances, mut env) = self.parts();
        if let Some(instance) = instances.get_mut(&layer) {
            instance.begin_close(&mut env);
        }
    }

    fn destroy(&mut self, layer: LayerId) {
        let (instances, mut env) = self.parts();
        if let Some(mut instance) = instances.remove(&layer) {
            instance.destroy(&mut env);
        }
        self.registry.borrow_mut().remove(layer);
    }

    /// Poll every suspended resolution once. Returns whether any settled.
    fn poll_pending(&mut self) -> bool {
        let mut cx = Context::from_waker(Waker::noop());
        let settled: Vec<(LayerId, Step)> = self
            .instances
            .iter_mut()
            .filter(|(_, layer)| layer.is_suspended())
            .filter_map(|(id, layer)| layer.poll_pending(&mut cx).map(|step| (*id, step)))
            .collect();
        for &(layer, step) in &settled {
            tracing::debug!(layer = %layer, ?step, "pending resolution settled");
            if step == Step::Close {
                self.close(layer);
            }
            self.sync(layer);
        }
        !settled.is_empty()
    }

    fn sync(&self, layer: LayerId) {
        if let Some(instance) = self.instances.get(&layer) {
            self.registry
                .borrow_mut()
                .set_phase(layer, instance.phase());
        }
    }
}
