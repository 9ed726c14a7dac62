#![forbid(unsafe_code)]

//! Layer configuration: the caller-facing builder, the global defaults, and the
//! resolver producing an immutable [`ResolvedConfig`].
//!
//! # Merge rule
//!
//! `resolve(type_defaults, caller, global_defaults)` starts from the caller's
//! options, then fills every key the caller left *absent* from the type
//! defaults, then from the global defaults. A key explicitly set to `false`,
//! `null` or `0` is present and survives the merge; "no cancel button" is
//! expressed exactly that way.
//!
//! Callbacks and the content handle are typed slots that follow the same rule.
//!
//! No validation happens here. A malformed value is stored as given and
//! surfaces in whichever component reads it.

use std::time::Duration;

use ahash::AHashMap;

use crate::callback::{LayerCallback, Resolution, Trigger, callback};
use crate::content::ContentHandle;
use crate::value::{ConfigValue, px};

/// Recognized option keys.
pub mod keys {
    pub const ELEMENT_ID: &str = "elementId";
    pub const CONTAINER_EL: &str = "containerEl";
    pub const MODAL_CLASS: &str = "modalClass";
    pub const MODAL_BODY_STYLES: &str = "modalBodyStyles";
    pub const MODAL_HEADER_STYLES: &str = "modalHeaderStyles";
    pub const TEMPLATE: &str = "template";
    pub const DATA: &str = "data";
    pub const TITLE: &str = "title";
    pub const SUB_TITLE: &str = "subTitle";
    pub const HEADER: &str = "header";
    pub const CLOSE: &str = "close";
    pub const CLOSE_TEXT: &str = "closeText";
    pub const CONFIRM_TEXT: &str = "confirmText";
    pub const CANCEL_TEXT: &str = "cancelText";
    pub const ANIMATE: &str = "animate";
    pub const ANIMATE_TIME: &str = "animateTime";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const POSITION: &str = "position";
    pub const AUTO_CLOSE: &str = "autoClose";
    pub const ON_ESC: &str = "onEsc";
    pub const ON_BACKDROP: &str = "onBackdrop";
    pub const BEFORE_CALLBACK: &str = "beforeCallback";
    pub const AFTER_CALLBACK: &str = "afterCallback";
    pub const CLOSE_CALLBACK: &str = "closeCallback";
    pub const CANCEL_CALLBACK: &str = "cancelCallback";
    pub const CONFIRM_CALLBACK: &str = "confirmCallback";
    pub const CHECK_CALLBACK: &str = "checkCallback";
}

/// Lifecycle hooks and per-trigger callbacks.
#[derive(Clone, Default)]
struct CallbackSlots {
    before: Option<LayerCallback>,
    after: Option<LayerCallback>,
    confirm: Option<LayerCallback>,
    cancel: Option<LayerCallback>,
    close: Option<LayerCallback>,
    check: Option<LayerCallback>,
}

impl CallbackSlots {
    fn slot(&self, trigger: Trigger) -> &Option<LayerCallback> {
        match trigger {
            Trigger::Confirm => &self.confirm,
            Trigger::Cancel => &self.cancel,
            Trigger::Close => &self.close,
            Trigger::Check => &self.check,
        }
    }

    fn slot_mut(&mut self, trigger: Trigger) -> &mut Option<LayerCallback> {
        match trigger {
            Trigger::Confirm => &mut self.confirm,
            Trigger::Cancel => &mut self.cancel,
            Trigger::Close => &mut self.close,
            Trigger::Check => &mut self.check,
        }
    }

    fn fill_from(&mut self, other: &Self) {
        fill(&mut self.before, &other.before);
        fill(&mut self.after, &other.after);
        for trigger in Trigger::ALL {
            fill(self.slot_mut(trigger), other.slot(trigger));
        }
    }
}

fn fill<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

/// Caller-supplied (or default) layer options.
///
/// Absent keys are simply not stored. Every setter marks its key present.
#[derive(Clone, Default)]
pub struct ModalConfig {
    values: AHashMap<String, ConfigValue>,
    content: Option<ContentHandle>,
    callbacks: CallbackSlots,
}

impl ModalConfig {
    /// Create an empty configuration (every key absent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Library-wide defaults applied beneath every layer kind.
    pub fn global_defaults() -> Self {
        Self::new()
            .modal_class("")
            .title("Notice")
            .set(keys::HEADER, true)
            .close(true)
            .cancel_text("Cancel")
            .confirm_text("OK")
            .position("center")
            .animate("zoom")
            .animate_time(300)
            .set(keys::TEMPLATE, ConfigValue::Null)
            .set(keys::WIDTH, ConfigValue::Null)
            .set(keys::HEIGHT, ConfigValue::Null)
            .set(keys::AUTO_CLOSE, ConfigValue::Null)
            .on_esc(true)
            .on_backdrop(false)
    }

    /// Set any key, recognized or not.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Raw value for a key, `None` if absent.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key) || self.has_typed_slot(key)
    }

    fn has_typed_slot(&self, key: &str) -> bool {
        match key {
            keys::BEFORE_CALLBACK => self.callbacks.before.is_some(),
            keys::AFTER_CALLBACK => self.callbacks.after.is_some(),
            keys::TEMPLATE => self.content.is_some(),
            other => Trigger::ALL
                .iter()
                .any(|t| t.callback_key() == other && self.callbacks.slot(*t).is_some()),
        }
    }

    pub fn element_id(self, id: impl Into<String>) -> Self {
        self.set(keys::ELEMENT_ID, id.into())
    }

    pub fn container(self, selector: impl Into<String>) -> Self {
        self.set(keys::CONTAINER_EL, selector.into())
    }

    pub fn modal_class(self, class: impl Into<String>) -> Self {
        self.set(keys::MODAL_CLASS, class.into())
    }

    pub fn body_styles<K, V, I>(self, styles: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.set(keys::MODAL_BODY_STYLES, ConfigValue::map(styles))
    }

    pub fn header_styles<K, V, I>(self, styles: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.set(keys::MODAL_HEADER_STYLES, ConfigValue::map(styles))
    }

    /// Use a markup string as body content.
    pub fn template(self, markup: impl Into<String>) -> Self {
        self.set(keys::TEMPLATE, markup.into())
    }

    /// Use an externally rendered content unit as body content.
    pub fn content(mut self, content: ContentHandle) -> Self {
        self.content = Some(content);
        self
    }

    pub fn data(self, data: impl Into<ConfigValue>) -> Self {
        self.set(keys::DATA, data)
    }

    pub fn title(self, title: impl Into<ConfigValue>) -> Self {
        self.set(keys::TITLE, title)
    }

    pub fn sub_title(self, sub_title: impl Into<ConfigValue>) -> Self {
        self.set(keys::SUB_TITLE, sub_title)
    }

    pub fn close(self, show: bool) -> Self {
        self.set(keys::CLOSE, show)
    }

    pub fn close_text(self, text: impl Into<ConfigValue>) -> Self {
        self.set(keys::CLOSE_TEXT, text)
    }

    pub fn confirm_text(self, text: impl Into<ConfigValue>) -> Self {
        self.set(keys::CONFIRM_TEXT, text)
    }

    pub fn cancel_text(self, text: impl Into<ConfigValue>) -> Self {
        self.set(keys::CANCEL_TEXT, text)
    }

    pub fn animate(self, preset: impl Into<ConfigValue>) -> Self {
        self.set(keys::ANIMATE, preset)
    }

    pub fn animate_time(self, millis: i64) -> Self {
        self.set(keys::ANIMATE_TIME, millis)
    }

    pub fn width(self, width: impl Into<ConfigValue>) -> Self {
        self.set(keys::WIDTH, width)
    }

    pub fn height(self, height: impl Into<ConfigValue>) -> Self {
        self.set(keys::HEIGHT, height)
    }

    pub fn position(self, position: impl Into<ConfigValue>) -> Self {
        self.set(keys::POSITION, position)
    }

    pub fn auto_close(self, millis: impl Into<ConfigValue>) -> Self {
        self.set(keys::AUTO_CLOSE, millis)
    }

    pub fn on_esc(self, enabled: bool) -> Self {
        self.set(keys::ON_ESC, enabled)
    }

    pub fn on_backdrop(self, enabled: bool) -> Self {
        self.set(keys::ON_BACKDROP, enabled)
    }

    /// Hook run before the layer is created. Its result is ignored.
    pub fn before_callback<F, R>(mut self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.callbacks.before = Some(callback(f));
        self
    }

    /// Hook run once the layer has settled and is visible. Its result is ignored.
    pub fn after_callback<F, R>(mut self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.callbacks.after = Some(callback(f));
        self
    }

    pub fn confirm_callback<F, R>(self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.trigger_callback(Trigger::Confirm, callback(f))
    }

    pub fn cancel_callback<F, R>(self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.trigger_callback(Trigger::Cancel, callback(f))
    }

    pub fn close_callback<F, R>(self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.trigger_callback(Trigger::Close, callback(f))
    }

    pub fn check_callback<F, R>(self, f: F) -> Self
    where
        F: Fn(Option<&ConfigValue>) -> R + 'static,
        R: Into<Resolution>,
    {
        self.trigger_callback(Trigger::Check, callback(f))
    }

    /// Install an already wrapped callback for a trigger.
    pub fn trigger_callback(mut self, trigger: Trigger, cb: LayerCallback) -> Self {
        *self.callbacks.slot_mut(trigger) = Some(cb);
        self
    }

    /// Fill every absent key from `lower`.
    fn fill_from(&mut self, lower: &ModalConfig) {
        for (key, value) in &lower.values {
            if !self.values.contains_key(key) {
                self.values.insert(key.clone(), value.clone());
            }
        }
        fill(&mut self.content, &lower.content);
        self.callbacks.fill_from(&lower.callbacks);
    }
}

impl std::fmt::Debug for ModalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("ModalConfig")
            .field("keys", &keys)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

/// Merge caller options over type defaults over global defaults.
pub fn resolve(
    type_defaults: &ModalConfig,
    caller: ModalConfig,
    global_defaults: &ModalConfig,
) -> ResolvedConfig {
    let mut merged = caller;
    merged.fill_from(type_defaults);
    merged.fill_from(global_defaults);
    #[cfg(feature = "tracing")]
    tracing::trace!(keys = merged.values.len(), "resolved layer configuration");
    ResolvedConfig { inner: merged }
}

/// Body content after resolution.
#[derive(Debug, Clone, Copy)]
pub enum TemplateRef<'a> {
    /// Content unit rendered by an external collaborator.
    Content(&'a ContentHandle),
    /// Static markup fragment.
    Markup(&'a str),
    /// Nothing to insert.
    Empty,
}

/// Immutable, fully merged layer configuration.
///
/// Typed accessors interpret falsy values; [`get`](Self::get) returns the raw
/// value exactly as merged.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    inner: ModalConfig,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.inner.get(key)
    }

    /// Whether the key (value, callback, or content slot) is present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn truthy(&self, key: &str) -> Option<&ConfigValue> {
        self.get(key).filter(|v| v.is_truthy())
    }

    fn text(&self, key: &str) -> Option<String> {
        self.truthy(key).and_then(ConfigValue::to_css)
    }

    fn flag(&self, key: &str, absent: bool) -> bool {
        self.get(key).map_or(absent, ConfigValue::is_truthy)
    }

    pub fn element_id(&self) -> Option<&str> {
        self.truthy(keys::ELEMENT_ID).and_then(ConfigValue::as_str)
    }

    /// Container selector; `None` means the document body.
    pub fn container(&self) -> Option<&str> {
        self.truthy(keys::CONTAINER_EL).and_then(ConfigValue::as_str)
    }

    /// Layout classes, split on whitespace.
    pub fn modal_classes(&self) -> Vec<&str> {
        self.truthy(keys::MODAL_CLASS)
            .and_then(ConfigValue::as_str)
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    fn style_map(&self, key: &str) -> Vec<(String, String)> {
        self.get(key)
            .and_then(ConfigValue::as_map)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.to_css().map(|css| (k.clone(), css)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn body_styles(&self) -> Vec<(String, String)> {
        self.style_map(keys::MODAL_BODY_STYLES)
    }

    pub fn header_styles(&self) -> Vec<(String, String)> {
        self.style_map(keys::MODAL_HEADER_STYLES)
    }

    pub fn template(&self) -> TemplateRef<'_> {
        if let Some(content) = &self.inner.content {
            return TemplateRef::Content(content);
        }
        match self.get(keys::TEMPLATE) {
            Some(ConfigValue::Str(s)) if !s.is_empty() => TemplateRef::Markup(s),
            _ => TemplateRef::Empty,
        }
    }

    pub fn data(&self) -> Option<&ConfigValue> {
        self.get(keys::DATA)
    }

    pub fn title(&self) -> Option<String> {
        self.text(keys::TITLE)
    }

    pub fn sub_title(&self) -> Option<String> {
        self.text(keys::SUB_TITLE)
    }

    /// Header row visibility: the `header` flag and a truthy title.
    pub fn show_header(&self) -> bool {
        self.flag(keys::HEADER, true) && self.title().is_some()
    }

    pub fn show_close(&self) -> bool {
        self.flag(keys::CLOSE, false)
    }

    pub fn close_text(&self) -> Option<String> {
        self.text(keys::CLOSE_TEXT)
    }

    pub fn confirm_text(&self) -> Option<String> {
        self.text(keys::CONFIRM_TEXT)
    }

    pub fn cancel_text(&self) -> Option<String> {
        self.text(keys::CANCEL_TEXT)
    }

    /// Animation preset name, lowercased. `None` when falsy.
    pub fn animate(&self) -> Option<String> {
        self.truthy(keys::ANIMATE)
            .and_then(ConfigValue::as_str)
            .map(str::to_ascii_lowercase)
    }

    /// Exit delay. `None` if absent or not a non-negative number.
    pub fn animate_time(&self) -> Option<Duration> {
        millis(self.get(keys::ANIMATE_TIME)?)
    }

    pub fn width(&self) -> Option<String> {
        self.length(keys::WIDTH)
    }

    pub fn height(&self) -> Option<String> {
        self.length(keys::HEIGHT)
    }

    /// Bare numbers become pixels; other strings pass through as CSS.
    fn length(&self, key: &str) -> Option<String> {
        match self.truthy(key)? {
            ConfigValue::Int(i) => Some(px(*i as f64)),
            ConfigValue::Float(f) => Some(px(*f)),
            ConfigValue::Str(s) if s.bytes().all(|b| b.is_ascii_digit()) => Some(format!("{s}px")),
            other => other.to_css(),
        }
    }

    /// Position spec as a string; `None` disables positioning.
    pub fn position(&self) -> Option<String> {
        self.text(keys::POSITION)
    }

    /// Auto-close delay, only for positive values.
    pub fn auto_close(&self) -> Option<Duration> {
        self.truthy(keys::AUTO_CLOSE)
            .and_then(millis)
            .filter(|d| !d.is_zero())
    }

    pub fn on_esc(&self) -> bool {
        self.flag(keys::ON_ESC, true)
    }

    pub fn on_backdrop(&self) -> bool {
        self.flag(keys::ON_BACKDROP, false)
    }

    pub fn before_callback(&self) -> Option<&LayerCallback> {
        self.inner.callbacks.before.as_ref()
    }

    pub fn after_callback(&self) -> Option<&LayerCallback> {
        self.inner.callbacks.after.as_ref()
    }

    /// The configured callback for a trigger, if the key is present.
    pub fn trigger_callback(&self, trigger: Trigger) -> Option<&LayerCallback> {
        self.inner.callbacks.slot(trigger).as_ref()
    }
}

fn millis(value: &ConfigValue) -> Option<Duration> {
    let ms = value.as_f64()?;
    (ms >= 0.0).then(|| Duration::from_millis(ms.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_over_globals(kind: ModalConfig, caller: ModalConfig) -> ResolvedConfig {
        resolve(&kind, caller, &ModalConfig::global_defaults())
    }

    #[test]
    fn caller_overrides_type_overrides_global() {
        let kind = ModalConfig::new().modal_class("modal-alert").animate("zoom");
        let caller = ModalConfig::new().animate("top");
        let cfg = resolve_over_globals(kind, caller);
        assert_eq!(cfg.animate().as_deref(), Some("top"));
        assert_eq!(cfg.modal_classes(), vec!["modal-alert"]);
        assert_eq!(cfg.confirm_text().as_deref(), Some("OK"));
    }

    #[test]
    fn explicit_falsy_values_survive() {
        let caller = ModalConfig::new()
            .cancel_text(false)
            .title(ConfigValue::Null)
            .auto_close(0);
        let cfg = resolve_over_globals(ModalConfig::new(), caller);
        assert_eq!(cfg.get(keys::CANCEL_TEXT), Some(&ConfigValue::Bool(false)));
        assert_eq!(cfg.get(keys::TITLE), Some(&ConfigValue::Null));
        assert_eq!(cfg.get(keys::AUTO_CLOSE), Some(&ConfigValue::Int(0)));
        assert_eq!(cfg.cancel_text(), None);
        assert!(!cfg.show_header());
        assert_eq!(cfg.auto_close(), None);
    }

    #[test]
    fn unknown_keys_pass_through() {
        let caller = ModalConfig::new().set("routerLink", "/home");
        let cfg = resolve_over_globals(ModalConfig::new(), caller);
        assert_eq!(cfg.get("routerLink").and_then(ConfigValue::as_str), Some("/home"));
    }

    #[test]
    fn lengths_become_pixels() {
        let cfg = resolve_over_globals(
            ModalConfig::new(),
            ModalConfig::new().width(550).height("320"),
        );
        assert_eq!(cfg.width().as_deref(), Some("550px"));
        assert_eq!(cfg.height().as_deref(), Some("320px"));

        let cfg = resolve_over_globals(ModalConfig::new(), ModalConfig::new().width("30%"));
        assert_eq!(cfg.width().as_deref(), Some("30%"));
    }

    #[test]
    fn content_handle_wins_over_markup() {
        struct Body;
        impl crate::content::LayerContent for Body {
            fn name(&self) -> &str {
                "body"
            }
        }
        let kind = ModalConfig::new().template("");
        let caller = ModalConfig::new().content(ContentHandle::new(Body));
        let cfg = resolve_over_globals(kind, caller);
        assert!(matches!(cfg.template(), TemplateRef::Content(c) if c.name() == "body"));
        assert!(cfg.contains(keys::TEMPLATE));
    }

    #[test]
    fn callback_presence_is_tracked() {
        let caller = ModalConfig::new().confirm_callback(|_| false);
        let cfg = resolve_over_globals(ModalConfig::new(), caller);
        assert!(cfg.contains(keys::CONFIRM_CALLBACK));
        assert!(!cfg.contains(keys::CANCEL_CALLBACK));
        assert!(cfg.trigger_callback(Trigger::Confirm).is_some());
        assert!(cfg.trigger_callback(Trigger::Cancel).is_none());
    }

    #[test]
    fn type_default_callbacks_fill_absent_slots() {
        let kind = ModalConfig::new().cancel_callback(|_| true);
        let cfg = resolve_over_globals(kind, ModalConfig::new());
        assert!(cfg.trigger_callback(Trigger::Cancel).is_some());
    }

    #[test]
    fn listener_flags_default() {
        let cfg = resolve(&ModalConfig::new(), ModalConfig::new(), &ModalConfig::new());
        assert!(cfg.on_esc());
        assert!(!cfg.on_backdrop());
        assert_eq!(cfg.animate_time(), None);
    }

    #[test]
    fn auto_close_requires_positive_number() {
        let cfg = resolve_over_globals(ModalConfig::new(), ModalConfig::new().auto_close(2000));
        assert_eq!(cfg.auto_close(), Some(Duration::from_millis(2000)));
        let cfg = resolve_over_globals(ModalConfig::new(), ModalConfig::new().auto_close(-5));
        assert_eq!(cfg.auto_close(), None);
        let cfg = resolve_over_globals(ModalConfig::new(), ModalConfig::new().auto_close(false));
        assert_eq!(cfg.auto_close(), None);
    }
}
