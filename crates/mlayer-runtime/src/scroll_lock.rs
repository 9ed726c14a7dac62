#![forbid(unsafe_code)]

//! Page scroll lock with scrollbar compensation.
//!
//! Locking hides the page's scrollbar through the lock class. When a native
//! scrollbar was visible, its width is added to the page's right padding so
//! content does not shift sideways.
//!
//! # Invariants
//!
//! - Under [`LockPolicy::RefCounted`] the page is physically locked iff
//!   `holders > 0`.
//! - Unlocking restores the inline `padding-right` that was present before the
//!   first lock (or removes it if there was none).
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | release without holders | counted, page unlocked anyway under `Legacy` |
//! | unparseable inline padding | treated as `0px` |

use mlayer_core::LayerHost;
use mlayer_core::value::px;

use crate::settings::LockPolicy;

const PADDING_RIGHT: &str = "padding-right";

#[derive(Debug)]
pub struct ScrollLock {
    policy: LockPolicy,
    class: String,
    holders: usize,
    /// Inline padding before the first physical lock. `Some(None)` means no
    /// inline padding was set.
    saved_padding: Option<Option<String>>,
    acquisitions: u64,
    releases: u64,
}

impl ScrollLock {
    pub fn new(policy: LockPolicy, class: impl Into<String>) -> Self {
        Self {
            policy,
            class: class.into(),
            holders: 0,
            saved_padding: None,
            acquisitions: 0,
            releases: 0,
        }
    }

    pub fn acquire(&mut self, host: &mut dyn LayerHost) {
        self.acquisitions += 1;
        self.holders += 1;
        if self.policy == LockPolicy::RefCounted && self.holders > 1 {
            tracing::trace!(holders = self.holders, "scroll lock already held");
            return;
        }

        let page = host.page_root();
        if host.page_metrics().has_scrollbar() {
            let width = host.probe_scrollbar_width();
            if width > 0.0 {
                let current = host.style(page, PADDING_RIGHT);
                let base = current.as_deref().map_or(0.0, parse_px);
                if self.saved_padding.is_none() {
                    self.saved_padding = Some(current);
                }
                host.set_style(page, PADDING_RIGHT, &px(base + width));
            }
        }
        host.add_class(page, &self.class);
        tracing::debug!(holders = self.holders, "scroll lock engaged");
    }

    pub fn release(&mut self, host: &mut dyn LayerHost) {
        self.releases += 1;
        self.holders = self.holders.saturating_sub(1);
        if self.policy == LockPolicy::RefCounted && self.holders > 0 {
            tracing::trace!(holders = self.holders, "scroll lock still held");
            return;
        }

        let page = host.page_root();
        match self.saved_padding.take() {
            Some(Some(previous)) => host.set_style(page, PADDING_RIGHT, &previous),
            Some(None) => host.remove_style(page, PADDING_RIGHT),
            None => {}
        }
        host.remove_class(page, &self.class);
        tracing::debug!(holders = self.holders, "scroll lock released");
    }

    #[inline]
    pub fn holders(&self) -> usize {
        self.holders
    }

    /// Total acquire calls since creation.
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions
    }

    /// Total release calls since creation.
    pub fn releases(&self) -> u64 {
        self.releases
    }
}

/// Parse a CSS pixel length such as `"12px"` or `"12"`.
fn parse_px(value: &str) -> f64 {
    value
        .trim()
        .trim_end_matches("px")
        .trim()
        .parse::<f64>()
        .unwrap_or(0.0)
}
