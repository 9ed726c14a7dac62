#![forbid(unsafe_code)]

//! Layer triggers and the closed result type returned by resolution callbacks.
//!
//! A trigger (button click, keystroke, timer, programmatic call) asks a layer
//! to leave its visible state. The callback selected for that trigger answers
//! with a [`Resolution`]:
//!
//! - [`Resolution::Close`]: close the layer now.
//! - [`Resolution::Stay`]: keep the layer visible.
//! - [`Resolution::Pending`]: suspend this layer until the future settles; a
//!   `true` output closes, anything else stays.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::value::ConfigValue;

/// A future deciding whether the layer closes.
pub type PendingResolution = Pin<Box<dyn Future<Output = bool>>>;

/// Callback invoked with the optional trigger payload.
pub type LayerCallback = Rc<dyn Fn(Option<&ConfigValue>) -> Resolution>;

/// Wrap a closure as a [`LayerCallback`].
///
/// The closure may return anything convertible into a [`Resolution`]:
/// `bool`, `()`, or a `Resolution` directly.
pub fn callback<F, R>(f: F) -> LayerCallback
where
    F: Fn(Option<&ConfigValue>) -> R + 'static,
    R: Into<Resolution>,
{
    Rc::new(move |data| f(data).into())
}

/// Outcome of a resolution callback.
pub enum Resolution {
    /// Close the layer.
    Close,
    /// Keep the layer open.
    Stay,
    /// Wait for the future; `true` closes.
    Pending(PendingResolution),
}

impl Resolution {
    /// Wrap a future as a pending resolution.
    pub fn pending(future: impl Future<Output = bool> + 'static) -> Self {
        Self::Pending(Box::pin(future))
    }

    #[inline]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close)
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Close => write!(f, "Close"),
            Self::Stay => write!(f, "Stay"),
            Self::Pending(_) => write!(f, "Pending(..)"),
        }
    }
}

impl From<bool> for Resolution {
    fn from(close: bool) -> Self {
        if close { Self::Close } else { Self::Stay }
    }
}

/// A callback that returns nothing keeps the layer open.
impl From<()> for Resolution {
    fn from(_: ()) -> Self {
        Self::Stay
    }
}

/// The four ways a layer can be asked to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Primary button.
    Confirm,
    /// Secondary button, Escape, auto-close timer.
    Cancel,
    /// Close affordance, backdrop click.
    Close,
    /// Keystroke inside the layer.
    Check,
}

impl Trigger {
    pub const ALL: [Trigger; 4] = [Self::Confirm, Self::Cancel, Self::Close, Self::Check];

    /// Configuration key holding this trigger's callback.
    pub const fn callback_key(self) -> &'static str {
        match self {
            Self::Confirm => crate::config::keys::CONFIRM_CALLBACK,
            Self::Cancel => crate::config::keys::CANCEL_CALLBACK,
            Self::Close => crate::config::keys::CLOSE_CALLBACK,
            Self::Check => crate::config::keys::CHECK_CALLBACK,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Close => "close",
            Self::Check => "check",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_and_unit_convert() {
        assert!(Resolution::from(true).is_close());
        assert!(!Resolution::from(false).is_close());
        assert!(!Resolution::from(()).is_close());
    }

    #[test]
    fn callback_wraps_closures() {
        let cb = callback(|data: Option<&ConfigValue>| data.is_some());
        assert!(cb(Some(&ConfigValue::Int(1))).is_close());
        assert!(!cb(None).is_close());
    }

    #[test]
    fn pending_is_pending() {
        let r = Resolution::pending(async { true });
        assert!(r.is_pending());
        assert_eq!(format!("{r:?}"), "Pending(..)");
    }
}
