#![forbid(unsafe_code)]

//! Errors surfaced by the layer runtime.

use mlayer_core::HostError;

/// Errors from layer factory and pump operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// The host could not perform a required operation.
    Host(HostError),
    /// Service settings could not be parsed.
    InvalidSettings(String),
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host(err) => write!(f, "host error: {err}"),
            Self::InvalidSettings(msg) => write!(f, "invalid settings: {msg}"),
        }
    }
}

impl std::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Host(err) => Some(err),
            Self::InvalidSettings(_) => None,
        }
    }
}

impl From<HostError> for LayerError {
    fn from(err: HostError) -> Self {
        Self::Host(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn host_errors_chain() {
        let err = LayerError::from(HostError::ContainerNotFound("#app".into()));
        assert_eq!(err.to_string(), "host error: container not found: #app");
        assert!(err.source().is_some());
    }
}
