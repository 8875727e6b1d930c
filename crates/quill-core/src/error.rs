//! Unified error model
use crate::time::Time;
use crate::value::TypeKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuillError {
    /// Registration after seal, double seal, or an inconsistent registration.
    #[error("CONFIG/{0}")]
    Configuration(String),

    /// No static conversion path; raised while binding, never while evaluating.
    #[error("CONVERT/no conversion from {from} to {to}")]
    ConversionUnavailable { from: TypeKey, to: TypeKey },

    #[error("UNSUPPORTED/{0}")]
    UnsupportedOperation(String),

    #[error("TIME/{node} has no distinct {requested} state")]
    TemporalBindingRejected { node: String, requested: Time },
}

impl QuillError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation(_))
    }
}

pub type Result<T> = std::result::Result<T, QuillError>;
