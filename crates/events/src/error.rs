//! Errors raised while marshaling, mapping and reducing events.

use thiserror::Error;

use warden_core::{AggregateId, TenantId};

/// Event-layer error.
///
/// `Serialization` and `Reduction` carry a short diagnostic code that is
/// unique per failure site (e.g. `ORG-Bren2`) so log lines can be grepped back
/// to the code that produced them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Payload could not be marshaled or unmarshaled. Internal, not retryable.
    #[error("[{code}] {message}")]
    Serialization { code: &'static str, message: String },

    /// A read model could not fold an event. The read model must not be served.
    #[error("[{code}] reduce failed: {message}")]
    Reduction { code: &'static str, message: String },

    /// Events were delivered out of order.
    #[error("non-monotonic sequence (last: {last}, found: {found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    /// An event of another aggregate was appended to a read model.
    #[error("event of aggregate {found} appended to read model of {expected}")]
    AggregateMismatch {
        expected: AggregateId,
        found: AggregateId,
    },

    /// An event of the same aggregate id but another tenant was appended to a
    /// read model.
    #[error("event of tenant {found} appended to read model of {aggregate_id} in tenant {expected}")]
    TenantMismatch {
        aggregate_id: AggregateId,
        expected: TenantId,
        found: TenantId,
    },

    /// Editor service or user missing.
    #[error("invalid editor: {0}")]
    InvalidEditor(String),

    /// A search query that no store can answer.
    #[error("invalid search query: {0}")]
    InvalidQuery(String),
}

impl EventError {
    pub fn serialization(code: &'static str, err: impl core::fmt::Display) -> Self {
        Self::Serialization {
            code,
            message: err.to_string(),
        }
    }

    pub fn reduction(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Reduction {
            code,
            message: msg.into(),
        }
    }

    /// Stable diagnostic code, if the failure site has one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Serialization { code, .. } | Self::Reduction { code, .. } => Some(code),
            _ => None,
        }
    }
}
