//! `warden-core` — identity and error primitives shared by every layer.
//!
//! This crate knows nothing about events, payloads or storage.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateType, ExpectedSequence};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, EventId, TenantId};
