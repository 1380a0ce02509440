//! Event/command contract and read-model projection engine.
//!
//! - [`Command`]: an event that has not been persisted yet.
//! - [`Event`]: a persisted fact, reconstructed from a [`StoredEvent`] by an
//!   [`EventMapper`] registered in an [`EventRegistry`].
//! - [`UniqueConstraint`]: uniqueness claims/releases enforced by the store at
//!   append time.
//! - [`Reducer`] / [`ReadModel`] / [`Dispatch`]: folding ordered events into
//!   typed state.

pub mod base;
pub mod command;
pub mod constraint;
pub mod data;
pub mod error;
pub mod event;
pub mod event_type;
pub mod read_model;
pub mod registry;
pub mod search;
pub mod stored;

pub use base::{BaseEvent, Editor};
pub use command::{Command, PushCommand, UniqueConstraints};
pub use constraint::{UniqueConstraint, UniqueConstraintAction};
pub use data::{EventData, Payload};
pub use error::EventError;
pub use event::{AsAny, Event, EventMeta, downcast, expect_event, is_event_types};
pub use event_type::EventType;
pub use read_model::{Dispatch, Handler, Projection, ReadModel, Reducer, Route, transact};
pub use registry::{EventMapper, EventRegistry, unmarshal};
pub use search::{Columns, SearchQuery};
pub use stored::StoredEvent;
