use warden_core::ExpectedSequence;

use crate::{EventData, EventMeta, UniqueConstraint};

/// The intent to store an event.
///
/// A command carries the event's identity (aggregate, type, editor) and a
/// payload that is marshaled only when the command is pushed. Commands are
/// transient: once appended they come back as [`crate::Event`]s.
///
/// Concrete event types usually implement both `Command` (push side) and
/// `Event` (read side) on the same struct.
pub trait Command: EventMeta + core::fmt::Debug + Send + Sync {
    /// Payload representing the fields changed by the event.
    fn data(&self) -> EventData<'_>;
}

/// Uniqueness side effects of a command.
///
/// `Context` is the construction-only data needed to compute them that is
/// never stored with the event (e.g. the old name of a renamed org). Commands
/// whose constraints follow from their own payload use `()`.
pub trait UniqueConstraints {
    type Context;

    fn unique_constraints(&self, context: &Self::Context) -> Vec<UniqueConstraint>;
}

/// A command ready to be pushed, paired with the uniqueness constraints it
/// declares and the aggregate sequence it was decided against.
#[derive(Debug)]
pub struct PushCommand {
    command: Box<dyn Command>,
    unique_constraints: Vec<UniqueConstraint>,
    expected_sequence: ExpectedSequence,
}

impl PushCommand {
    /// A command without uniqueness side effects.
    pub fn new<C: Command + 'static>(command: C) -> Self {
        Self::with_constraints(command, Vec::new())
    }

    pub fn with_constraints<C: Command + 'static>(
        command: C,
        unique_constraints: Vec<UniqueConstraint>,
    ) -> Self {
        Self {
            command: Box::new(command),
            unique_constraints,
            expected_sequence: ExpectedSequence::Any,
        }
    }

    /// A command together with the constraints it derives from `context`.
    pub fn constrained<C>(command: C, context: &C::Context) -> Self
    where
        C: Command + UniqueConstraints + 'static,
    {
        let unique_constraints = command.unique_constraints(context);
        Self::with_constraints(command, unique_constraints)
    }

    pub fn expect_sequence(mut self, expected: ExpectedSequence) -> Self {
        self.expected_sequence = expected;
        self
    }

    pub fn command(&self) -> &dyn Command {
        self.command.as_ref()
    }

    pub fn unique_constraints(&self) -> &[UniqueConstraint] {
        &self.unique_constraints
    }

    pub fn expected_sequence(&self) -> ExpectedSequence {
        self.expected_sequence
    }
}
