use serde::{Deserialize, Serialize};

/// What a [`UniqueConstraint`] does to its key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueConstraintAction {
    /// Claim the key; the append fails if it is already held.
    Add,
    /// Release the key; releasing an unheld key is a no-op.
    Remove,
}

/// Uniqueness side effect declared by an event.
///
/// `unique_type` names an independent namespace (e.g. `org_name`), and
/// `unique_field` is the key inside it. Among live keys of one namespace no
/// `unique_field` appears twice. The store applies declarations in order, so a
/// remove followed by an add in the same batch is atomic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueConstraint {
    unique_type: String,
    unique_field: String,
    /// Localization key reported when an add collides.
    error_message: Option<String>,
    action: UniqueConstraintAction,
}

impl UniqueConstraint {
    pub fn add(
        unique_type: impl Into<String>,
        unique_field: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            unique_type: unique_type.into(),
            unique_field: unique_field.into(),
            error_message: Some(error_message.into()),
            action: UniqueConstraintAction::Add,
        }
    }

    pub fn remove(unique_type: impl Into<String>, unique_field: impl Into<String>) -> Self {
        Self {
            unique_type: unique_type.into(),
            unique_field: unique_field.into(),
            error_message: None,
            action: UniqueConstraintAction::Remove,
        }
    }

    pub fn unique_type(&self) -> &str {
        &self.unique_type
    }

    pub fn unique_field(&self) -> &str {
        &self.unique_field
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn action(&self) -> UniqueConstraintAction {
        self.action
    }

    pub fn is_add(&self) -> bool {
        self.action == UniqueConstraintAction::Add
    }
}
