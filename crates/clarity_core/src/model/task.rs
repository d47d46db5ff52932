//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record and its write-side validation.
//! - Describe partial updates with explicit keep/clear/set semantics.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is never empty or whitespace-only.
//! - `created_at` is assigned by storage and never rewritten.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one task.
pub type TaskId = Uuid;

/// Canonical to-do record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Trimmed, non-empty display text.
    pub title: String,
    pub description: Option<String>,
    /// Symbolic tag rendered next to the title (usually one emoji).
    pub icon: Option<String>,
    pub is_completed: bool,
    /// Unix epoch milliseconds. `0` until the row has been read back from storage.
    pub created_at: i64,
    pub user_id: UserId,
}

impl Task {
    /// Creates a new open task with a generated stable ID.
    ///
    /// Empty optional fields are stored as `None`; the title is kept as given
    /// and checked by [`Task::validate`] on write.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        description: Option<String>,
        icon: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.filter(|value| !value.is_empty()),
            icon: icon.filter(|value| !value.is_empty()),
            is_completed: false,
            created_at: 0,
            user_id,
        }
    }

    /// Checks write-side invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)
    }
}

/// Rejects titles that are empty after trimming.
pub fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(())
}

/// Write-side validation failures for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// Update intent for one nullable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Leave the stored value untouched.
    #[default]
    Keep,
    /// Store `NULL`.
    Clear,
    Set(T),
}

impl FieldPatch<String> {
    /// Explicit-clear semantics: empty or absent input clears the column.
    pub fn clear_if_empty(value: Option<String>) -> Self {
        match value {
            Some(value) if !value.is_empty() => Self::Set(value),
            _ => Self::Clear,
        }
    }

    /// Omit semantics: empty or absent input keeps the column.
    pub fn keep_if_empty(value: Option<String>) -> Self {
        match value {
            Some(value) if !value.is_empty() => Self::Set(value),
            _ => Self::Keep,
        }
    }
}

impl<T> FieldPatch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Partial update applied by the task repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: FieldPatch<String>,
    pub icon: FieldPatch<String>,
    pub is_completed: Option<bool>,
}

impl TaskPatch {
    /// Returns whether applying this patch would write nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_keep()
            && self.icon.is_keep()
            && self.is_completed.is_none()
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        match self.title.as_deref() {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}
