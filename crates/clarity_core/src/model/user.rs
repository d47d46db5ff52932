//! User account slice relevant to task ownership and completion preferences.
//!
//! # Invariants
//! - `email` is unique and used as login/display handle.
//! - `completion_preference` is always a recognised [`CompletionPreference`].
//! - Resetting preferences restores `ask` and `hide_completion_modal=false`
//!   together.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one user account.
pub type UserId = Uuid;

/// Stored answer to the "how should completing a task behave" prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPreference {
    /// Show the confirmation modal every time.
    #[default]
    Ask,
    /// Mark as completed and keep the task in the list.
    Complete,
    /// Mark as completed and remove the task.
    Delete,
}

impl CompletionPreference {
    /// Stable string value used in storage and form payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }

    /// Parses a storage/form value.
    pub fn parse(value: &str) -> Result<Self, UnknownCompletionPreference> {
        match value.trim() {
            "ask" => Ok(Self::Ask),
            "complete" => Ok(Self::Complete),
            "delete" => Ok(Self::Delete),
            other => Err(UnknownCompletionPreference(other.to_string())),
        }
    }

    /// `true` while the user has not remembered a choice yet.
    pub fn requires_confirmation(self) -> bool {
        self == Self::Ask
    }
}

impl Display for CompletionPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a preference string is not one of `ask|complete|delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCompletionPreference(pub String);

impl Display for UnknownCompletionPreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown completion preference `{}`; expected ask|complete|delete",
            self.0
        )
    }
}

impl Error for UnknownCompletionPreference {}

/// Completion-modal settings as consumed by the presentation layer.
///
/// Serialized as `{ "hideCompletionModal": .., "completionPreference": .. }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSettings {
    pub hide_completion_modal: bool,
    pub completion_preference: CompletionPreference,
}

impl CompletionSettings {
    pub fn new(hide_completion_modal: bool, completion_preference: CompletionPreference) -> Self {
        Self {
            hide_completion_modal,
            completion_preference,
        }
    }
}

/// Account record (credentials live with the authentication collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// `None` when the column was never written.
    pub hide_completion_modal: Option<bool>,
    /// `None` when the column was never written.
    pub completion_preference: Option<CompletionPreference>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Effective settings with defaults applied to unset columns.
    pub fn completion_settings(&self) -> CompletionSettings {
        CompletionSettings {
            hide_completion_modal: self.hide_completion_modal.unwrap_or(false),
            completion_preference: self.completion_preference.unwrap_or_default(),
        }
    }

    /// Display handle: the local part of the email address.
    pub fn username(&self) -> &str {
        username_from_email(&self.email)
    }
}

/// Returns the part of `email` before `@`, or the whole value without one.
pub fn username_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::{username_from_email, CompletionPreference, CompletionSettings, User};
    use uuid::Uuid;

    #[test]
    fn parse_accepts_known_values_and_rejects_others() {
        assert_eq!(
            CompletionPreference::parse(" delete ").expect("delete parse"),
            CompletionPreference::Delete
        );
        let err = CompletionPreference::parse("sometimes").expect_err("unknown value");
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn only_ask_requires_confirmation() {
        assert!(CompletionPreference::Ask.requires_confirmation());
        assert!(!CompletionPreference::Complete.requires_confirmation());
        assert!(!CompletionPreference::Delete.requires_confirmation());
    }

    #[test]
    fn unset_columns_fall_back_to_defaults() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            hide_completion_modal: None,
            completion_preference: None,
            created_at: 1,
        };
        assert_eq!(user.completion_settings(), CompletionSettings::default());
        assert_eq!(user.username(), "ada");
    }

    #[test]
    fn username_without_at_sign_is_whole_value() {
        assert_eq!(username_from_email("localonly"), "localonly");
    }
}
