//! Form-style input boundary.
//!
//! # Responsibility
//! - Accept the flat string field maps browser/UI forms submit.
//! - Parse them into one typed request per operation before any service runs.
//!
//! # Invariants
//! - Ids are parsed here; services never see raw id strings.
//! - `hideCompletionModal` accepts exactly `"true"` or `"false"`.
//! - A `userId` field must name the authenticated user.

use crate::auth::AuthContext;
use crate::model::task::TaskId;
use crate::model::user::{CompletionPreference, UnknownCompletionPreference, UserId};
use crate::service::task_service::{CreateTaskRequest, EditTaskRequest};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const FIELD_INPUT_ID: &str = "inputId";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_ICON: &str = "icon";
pub const FIELD_NEW_TITLE: &str = "newTitle";
pub const FIELD_NEW_ICON: &str = "newIcon";
pub const FIELD_USER_ID: &str = "userId";
pub const FIELD_HIDE_COMPLETION_MODAL: &str = "hideCompletionModal";
pub const FIELD_COMPLETION_PREFERENCE: &str = "completionPreference";

/// Flat mapping of named string fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn require(&self, name: &'static str) -> Result<&str, FormError> {
        self.get(name)
            .filter(|value| !value.trim().is_empty())
            .ok_or(FormError::MissingField(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Boundary validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingField(&'static str),
    InvalidId { field: &'static str, value: String },
    InvalidBool { field: &'static str, value: String },
    InvalidPreference(UnknownCompletionPreference),
    /// The payload names a different user than the authenticated one.
    UserMismatch,
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing form field `{field}`"),
            Self::InvalidId { field, value } => {
                write!(f, "form field `{field}` is not a valid id: `{value}`")
            }
            Self::InvalidBool { field, value } => write!(
                f,
                "form field `{field}` must be `true` or `false`, got `{value}`"
            ),
            Self::InvalidPreference(err) => write!(f, "{err}"),
            Self::UserMismatch => write!(f, "form user does not match the signed-in user"),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPreference(err) => Some(err),
            _ => None,
        }
    }
}

/// Description or icon replacement; `None` clears the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFieldRequest {
    pub task_id: TaskId,
    pub value: Option<String>,
}

/// Overwrite of both completion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetPreferenceRequest {
    pub user_id: UserId,
    pub hide_completion_modal: bool,
    pub completion_preference: CompletionPreference,
}

/// Reads `title`, `description` and `icon`. A missing title parses as empty,
/// which the service treats as a no-op.
pub fn parse_create_task(form: &FormData) -> CreateTaskRequest {
    CreateTaskRequest {
        title: form.get(FIELD_TITLE).unwrap_or_default().to_string(),
        description: form.get(FIELD_DESCRIPTION).map(ToString::to_string),
        icon: form.get(FIELD_ICON).map(ToString::to_string),
    }
}

/// Reads the `inputId` task reference.
pub fn parse_task_id(form: &FormData) -> Result<TaskId, FormError> {
    parse_id(form, FIELD_INPUT_ID)
}

/// Reads `inputId`, `newTitle` and `newIcon`; blank edits are dropped.
pub fn parse_edit_task(form: &FormData) -> Result<EditTaskRequest, FormError> {
    Ok(EditTaskRequest {
        task_id: parse_task_id(form)?,
        new_title: non_blank(form.get(FIELD_NEW_TITLE)),
        new_icon: non_blank(form.get(FIELD_NEW_ICON)),
    })
}

/// Reads `inputId` and `description`.
pub fn parse_update_description(form: &FormData) -> Result<TaskFieldRequest, FormError> {
    parse_task_field(form, FIELD_DESCRIPTION)
}

/// Reads `inputId` and `icon`.
pub fn parse_update_icon(form: &FormData) -> Result<TaskFieldRequest, FormError> {
    parse_task_field(form, FIELD_ICON)
}

/// Resolves the target user: the authenticated user, checked against an
/// optional `userId` field.
pub fn parse_user(form: &FormData, ctx: &AuthContext) -> Result<UserId, FormError> {
    match form.get(FIELD_USER_ID).filter(|value| !value.trim().is_empty()) {
        None => Ok(ctx.user_id),
        Some(_) => {
            let user_id = parse_id(form, FIELD_USER_ID)?;
            if user_id != ctx.user_id {
                return Err(FormError::UserMismatch);
            }
            Ok(user_id)
        }
    }
}

/// Reads `userId`, `hideCompletionModal` (absent means `false`) and
/// `completionPreference`.
pub fn parse_set_preference(
    form: &FormData,
    ctx: &AuthContext,
) -> Result<SetPreferenceRequest, FormError> {
    let user_id = parse_user(form, ctx)?;
    let hide_completion_modal = match form.get(FIELD_HIDE_COMPLETION_MODAL) {
        None => false,
        Some("true") => true,
        Some("false") => false,
        Some(other) => {
            return Err(FormError::InvalidBool {
                field: FIELD_HIDE_COMPLETION_MODAL,
                value: other.to_string(),
            })
        }
    };
    let completion_preference =
        CompletionPreference::parse(form.require(FIELD_COMPLETION_PREFERENCE)?)
            .map_err(FormError::InvalidPreference)?;

    Ok(SetPreferenceRequest {
        user_id,
        hide_completion_modal,
        completion_preference,
    })
}

fn parse_task_field(form: &FormData, field: &'static str) -> Result<TaskFieldRequest, FormError> {
    Ok(TaskFieldRequest {
        task_id: parse_task_id(form)?,
        value: non_blank(form.get(field)),
    })
}

fn parse_id(form: &FormData, field: &'static str) -> Result<Uuid, FormError> {
    let raw = form.require(field)?;
    Uuid::parse_str(raw.trim()).map_err(|_| FormError::InvalidId {
        field,
        value: raw.to_string(),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(ToString::to_string)
}
