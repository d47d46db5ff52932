//! Completion-preference use-case service.
//!
//! # Responsibility
//! - Read and write the per-user completion-modal settings.
//! - Publish invalidations: `home` after a set, `layout` after a reset,
//!   since the confirmation modal is shared across pages.
//!
//! # Invariants
//! - Both settings are always written together.
//! - Reads fall back to `{ hide_completion_modal: false, ask }`.

use crate::model::user::{CompletionPreference, CompletionSettings, UserId};
use crate::repo::task_repo::RepoError;
use crate::repo::user_repo::UserRepository;
use crate::view::invalidation::{InvalidationBus, ViewScope};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for preference use-cases.
#[derive(Debug)]
pub enum PreferenceServiceError {
    UserNotFound(UserId),
    Repo(RepoError),
    /// Storage failure hidden behind a generic message; detail is in the log.
    OperationFailed(&'static str),
}

impl Display for PreferenceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::OperationFailed(operation) => write!(f, "failed to {operation}"),
        }
    }
}

impl Error for PreferenceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PreferenceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Preference facade over a user repository.
pub struct PreferenceService<R: UserRepository> {
    repo: R,
    bus: InvalidationBus,
}

impl<R: UserRepository> PreferenceService<R> {
    pub fn new(repo: R, bus: InvalidationBus) -> Self {
        Self { repo, bus }
    }

    /// Returns effective settings; unknown users and unset columns read as
    /// the defaults.
    pub fn get_completion_preference(
        &self,
        user_id: UserId,
    ) -> Result<CompletionSettings, PreferenceServiceError> {
        let settings = self
            .repo
            .find_user(user_id)?
            .map(|user| user.completion_settings())
            .unwrap_or_default();
        Ok(settings)
    }

    /// Overwrites both settings.
    pub fn set_completion_preference(
        &self,
        user_id: UserId,
        hide_completion_modal: bool,
        completion_preference: CompletionPreference,
    ) -> Result<(), PreferenceServiceError> {
        let settings = CompletionSettings::new(hide_completion_modal, completion_preference);
        self.repo.update_completion_settings(user_id, settings)?;
        self.bus.publish(ViewScope::Home);

        info!(
            "event=preference_set module=service status=ok user_id={user_id} hide_modal={} preference={}",
            settings.hide_completion_modal, settings.completion_preference
        );
        Ok(())
    }

    /// Returns the user to `ask` with the modal visible.
    pub fn reset_completion_preference(
        &self,
        user_id: UserId,
    ) -> Result<CompletionSettings, PreferenceServiceError> {
        let settings = CompletionSettings::default();
        if let Err(err) = self.repo.update_completion_settings(user_id, settings) {
            error!(
                "event=preference_reset module=service status=error user_id={user_id} error_code=reset_failed error={err}"
            );
            return Err(PreferenceServiceError::OperationFailed(
                "reset completion preference",
            ));
        }

        self.bus.publish(ViewScope::Layout);
        info!("event=preference_reset module=service status=ok user_id={user_id}");
        Ok(settings)
    }
}
