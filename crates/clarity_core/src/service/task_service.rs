//! Task lifecycle use-case service.
//!
//! # Responsibility
//! - Normalize task input and drive owner-scoped repository commands.
//! - Publish a `home` invalidation after every write that reached storage;
//!   an edit with nothing to change only checks the task exists.
//!
//! # Invariants
//! - A blank title never reaches storage; `create_task` treats it as a no-op.
//! - `toggle_task` on a missing task is logged and skipped, never an error.
//! - Storage failures in `create_task` and `complete_and_delete_task` are
//!   logged with detail and surfaced as `OperationFailed`; other operations
//!   propagate them unchanged.

use crate::model::task::{FieldPatch, Task, TaskId, TaskPatch};
use crate::model::user::UserId;
use crate::repo::task_repo::{RepoError, RepoResult, TaskRepository};
use crate::view::invalidation::{InvalidationBus, ViewScope};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Target task does not exist for this owner.
    TaskNotFound(TaskId),
    /// Persistence-layer failure propagated as-is.
    Repo(RepoError),
    /// Storage failure hidden behind a generic message; detail is in the log.
    OperationFailed(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::OperationFailed(operation) => write!(f, "failed to {operation}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Input for creating one task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Partial edit: `None` or blank fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTaskRequest {
    pub task_id: TaskId,
    pub new_title: Option<String>,
    pub new_icon: Option<String>,
}

/// Task lifecycle facade over a repository implementation.
pub struct TaskService<R: TaskRepository> {
    repo: R,
    bus: InvalidationBus,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repo: R, bus: InvalidationBus) -> Self {
        Self { repo, bus }
    }

    /// Creates a task for `owner`.
    ///
    /// Returns `Ok(None)` without writing when the trimmed title is empty.
    /// Returns the stored task (with `created_at` filled) otherwise.
    pub fn create_task(
        &self,
        owner: UserId,
        request: &CreateTaskRequest,
    ) -> Result<Option<Task>, TaskServiceError> {
        let title = request.title.trim();
        if title.is_empty() {
            debug!("event=task_create module=service status=skipped reason=empty_title");
            return Ok(None);
        }

        let task = Task::new(
            owner,
            title,
            trimmed(request.description.as_deref()),
            trimmed(request.icon.as_deref()),
        );

        let stored = self.repo.insert_task(&task).and_then(|id| {
            // The row exists from here on, even if the read-back fails.
            self.bus.publish(ViewScope::Home);
            self.repo.find_task(owner, id)?.ok_or_else(|| {
                RepoError::InvalidData(format!("created task {id} missing in read-back"))
            })
        });

        match stored {
            Ok(task) => {
                info!(
                    "event=task_create module=service status=ok task_id={}",
                    task.id
                );
                Ok(Some(task))
            }
            Err(err) => {
                error!(
                    "event=task_create module=service status=error error_code=create_failed error={err}"
                );
                Err(TaskServiceError::OperationFailed("create task"))
            }
        }
    }

    /// Flips the completion flag and returns the new value.
    ///
    /// A missing task yields `Ok(None)` so stale UI references stay harmless.
    pub fn toggle_task(
        &self,
        owner: UserId,
        task_id: TaskId,
    ) -> Result<Option<bool>, TaskServiceError> {
        let Some(task) = self.repo.find_task(owner, task_id)? else {
            warn!(
                "event=task_toggle module=service status=skipped reason=not_found task_id={task_id}"
            );
            return Ok(None);
        };

        let is_completed = !task.is_completed;
        let patch = TaskPatch {
            is_completed: Some(is_completed),
            ..TaskPatch::default()
        };
        self.repo.update_task(owner, task_id, &patch)?;
        self.bus.publish(ViewScope::Home);

        info!(
            "event=task_toggle module=service status=ok task_id={task_id} is_completed={is_completed}"
        );
        Ok(Some(is_completed))
    }

    /// Applies title/icon edits that were actually supplied.
    pub fn edit_task(
        &self,
        owner: UserId,
        request: &EditTaskRequest,
    ) -> Result<(), TaskServiceError> {
        let patch = TaskPatch {
            title: trimmed(request.new_title.as_deref()),
            icon: FieldPatch::keep_if_empty(trimmed(request.new_icon.as_deref())),
            ..TaskPatch::default()
        };
        self.apply(owner, request.task_id, &patch, "task_edit")
    }

    /// Replaces the description; empty or absent input clears it.
    pub fn update_description(
        &self,
        owner: UserId,
        task_id: TaskId,
        description: Option<&str>,
    ) -> Result<(), TaskServiceError> {
        let patch = TaskPatch {
            description: FieldPatch::clear_if_empty(trimmed(description)),
            ..TaskPatch::default()
        };
        self.apply(owner, task_id, &patch, "task_update_description")
    }

    /// Replaces the icon; empty or absent input clears it.
    pub fn update_icon(
        &self,
        owner: UserId,
        task_id: TaskId,
        icon: Option<&str>,
    ) -> Result<(), TaskServiceError> {
        let patch = TaskPatch {
            icon: FieldPatch::clear_if_empty(trimmed(icon)),
            ..TaskPatch::default()
        };
        self.apply(owner, task_id, &patch, "task_update_icon")
    }

    pub fn delete_task(&self, owner: UserId, task_id: TaskId) -> Result<(), TaskServiceError> {
        self.repo.delete_task(owner, task_id)?;
        self.bus.publish(ViewScope::Home);
        info!("event=task_delete module=service status=ok task_id={task_id}");
        Ok(())
    }

    /// Marks the task completed and removes it as one storage transaction.
    pub fn complete_and_delete_task(
        &self,
        owner: UserId,
        task_id: TaskId,
    ) -> Result<(), TaskServiceError> {
        if let Err(err) = self.repo.complete_and_delete_task(owner, task_id) {
            error!(
                "event=task_complete_delete module=service status=error task_id={task_id} error_code=complete_delete_failed error={err}"
            );
            return Err(TaskServiceError::OperationFailed("complete and delete task"));
        }

        self.bus.publish(ViewScope::Home);
        info!("event=task_complete_delete module=service status=ok task_id={task_id}");
        Ok(())
    }

    pub fn get_task(&self, owner: UserId, task_id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.find_task(owner, task_id)
    }

    /// Lists owner tasks, newest first.
    pub fn list_tasks(&self, owner: UserId) -> RepoResult<Vec<Task>> {
        self.repo.list_tasks(owner)
    }

    fn apply(
        &self,
        owner: UserId,
        task_id: TaskId,
        patch: &TaskPatch,
        event: &'static str,
    ) -> Result<(), TaskServiceError> {
        self.repo.update_task(owner, task_id, patch)?;
        if patch.is_empty() {
            debug!(
                "event={event} module=service status=skipped reason=empty_patch task_id={task_id}"
            );
            return Ok(());
        }
        self.bus.publish(ViewScope::Home);
        info!("event={event} module=service status=ok task_id={task_id}");
        Ok(())
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
