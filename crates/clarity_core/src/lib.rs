//! Core domain logic for Clarity.
//! This crate owns task lifecycle and completion-preference invariants, and
//! the invalidation contract that keeps rendered views in step with storage.

pub mod auth;
pub mod db;
pub mod form;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use auth::{resolve_auth_context, AuthContext};
pub use form::{FormData, FormError};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::task::{FieldPatch, Task, TaskId, TaskPatch, TaskValidationError};
pub use model::user::{CompletionPreference, CompletionSettings, User, UserId};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::preference_service::{PreferenceService, PreferenceServiceError};
pub use service::task_service::{
    CreateTaskRequest, EditTaskRequest, TaskService, TaskServiceError,
};
pub use view::cache::ViewCache;
pub use view::home::{load_home_view, HomeView};
pub use view::invalidation::{InvalidationBus, InvalidationSubscriber, ViewScope};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
