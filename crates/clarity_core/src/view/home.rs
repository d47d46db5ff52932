//! Home page read model.

use crate::auth::AuthContext;
use crate::model::task::Task;
use crate::model::user::{username_from_email, CompletionSettings};
use crate::repo::task_repo::{RepoResult, TaskRepository};
use crate::repo::user_repo::UserRepository;
use serde::Serialize;

/// Everything the home page renders for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    /// Email local part, shown in the greeting.
    pub username: String,
    /// Newest first.
    pub tasks: Vec<Task>,
    pub completed_count: usize,
    pub total_count: usize,
    pub completion: CompletionSettings,
}

impl HomeView {
    /// "N of M tasks completed" footer line.
    pub fn summary(&self) -> String {
        format!(
            "{} of {} tasks completed",
            self.completed_count, self.total_count
        )
    }
}

/// Reads the current home view from storage.
pub fn load_home_view(
    tasks: &impl TaskRepository,
    users: &impl UserRepository,
    ctx: &AuthContext,
) -> RepoResult<HomeView> {
    let items = tasks.list_tasks(ctx.user_id)?;
    let completion = users
        .find_user(ctx.user_id)?
        .map(|user| user.completion_settings())
        .unwrap_or_default();
    let completed_count = items.iter().filter(|task| task.is_completed).count();

    Ok(HomeView {
        username: username_from_email(&ctx.email).to_string(),
        total_count: items.len(),
        completed_count,
        tasks: items,
        completion,
    })
}
