//! Authenticated request context.
//!
//! Session verification happens outside the core; it hands over a verified
//! email. This module turns that email into the owner identity every task and
//! preference operation is scoped by. Payload fields are never trusted for
//! ownership.

use crate::model::user::{User, UserId};
use crate::repo::task_repo::RepoResult;
use crate::repo::user_repo::UserRepository;
use log::warn;

/// Verified principal for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Resolves a verified session email into an [`AuthContext`].
///
/// Returns `Ok(None)` when the session names no known account; callers must
/// then deny access.
pub fn resolve_auth_context(
    users: &impl UserRepository,
    session_email: &str,
) -> RepoResult<Option<AuthContext>> {
    let email = session_email.trim();
    if email.is_empty() {
        return Ok(None);
    }

    let context = users.find_user_by_email(email)?.map(|user| AuthContext::from(&user));
    if context.is_none() {
        warn!("event=auth_resolve module=auth status=denied reason=unknown_user");
    }
    Ok(context)
}
