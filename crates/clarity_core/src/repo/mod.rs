//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the typed query/command interface services use to reach storage.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Every task query is scoped by owner; a foreign task is reported exactly
//!   like a missing one.
//! - Repository APIs return semantic errors (`TaskNotFound`, `UserNotFound`)
//!   in addition to DB transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod task_repo;
pub mod user_repo;

use crate::repo::task_repo::{RepoError, RepoResult};
use uuid::Uuid;

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
