//! User repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Register accounts and look them up by id or email.
//! - Persist the completion-modal preference pair.
//!
//! # Invariants
//! - Email lookup is case-insensitive (`COLLATE NOCASE` on the column).
//! - Both preference columns are written by one statement.

use crate::db::DbError;
use crate::model::user::{CompletionPreference, CompletionSettings, User, UserId};
use crate::repo::task_repo::{RepoError, RepoResult};
use crate::repo::{bool_to_int, parse_bool, parse_uuid};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    email,
    hide_completion_modal,
    completion_preference,
    created_at
FROM users";

/// Persistence gateway for user accounts.
pub trait UserRepository {
    /// Registers a new account with unset preference columns.
    fn create_user(&self, email: &str) -> RepoResult<User>;
    fn find_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Overwrites both completion-modal columns together.
    fn update_completion_settings(
        &self,
        id: UserId,
        settings: CompletionSettings,
    ) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(&self, filter: &str, value: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {filter} = ?1;"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, email: &str) -> RepoResult<User> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(RepoError::InvalidEmail(email.to_string()));
        }

        let id = Uuid::new_v4();
        let result = self.conn.execute(
            "INSERT INTO users (id, email) VALUES (?1, ?2);",
            params![id.to_string(), email],
        );
        if let Err(err) = result {
            let err = DbError::from(err);
            if err.is_constraint_violation() {
                return Err(RepoError::DuplicateEmail(email.to_string()));
            }
            return Err(err.into());
        }

        self.find_user(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created user {id} missing in read-back"))
        })
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_one("id", &id.to_string())
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.query_one("email", email.trim())
    }

    fn update_completion_settings(
        &self,
        id: UserId,
        settings: CompletionSettings,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                hide_completion_modal = ?2,
                completion_preference = ?3
             WHERE id = ?1;",
            params![
                id.to_string(),
                bool_to_int(settings.hide_completion_modal),
                settings.completion_preference.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }

        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;

    let hide_completion_modal = match row.get::<_, Option<i64>>("hide_completion_modal")? {
        Some(value) => Some(parse_bool(value, "users.hide_completion_modal")?),
        None => None,
    };

    let completion_preference = match row.get::<_, Option<String>>("completion_preference")? {
        Some(value) => Some(CompletionPreference::parse(&value).map_err(|err| {
            RepoError::InvalidData(format!("{err} in users.completion_preference"))
        })?),
        None => None,
    };

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        email: row.get("email")?,
        hide_completion_modal,
        completion_preference,
        created_at: row.get("created_at")?,
    })
}
