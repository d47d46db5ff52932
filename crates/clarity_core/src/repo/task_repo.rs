//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD APIs over the `tasks` table.
//! - Run the mark-complete-then-delete sequence as one transaction.
//!
//! # Invariants
//! - Write paths call `Task::validate()`/`TaskPatch::validate()` before SQL.
//! - `created_at` is written by the schema default and never updated.

use crate::db::DbError;
use crate::model::task::{FieldPatch, Task, TaskId, TaskPatch, TaskValidationError};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, parse_bool, parse_uuid};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    icon,
    is_completed,
    created_at,
    user_id
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by task and user persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Db(DbError),
    TaskNotFound(TaskId),
    UserNotFound(UserId),
    DuplicateEmail(String),
    InvalidEmail(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::InvalidEmail(email) => write!(f, "invalid email: `{email}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence gateway for tasks. Every id-based call is scoped to `owner`.
pub trait TaskRepository {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn find_task(&self, owner: UserId, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists owner tasks, newest first.
    fn list_tasks(&self, owner: UserId) -> RepoResult<Vec<Task>>;
    /// Applies only the fields present in `patch`.
    fn update_task(&self, owner: UserId, id: TaskId, patch: &TaskPatch) -> RepoResult<()>;
    fn delete_task(&self, owner: UserId, id: TaskId) -> RepoResult<()>;
    /// Marks the task completed and deletes it in one transaction.
    fn complete_and_delete_task(&self, owner: UserId, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn task_exists(&self, owner: UserId, id: TaskId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM tasks WHERE id = ?1 AND user_id = ?2
            );",
            params![id.to_string(), owner.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let result = self.conn.execute(
            "INSERT INTO tasks (
                id,
                title,
                description,
                icon,
                is_completed,
                user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.icon.as_deref(),
                bool_to_int(task.is_completed),
                task.user_id.to_string(),
            ],
        );

        match result {
            Ok(_) => Ok(task.id),
            // Only the owner foreign key can fail here; the title check ran above.
            Err(err) => {
                let err = DbError::from(err);
                if err.is_constraint_violation() {
                    Err(RepoError::UserNotFound(task.user_id))
                } else {
                    Err(err.into())
                }
            }
        }
    }

    fn find_task(&self, owner: UserId, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, owner: UserId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;

        let mut rows = stmt.query([owner.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn update_task(&self, owner: UserId, id: TaskId, patch: &TaskPatch) -> RepoResult<()> {
        patch.validate()?;

        if patch.is_empty() {
            return if self.task_exists(owner, id)? {
                Ok(())
            } else {
                Err(RepoError::TaskNotFound(id))
            };
        }

        let mut assignments: Vec<String> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?".to_string());
            bind_values.push(Value::Text(title.clone()));
        }
        push_nullable(&mut assignments, &mut bind_values, "description", &patch.description);
        push_nullable(&mut assignments, &mut bind_values, "icon", &patch.icon);
        if let Some(is_completed) = patch.is_completed {
            assignments.push("is_completed = ?".to_string());
            bind_values.push(Value::Integer(bool_to_int(is_completed)));
        }

        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ? AND user_id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Text(id.to_string()));
        bind_values.push(Value::Text(owner.to_string()));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }

    fn delete_task(&self, owner: UserId, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }

        Ok(())
    }

    fn complete_and_delete_task(&self, owner: UserId, id: TaskId) -> RepoResult<()> {
        let id_text = id.to_string();
        let owner_text = owner.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE tasks SET is_completed = 1 WHERE id = ?1 AND user_id = ?2;",
            params![id_text.as_str(), owner_text.as_str()],
        )?;
        if changed == 0 {
            // Dropping `tx` rolls back.
            return Err(RepoError::TaskNotFound(id));
        }

        tx.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2;",
            params![id_text.as_str(), owner_text.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn push_nullable(
    assignments: &mut Vec<String>,
    bind_values: &mut Vec<Value>,
    column: &str,
    patch: &FieldPatch<String>,
) {
    match patch {
        FieldPatch::Keep => {}
        FieldPatch::Clear => assignments.push(format!("{column} = NULL")),
        FieldPatch::Set(value) => {
            assignments.push(format!("{column} = ?"));
            bind_values.push(Value::Text(value.clone()));
        }
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let user_id_text: String = row.get("user_id")?;

    let task = Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        icon: row.get("icon")?,
        is_completed: parse_bool(row.get("is_completed")?, "tasks.is_completed")?,
        created_at: row.get("created_at")?,
        user_id: parse_uuid(&user_id_text, "tasks.user_id")?,
    };
    task.validate()?;
    Ok(task)
}
