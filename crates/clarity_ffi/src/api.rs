//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task and preference operations to Dart via FRB.
//! - Accept browser-form-shaped input: a session email plus a flat map of
//!   named string fields.
//! - Serve the home view through a cache that follows invalidation signals.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every operation resolves the session before touching task data; payload
//!   fields never decide ownership.

use clarity_core::db::open_db;
use clarity_core::form::{
    parse_create_task, parse_edit_task, parse_set_preference, parse_task_id,
    parse_update_description, parse_update_icon, parse_user,
};
use clarity_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, load_home_view,
    ping as ping_inner, resolve_auth_context, AuthContext, CompletionSettings, FormData, HomeView,
    InvalidationBus, PreferenceService, SqliteTaskRepository, SqliteUserRepository, Task,
    TaskService, UserId, ViewCache, ViewScope,
};
use log::warn;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "clarity.sqlite3";
const DB_PATH_ENV: &str = "CLARITY_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static BUS: OnceLock<InvalidationBus> = OnceLock::new();
static HOME_CACHE: OnceLock<Mutex<ViewCache<UserId, HomeView>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope for task mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Created task id (create only).
    pub task_id: Option<String>,
    /// New completion value (toggle only).
    pub is_completed: Option<bool>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            task_id: None,
            is_completed: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            is_completed: None,
            message: message.into(),
        }
    }
}

/// Completion settings envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceResponse {
    pub ok: bool,
    pub hide_completion_modal: bool,
    /// `ask|complete|delete`.
    pub completion_preference: String,
    pub message: String,
}

impl PreferenceResponse {
    fn from_settings(settings: CompletionSettings, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            hide_completion_modal: settings.hide_completion_modal,
            completion_preference: settings.completion_preference.as_str().to_string(),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        let defaults = CompletionSettings::default();
        Self {
            ok: false,
            hide_completion_modal: defaults.hide_completion_modal,
            completion_preference: defaults.completion_preference.as_str().to_string(),
            message: message.into(),
        }
    }
}

/// One task row for list rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub task_id: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub is_completed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Home page envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeResponse {
    pub ok: bool,
    pub username: String,
    /// Newest first.
    pub items: Vec<TaskItem>,
    /// "N of M tasks completed".
    pub summary: String,
    pub preference: PreferenceResponse,
    pub message: String,
}

/// Creates a task from `title`, `description` and `icon` fields.
///
/// A blank title succeeds without creating anything (`task_id = None`).
#[flutter_rust_bridge::frb(sync)]
pub fn task_create(session_email: String, fields: HashMap<String, String>) -> TaskActionResponse {
    let form = to_form(fields);
    let result = with_session(&session_email, |conn, ctx| {
        task_service(conn)
            .create_task(ctx.user_id, &parse_create_task(&form))
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(task)) => TaskActionResponse {
            task_id: Some(task.id.to_string()),
            ..TaskActionResponse::success("Task created.")
        },
        Ok(None) => TaskActionResponse::success("Empty title; nothing created."),
        Err(err) => TaskActionResponse::failure(format!("task_create failed: {err}")),
    }
}

/// Flips completion of the task named by `inputId`.
///
/// A stale id succeeds with `is_completed = None`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(session_email: String, fields: HashMap<String, String>) -> TaskActionResponse {
    let form = to_form(fields);
    let result = with_session(&session_email, |conn, ctx| {
        let task_id = parse_task_id(&form).map_err(|err| err.to_string())?;
        task_service(conn)
            .toggle_task(ctx.user_id, task_id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Some(is_completed)) => TaskActionResponse {
            is_completed: Some(is_completed),
            ..TaskActionResponse::success("Task toggled.")
        },
        Ok(None) => TaskActionResponse::success("Task not found; nothing toggled."),
        Err(err) => TaskActionResponse::failure(format!("task_toggle failed: {err}")),
    }
}

/// Applies `newTitle`/`newIcon` to the task named by `inputId`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_edit(session_email: String, fields: HashMap<String, String>) -> TaskActionResponse {
    let form = to_form(fields);
    run_task_action("task_edit", "Task updated.", &session_email, |conn, ctx| {
        let request = parse_edit_task(&form).map_err(|err| err.to_string())?;
        task_service(conn)
            .edit_task(ctx.user_id, &request)
            .map_err(|err| err.to_string())
    })
}

/// Sets or clears (`description` empty/absent) the task description.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update_description(
    session_email: String,
    fields: HashMap<String, String>,
) -> TaskActionResponse {
    let form = to_form(fields);
    run_task_action(
        "task_update_description",
        "Description updated.",
        &session_email,
        |conn, ctx| {
            let request = parse_update_description(&form).map_err(|err| err.to_string())?;
            task_service(conn)
                .update_description(ctx.user_id, request.task_id, request.value.as_deref())
                .map_err(|err| err.to_string())
        },
    )
}

/// Sets or clears (`icon` empty/absent) the task icon.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update_icon(
    session_email: String,
    fields: HashMap<String, String>,
) -> TaskActionResponse {
    let form = to_form(fields);
    run_task_action("task_update_icon", "Icon updated.", &session_email, |conn, ctx| {
        let request = parse_update_icon(&form).map_err(|err| err.to_string())?;
        task_service(conn)
            .update_icon(ctx.user_id, request.task_id, request.value.as_deref())
            .map_err(|err| err.to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(session_email: String, fields: HashMap<String, String>) -> TaskActionResponse {
    let form = to_form(fields);
    run_task_action("task_delete", "Task deleted.", &session_email, |conn, ctx| {
        let task_id = parse_task_id(&form).map_err(|err| err.to_string())?;
        task_service(conn)
            .delete_task(ctx.user_id, task_id)
            .map_err(|err| err.to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_complete_and_delete(
    session_email: String,
    fields: HashMap<String, String>,
) -> TaskActionResponse {
    let form = to_form(fields);
    run_task_action(
        "task_complete_and_delete",
        "Task completed and deleted.",
        &session_email,
        |conn, ctx| {
            let task_id = parse_task_id(&form).map_err(|err| err.to_string())?;
            task_service(conn)
                .complete_and_delete_task(ctx.user_id, task_id)
                .map_err(|err| err.to_string())
        },
    )
}

/// Reads completion settings; `userId` is optional and must match the session.
#[flutter_rust_bridge::frb(sync)]
pub fn preference_get(
    session_email: String,
    fields: HashMap<String, String>,
) -> PreferenceResponse {
    let form = to_form(fields);
    let result = with_session(&session_email, |conn, ctx| {
        let user_id = parse_user(&form, ctx).map_err(|err| err.to_string())?;
        preference_service(conn)
            .get_completion_preference(user_id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(settings) => PreferenceResponse::from_settings(settings, "Preference loaded."),
        Err(err) => PreferenceResponse::failure(format!("preference_get failed: {err}")),
    }
}

/// Stores `hideCompletionModal` (`"true"|"false"`) and `completionPreference`.
#[flutter_rust_bridge::frb(sync)]
pub fn preference_set(
    session_email: String,
    fields: HashMap<String, String>,
) -> PreferenceResponse {
    let form = to_form(fields);
    let result = with_session(&session_email, |conn, ctx| {
        let request = parse_set_preference(&form, ctx).map_err(|err| err.to_string())?;
        preference_service(conn)
            .set_completion_preference(
                request.user_id,
                request.hide_completion_modal,
                request.completion_preference,
            )
            .map_err(|err| err.to_string())?;
        Ok(CompletionSettings::new(
            request.hide_completion_modal,
            request.completion_preference,
        ))
    });
    match result {
        Ok(settings) => PreferenceResponse::from_settings(settings, "Preference saved."),
        Err(err) => PreferenceResponse::failure(format!("preference_set failed: {err}")),
    }
}

/// Shows the completion modal again (`ask`).
#[flutter_rust_bridge::frb(sync)]
pub fn preference_reset(
    session_email: String,
    fields: HashMap<String, String>,
) -> PreferenceResponse {
    let form = to_form(fields);
    let result = with_session(&session_email, |conn, ctx| {
        let user_id = parse_user(&form, ctx).map_err(|err| err.to_string())?;
        preference_service(conn)
            .reset_completion_preference(user_id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(settings) => PreferenceResponse::from_settings(settings, "Preference reset."),
        Err(err) => PreferenceResponse::failure(format!("preference_reset failed: {err}")),
    }
}

/// Renders the home page for the session user.
///
/// Served from cache until a task or preference mutation invalidates it.
#[flutter_rust_bridge::frb(sync)]
pub fn home_view(session_email: String) -> HomeResponse {
    let result = with_session(&session_email, |conn, ctx| {
        let mut cache = home_cache()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cache
            .get_or_load(ctx.user_id, || {
                load_home_view(
                    &SqliteTaskRepository::new(conn),
                    &SqliteUserRepository::new(conn),
                    ctx,
                )
            })
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(view) => HomeResponse {
            ok: true,
            summary: view.summary(),
            preference: PreferenceResponse::from_settings(view.completion, "Preference loaded."),
            items: view.tasks.into_iter().map(to_task_item).collect(),
            username: view.username,
            message: "Home loaded.".to_string(),
        },
        Err(err) => HomeResponse {
            ok: false,
            username: String::new(),
            items: Vec::new(),
            summary: String::new(),
            preference: PreferenceResponse::failure(err.clone()),
            message: format!("home_view failed: {err}"),
        },
    }
}

fn run_task_action(
    operation: &'static str,
    success_message: &'static str,
    session_email: &str,
    f: impl FnOnce(&Connection, &AuthContext) -> Result<(), String>,
) -> TaskActionResponse {
    match with_session(session_email, f) {
        Ok(()) => TaskActionResponse::success(success_message),
        Err(err) => TaskActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn with_session<T>(
    session_email: &str,
    f: impl FnOnce(&Connection, &AuthContext) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("DB open failed: {err}"))?;
    let users = SqliteUserRepository::new(&conn);
    let ctx = resolve_auth_context(&users, session_email)
        .map_err(|err| format!("session lookup failed: {err}"))?
        .ok_or_else(|| {
            warn!("event=ffi_session module=ffi status=denied");
            "not authenticated".to_string()
        })?;
    f(&conn, &ctx)
}

fn task_service(conn: &Connection) -> TaskService<SqliteTaskRepository<'_>> {
    TaskService::new(SqliteTaskRepository::new(conn), bus().clone())
}

fn preference_service(conn: &Connection) -> PreferenceService<SqliteUserRepository<'_>> {
    PreferenceService::new(SqliteUserRepository::new(conn), bus().clone())
}

fn to_form(fields: HashMap<String, String>) -> FormData {
    fields.into_iter().collect()
}

fn to_task_item(task: Task) -> TaskItem {
    TaskItem {
        task_id: task.id.to_string(),
        title: task.title,
        description: task.description,
        icon: task.icon,
        is_completed: task.is_completed,
        created_at: task.created_at,
    }
}

fn bus() -> &'static InvalidationBus {
    BUS.get_or_init(InvalidationBus::new)
}

fn home_cache() -> &'static Mutex<ViewCache<UserId, HomeView>> {
    HOME_CACHE.get_or_init(|| Mutex::new(ViewCache::new(bus().clone(), ViewScope::Home)))
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, home_view, init_logging, ping, preference_get, preference_reset,
        preference_set, resolve_db_path, task_complete_and_delete, task_create, task_edit,
        task_toggle, task_update_description,
    };
    use clarity_core::db::open_db;
    use clarity_core::{SqliteUserRepository, UserRepository};
    use std::collections::HashMap;
    use std::time::{SystemTime, UNIX_EPOCH};
    use uuid::Uuid;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let log_dir = std::env::temp_dir().join("clarity-ffi-logs");
        let error = init_logging("verbose".to_string(), log_dir.display().to_string());
        assert!(error.contains("unsupported log level"));
    }

    #[test]
    fn unknown_session_is_denied() {
        let response = task_create(
            format!("{}@example.com", unique_token("ghost")),
            fields(&[("title", "nope")]),
        );
        assert!(!response.ok);
        assert!(response.message.contains("not authenticated"));
    }

    #[test]
    fn create_toggle_and_complete_flow() {
        let email = register("flow");

        let created = task_create(
            email.clone(),
            fields(&[("title", "Buy milk"), ("description", ""), ("icon", "🛒")]),
        );
        assert!(created.ok, "{}", created.message);
        let task_id = created.task_id.expect("create should return task_id");

        let conn = open_db(resolve_db_path()).expect("open db");
        let (description, icon, done): (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT description, icon, is_completed FROM tasks WHERE id = ?1",
                [task_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .expect("query task row");
        assert_eq!(description, None);
        assert_eq!(icon.as_deref(), Some("🛒"));
        assert_eq!(done, 0);

        let toggled = task_toggle(email.clone(), fields(&[("inputId", task_id.as_str())]));
        assert_eq!(toggled.is_completed, Some(true));

        let done = task_complete_and_delete(email.clone(), fields(&[("inputId", task_id.as_str())]));
        assert!(done.ok, "{}", done.message);

        let stale = task_toggle(email, fields(&[("inputId", task_id.as_str())]));
        assert!(stale.ok);
        assert_eq!(stale.is_completed, None);
    }

    #[test]
    fn blank_title_succeeds_without_creating() {
        let email = register("blank");
        let response = task_create(email, fields(&[("title", "   ")]));
        assert!(response.ok);
        assert_eq!(response.task_id, None);
    }

    #[test]
    fn malformed_input_id_is_rejected_at_the_boundary() {
        let email = register("malformed");
        let response = task_edit(email, fields(&[("inputId", "123"), ("newTitle", "x")]));
        assert!(!response.ok);
        assert!(response.message.contains("inputId"));
    }

    #[test]
    fn home_view_reflects_mutations() {
        let email = register("home");

        let empty = home_view(email.clone());
        assert!(empty.ok, "{}", empty.message);
        assert!(empty.items.is_empty());

        let created = task_create(email.clone(), fields(&[("title", "Read")]));
        let task_id = created.task_id.expect("task id");
        task_update_description(
            email.clone(),
            fields(&[("inputId", task_id.as_str()), ("description", "ch. 3")]),
        );

        let view = home_view(email.clone());
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].description.as_deref(), Some("ch. 3"));
        assert_eq!(view.summary, "0 of 1 tasks completed");
        assert_eq!(view.preference.completion_preference, "ask");
    }

    #[test]
    fn preference_set_and_reset_round_trip() {
        let email = register("prefs");

        let saved = preference_set(
            email.clone(),
            fields(&[
                ("hideCompletionModal", "true"),
                ("completionPreference", "delete"),
            ]),
        );
        assert!(saved.ok, "{}", saved.message);

        let loaded = preference_get(email.clone(), HashMap::new());
        assert!(loaded.hide_completion_modal);
        assert_eq!(loaded.completion_preference, "delete");

        let reset = preference_reset(email.clone(), HashMap::new());
        assert!(reset.ok, "{}", reset.message);
        let loaded = preference_get(email, HashMap::new());
        assert!(!loaded.hide_completion_modal);
        assert_eq!(loaded.completion_preference, "ask");
    }

    #[test]
    fn preference_set_rejects_foreign_user_id() {
        let email = register("foreign");
        let stranger = Uuid::new_v4().to_string();
        let response = preference_set(
            email,
            fields(&[
                ("userId", stranger.as_str()),
                ("completionPreference", "complete"),
            ]),
        );
        assert!(!response.ok);
    }

    fn register(prefix: &str) -> String {
        let email = format!("{}@example.com", unique_token(prefix));
        let conn = open_db(resolve_db_path()).expect("open db");
        SqliteUserRepository::new(&conn)
            .create_user(&email)
            .expect("register user");
        email
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
