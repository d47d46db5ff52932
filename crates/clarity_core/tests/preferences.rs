use clarity_core::db::open_db_in_memory;
use clarity_core::{
    CompletionPreference, CompletionSettings, InvalidationBus, PreferenceService,
    PreferenceServiceError, RepoError, SqliteUserRepository, UserRepository, ViewScope,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn service<'c>(
    conn: &'c Connection,
    bus: &InvalidationBus,
) -> PreferenceService<SqliteUserRepository<'c>> {
    PreferenceService::new(SqliteUserRepository::new(conn), bus.clone())
}

#[test]
fn fresh_user_reads_default_preference() {
    let conn = open_db_in_memory().unwrap();
    let bus = InvalidationBus::new();
    let user = SqliteUserRepository::new(&conn)
        .create_user("ada@example.com")
        .unwrap();

    let settings = service(&conn, &bus).get_completion_preference(user.id).unwrap();

    assert_eq!(settings, CompletionSettings::default());
    assert!(!settings.hide_completion_modal);
    assert_eq!(settings.completion_preference, CompletionPreference::Ask);
}

#[test]
fn unknown_user_reads_default_preference() {
    let conn = open_db_in_memory().unwrap();
    let bus = InvalidationBus::new();

    let settings = service(&conn, &bus)
        .get_completion_preference(Uuid::new_v4())
        .unwrap();
    assert_eq!(settings, CompletionSettings::default());
}

#[test]
fn set_overwrites_both_fields_and_invalidates_home() {
    let conn = open_db_in_memory().unwrap();
    let bus = InvalidationBus::new();
    let user = SqliteUserRepository::new(&conn)
        .create_user("ada@example.com")
        .unwrap();
    let service = service(&conn, &bus);

    service
        .set_completion_preference(user.id, true, CompletionPreference::Delete)
        .unwrap();

    let settings = service.get_completion_preference(user.id).unwrap();
    assert_eq!(
        settings,
        CompletionSettings::new(true, CompletionPreference::Delete)
    );
    assert_eq!(bus.generation(ViewScope::Home), 1);
    assert_eq!(bus.generation(ViewScope::Layout), 0);
}

#[test]
fn set_for_unknown_user_propagates_not_found() {
    let conn = open_db_in_memory().unwrap();
    let bus = InvalidationBus::new();
    let missing = Uuid::new_v4();

    let err = service(&conn, &bus)
        .set_completion_preference(missing, true, CompletionPreference::Complete)
        .unwrap_err();

    assert!(matches!(err, PreferenceServiceError::UserNotFound(id) if id == missing));
    assert_eq!(bus.generation(ViewScope::Home), 0);
}

#[test]
fn reset_always_returns_to_ask_and_invalidates_layout() {
    let conn = open_db_in_memory().unwrap();
    let bus = InvalidationBus::new();
    let user = SqliteUserRepository::new(&conn)
        .create_user("ada@example.com")
        .unwrap();
    let service = service(&conn, &bus);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.subscribe(
        ViewScope::Home,
        Arc::new(move |scope: ViewScope| sink.lock().unwrap().push(scope)),
    );

    for (hide, preference) in [
        (true, CompletionPreference::Complete),
        (false, CompletionPreference::Delete),
        (true, CompletionPreference::Ask),
    ] {
        service
            .set_completion_preference(user.id, hide, preference)
            .unwrap();
        let reset = service.reset_completion_preference(user.id).unwrap();
        assert_eq!(reset, CompletionSettings::default());
        assert_eq!(
            service.get_completion_preference(user.id).unwrap(),
            CompletionSettings::default()
        );
    }

    // Reset on a user that never stored anything is also fine.
    service.reset_completion_preference(user.id).unwrap();

    assert_eq!(bus.generation(ViewScope::Layout), 4);
    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.iter().filter(|scope| **scope == ViewScope::Layout).count(),
        4
    );
}

#[test]
fn reset_for_unknown_user_fails_generically() {
    let conn = open_db_in_memory().unwrap();
    let bus = InvalidationBus::new();

    let err = service(&conn, &bus)
        .reset_completion_preference(Uuid::new_v4())
        .unwrap_err();

    assert!(matches!(err, PreferenceServiceError::OperationFailed(_)));
    assert_eq!(err.to_string(), "failed to reset completion preference");
    assert_eq!(bus.generation(ViewScope::Layout), 0);
}

#[test]
fn settings_serialize_with_ui_field_names() {
    let settings = CompletionSettings::new(true, CompletionPreference::Complete);
    let json = serde_json::to_value(settings).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "hideCompletionModal": true,
            "completionPreference": "complete"
        })
    );
}

#[test]
fn user_registration_rejects_duplicates_and_invalid_emails() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::new(&conn);

    let user = users.create_user(" ada@example.com ").unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.hide_completion_modal, None);
    assert_eq!(user.completion_preference, None);

    let err = users.create_user("ADA@example.com").unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEmail(_)));

    let err = users.create_user("not-an-email").unwrap_err();
    assert!(matches!(err, RepoError::InvalidEmail(_)));

    let found = users.find_user_by_email("Ada@Example.com").unwrap().unwrap();
    assert_eq!(found.id, user.id);
}
