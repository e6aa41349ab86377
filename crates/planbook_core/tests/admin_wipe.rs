use planbook_core::db::open_db_in_memory;
use planbook_core::{
    CoreError, EntityKind, MutationEngine, NewMeeting, NewTask, NewUser, QueryFacade,
    WIPE_CONFIRMATION_TOKEN,
};

const APR_15_2025_MS: i64 = 1_744_675_200_000;

fn setup_populated() -> rusqlite::Connection {
    let conn = open_db_in_memory().unwrap();
    let engine = MutationEngine::new(&conn);

    let user = engine
        .create_user(&NewUser {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "$argon2$stub".to_string(),
            role: "IT admin".to_string(),
            department: "IT".to_string(),
        })
        .unwrap();
    let parent = engine
        .create_task(
            &NewTask {
                name: "file taxes".to_string(),
                deadline_ms: APR_15_2025_MS,
            },
            &[user],
        )
        .unwrap();
    engine
        .create_sub_task(
            parent,
            &NewTask {
                name: "gather receipts".to_string(),
                deadline_ms: APR_15_2025_MS,
            },
            &[user],
        )
        .unwrap();
    engine
        .create_meeting(
            &NewMeeting {
                subject: "kickoff".to_string(),
                start_ms: APR_15_2025_MS,
                duration_minutes: 30,
            },
            &[user],
        )
        .unwrap();
    conn
}

fn count(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn wrong_token_is_unauthorized_and_wipes_nothing() {
    let conn = setup_populated();
    let engine = MutationEngine::new(&conn);

    let err = engine
        .drop_all_of_kind(EntityKind::Task, "farewell")
        .unwrap_err();
    assert!(matches!(err, CoreError::Unauthorized));
    assert_eq!(count(&conn, "tasks"), 2);
    assert_eq!(count(&conn, "task_edges"), 1);
}

#[test]
fn wiping_tasks_clears_edges_and_assignments_but_keeps_users() {
    let conn = setup_populated();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    engine
        .drop_all_of_kind(EntityKind::Task, WIPE_CONFIRMATION_TOKEN)
        .unwrap();

    assert_eq!(count(&conn, "tasks"), 0);
    assert_eq!(count(&conn, "task_edges"), 0);
    assert_eq!(count(&conn, "task_assignments"), 0);
    assert_eq!(facade.list_users().unwrap().len(), 1);
    assert_eq!(count(&conn, "meeting_assignments"), 1);
}

#[test]
fn wiping_users_clears_both_assignment_relations() {
    let conn = setup_populated();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    engine
        .drop_all_of_kind(EntityKind::User, WIPE_CONFIRMATION_TOKEN)
        .unwrap();

    assert_eq!(count(&conn, "users"), 0);
    assert_eq!(count(&conn, "task_assignments"), 0);
    assert_eq!(count(&conn, "meeting_assignments"), 0);
    // Tasks and meetings themselves survive a user wipe.
    assert_eq!(facade.list_tasks().unwrap().len(), 2);
    assert_eq!(facade.list_meetings().unwrap().len(), 1);
}

#[test]
fn wiping_meetings_leaves_task_relations_alone() {
    let conn = setup_populated();
    let engine = MutationEngine::new(&conn);

    engine
        .drop_all_of_kind(EntityKind::Meeting, WIPE_CONFIRMATION_TOKEN)
        .unwrap();

    assert_eq!(count(&conn, "meetings"), 0);
    assert_eq!(count(&conn, "meeting_assignments"), 0);
    assert_eq!(count(&conn, "tasks"), 2);
    assert_eq!(count(&conn, "task_assignments"), 2);
}
