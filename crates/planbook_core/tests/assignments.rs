use planbook_core::db::open_db_in_memory;
use planbook_core::{
    AssignmentKind, CoreError, EntityKind, MeetingPatch, MutationEngine, NewMeeting, NewTask,
    NewUser, QueryFacade, TaskPatch,
};

const APR_15_2025_MS: i64 = 1_744_675_200_000;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn add_user(engine: &MutationEngine<'_>, name: &str) -> i64 {
    engine
        .create_user(&NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "$argon2$stub".to_string(),
            role: "member".to_string(),
            department: "IT".to_string(),
        })
        .unwrap()
}

fn task(name: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        deadline_ms: APR_15_2025_MS,
    }
}

fn meeting(subject: &str) -> NewMeeting {
    NewMeeting {
        subject: subject.to_string(),
        start_ms: APR_15_2025_MS,
        duration_minutes: 30,
    }
}

#[test]
fn replace_semantics_drop_previous_set() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let u1 = add_user(&engine, "alpha");
    let u2 = add_user(&engine, "beta");
    let u3 = add_user(&engine, "gamma");

    let task_id = engine.create_task(&task("shared"), &[u1, u2]).unwrap();
    engine
        .edit_task(task_id, &TaskPatch::default(), Some(&[u3]))
        .unwrap();

    assert_eq!(
        facade.assigned_users(AssignmentKind::Task, task_id).unwrap(),
        vec![u3]
    );
}

#[test]
fn duplicate_user_ids_collapse_to_one_assignment() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let u1 = add_user(&engine, "alpha");
    let task_id = engine.create_task(&task("dupes"), &[u1, u1, u1]).unwrap();

    assert_eq!(
        facade.assigned_users(AssignmentKind::Task, task_id).unwrap(),
        vec![u1]
    );
}

#[test]
fn assigning_unknown_user_fails_and_rolls_back_creation() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let err = engine.create_task(&task("doomed"), &[123]).unwrap_err();

    assert!(matches!(
        err,
        CoreError::NotFound {
            kind: EntityKind::User,
            id: 123
        }
    ));
    // The whole operation is atomic: no task row survives the failed insert.
    assert!(facade.list_tasks().unwrap().is_empty());
}

#[test]
fn meeting_assignments_replace_like_task_assignments() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let u1 = add_user(&engine, "alpha");
    let u2 = add_user(&engine, "beta");

    let meeting_id = engine.create_meeting(&meeting("standup"), &[u1]).unwrap();
    engine
        .edit_meeting(meeting_id, &MeetingPatch::default(), Some(&[u2]))
        .unwrap();

    assert_eq!(
        facade
            .assigned_users(AssignmentKind::Meeting, meeting_id)
            .unwrap(),
        vec![u2]
    );
}

#[test]
fn clearing_assignments_with_empty_list_is_allowed() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let u1 = add_user(&engine, "alpha");
    let task_id = engine.create_task(&task("solo"), &[u1]).unwrap();
    engine
        .edit_task(task_id, &TaskPatch::default(), Some(&[]))
        .unwrap();

    assert!(facade
        .assigned_users(AssignmentKind::Task, task_id)
        .unwrap()
        .is_empty());
}

#[test]
fn delete_task_drops_its_assignments() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let u1 = add_user(&engine, "alpha");
    let task_id = engine.create_task(&task("short-lived"), &[u1]).unwrap();
    engine.delete_task(task_id).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM task_assignments;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 0);
    assert!(facade.user_by_id(u1).is_ok());
}

#[test]
fn delete_meeting_drops_its_assignments() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);

    let u1 = add_user(&engine, "alpha");
    let meeting_id = engine.create_meeting(&meeting("standup"), &[u1]).unwrap();
    engine.delete_meeting(meeting_id).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM meeting_assignments;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn assigned_users_for_unknown_owner_not_found() {
    let conn = setup();
    let facade = QueryFacade::new(&conn);

    let err = facade.assigned_users(AssignmentKind::Task, 5).unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            kind: EntityKind::Task,
            id: 5
        }
    ));
}
