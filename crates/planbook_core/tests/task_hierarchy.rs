use planbook_core::db::open_db_in_memory;
use planbook_core::{
    CoreError, EntityKind, MutationEngine, NewTask, QueryFacade, ValidationError,
};

const APR_01_2025_MS: i64 = 1_743_465_600_000;
const APR_15_2025_MS: i64 = 1_744_675_200_000;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn task(name: &str, deadline_ms: i64) -> NewTask {
    NewTask {
        name: name.to_string(),
        deadline_ms,
    }
}

#[test]
fn create_sub_task_links_parent() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let parent = engine
        .create_task(&task("file taxes", APR_15_2025_MS), &[])
        .unwrap();
    let child = engine
        .create_sub_task(parent, &task("gather receipts", APR_01_2025_MS), &[])
        .unwrap();

    assert_eq!(facade.parent_of(child).unwrap(), Some(parent));
    assert_eq!(facade.subtasks_of(parent).unwrap(), vec![child]);
}

#[test]
fn create_sub_task_missing_parent_not_found_and_no_row_inserted() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let err = engine
        .create_sub_task(77, &task("orphan", APR_01_2025_MS), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            kind: EntityKind::Task,
            id: 77
        }
    ));
    assert!(facade.list_tasks().unwrap().is_empty());
}

#[test]
fn promote_clears_parent_and_is_a_noop_for_main_tasks() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let parent = engine
        .create_task(&task("file taxes", APR_15_2025_MS), &[])
        .unwrap();
    let child = engine
        .create_sub_task(parent, &task("gather receipts", APR_01_2025_MS), &[])
        .unwrap();

    engine.promote_task(child).unwrap();
    assert_eq!(facade.parent_of(child).unwrap(), None);

    // Promoting a task that is already a main task succeeds without change.
    engine.promote_task(child).unwrap();
    assert_eq!(facade.parent_of(child).unwrap(), None);
}

#[test]
fn promote_unknown_task_not_found() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);

    let err = engine.promote_task(9).unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            kind: EntityKind::Task,
            id: 9
        }
    ));
}

#[test]
fn demote_to_self_rejected() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);

    let id = engine
        .create_task(&task("solo", APR_15_2025_MS), &[])
        .unwrap();
    let err = engine.demote_task(id, id).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::SelfParent(_))
    ));
}

#[test]
fn demote_cycle_rejected_and_edges_unchanged() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let a = engine.create_task(&task("a", APR_15_2025_MS), &[]).unwrap();
    let b = engine.create_task(&task("b", APR_15_2025_MS), &[]).unwrap();

    engine.demote_task(a, b).unwrap();
    let err = engine.demote_task(b, a).unwrap_err();

    assert!(matches!(err, CoreError::Cycle { task, ancestor } if task == b && ancestor == a));
    assert_eq!(facade.parent_of(a).unwrap(), Some(b));
    assert_eq!(facade.parent_of(b).unwrap(), None);
}

#[test]
fn transitive_cycle_rejected() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);

    let a = engine.create_task(&task("a", APR_15_2025_MS), &[]).unwrap();
    let b = engine.create_sub_task(a, &task("b", APR_15_2025_MS), &[]).unwrap();
    let c = engine.create_sub_task(b, &task("c", APR_15_2025_MS), &[]).unwrap();

    let err = engine.demote_task(a, c).unwrap_err();
    assert!(matches!(err, CoreError::Cycle { .. }));
}

#[test]
fn redemote_replaces_parent_instead_of_duplicating() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let first = engine
        .create_task(&task("first parent", APR_15_2025_MS), &[])
        .unwrap();
    let second = engine
        .create_task(&task("second parent", APR_15_2025_MS), &[])
        .unwrap();
    let child = engine
        .create_sub_task(first, &task("child", APR_01_2025_MS), &[])
        .unwrap();

    engine.demote_task(child, second).unwrap();

    assert_eq!(facade.parent_of(child).unwrap(), Some(second));
    assert!(facade.subtasks_of(first).unwrap().is_empty());
    assert_eq!(facade.subtasks_of(second).unwrap(), vec![child]);
}

#[test]
fn delete_task_orphans_subtasks() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let parent = engine
        .create_task(&task("file taxes", APR_15_2025_MS), &[])
        .unwrap();
    let child = engine
        .create_sub_task(parent, &task("gather receipts", APR_01_2025_MS), &[])
        .unwrap();

    engine.delete_task(parent).unwrap();

    let orphan = facade.task_by_id(child).unwrap();
    assert_eq!(orphan.name, "gather receipts");
    assert_eq!(facade.parent_of(child).unwrap(), None);
}

#[test]
fn promote_then_demote_round_trip() {
    let conn = setup();
    let engine = MutationEngine::new(&conn);
    let facade = QueryFacade::new(&conn);

    let main = engine
        .create_task(&task("file taxes", APR_15_2025_MS), &[])
        .unwrap();
    let sub = engine
        .create_sub_task(main, &task("gather receipts", APR_01_2025_MS), &[])
        .unwrap();
    assert_eq!(facade.parent_of(sub).unwrap(), Some(main));

    engine.promote_task(sub).unwrap();
    assert_eq!(facade.parent_of(sub).unwrap(), None);

    engine.demote_task(sub, main).unwrap();
    assert_eq!(facade.parent_of(sub).unwrap(), Some(main));

    let err = engine.demote_task(main, sub).unwrap_err();
    assert!(matches!(err, CoreError::Cycle { .. }));
    assert_eq!(facade.parent_of(sub).unwrap(), Some(main));
}
