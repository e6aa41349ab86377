//! Read-only query facade for the presentation layer.
//!
//! # Responsibility
//! - Expose list, get-by-id, date-filter, and relation projections without
//!   side effects.
//!
//! # Invariants
//! - Never writes; never participates in the mutation atomicity contract.
//! - Reads observe committed state only: mutations commit atomically, so a
//!   task row is never visible without its assignment rows.

use crate::error::{CoreError, CoreResult};
use crate::model::entity::{EntityId, EntityKind, Meeting, Task, User};
use crate::repo::assignment_repo::{AssignmentKind, AssignmentRelations, SqliteAssignmentRelations};
use crate::repo::entity_repo::{EntityStore, SqliteEntityStore};
use crate::repo::hierarchy_repo::{SqliteTaskHierarchy, TaskHierarchy};
use rusqlite::Connection;

/// Read-only projections over one store handle.
pub struct QueryFacade<'conn> {
    conn: &'conn Connection,
}

impl<'conn> QueryFacade<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn list_users(&self) -> CoreResult<Vec<User>> {
        SqliteEntityStore::new(self.conn).list_users()
    }

    pub fn list_tasks(&self) -> CoreResult<Vec<Task>> {
        SqliteEntityStore::new(self.conn).list_tasks()
    }

    pub fn list_meetings(&self) -> CoreResult<Vec<Meeting>> {
        SqliteEntityStore::new(self.conn).list_meetings()
    }

    /// Loads one user. Fails with `NotFound` when the id is absent.
    pub fn user_by_id(&self, id: EntityId) -> CoreResult<User> {
        SqliteEntityStore::new(self.conn)
            .get_user(id)?
            .ok_or(CoreError::NotFound {
                kind: EntityKind::User,
                id,
            })
    }

    /// Loads one task. Fails with `NotFound` when the id is absent.
    pub fn task_by_id(&self, id: EntityId) -> CoreResult<Task> {
        SqliteEntityStore::new(self.conn)
            .get_task(id)?
            .ok_or(CoreError::NotFound {
                kind: EntityKind::Task,
                id,
            })
    }

    /// Loads one meeting. Fails with `NotFound` when the id is absent.
    pub fn meeting_by_id(&self, id: EntityId) -> CoreResult<Meeting> {
        SqliteEntityStore::new(self.conn)
            .get_meeting(id)?
            .ok_or(CoreError::NotFound {
                kind: EntityKind::Meeting,
                id,
            })
    }

    /// Tasks whose deadline falls on the given `YYYY-MM-DD` day. The
    /// comparison ignores time-of-day and is evaluated in UTC; display
    /// timezone handling belongs to the presentation layer.
    pub fn tasks_due_on(&self, day: &str) -> CoreResult<Vec<Task>> {
        SqliteEntityStore::new(self.conn).list_tasks_due_on(day)
    }

    /// Meetings whose start falls on the given `YYYY-MM-DD` day.
    pub fn meetings_on(&self, day: &str) -> CoreResult<Vec<Meeting>> {
        SqliteEntityStore::new(self.conn).list_meetings_on(day)
    }

    /// Assigned user ids for one task or meeting, ascending.
    pub fn assigned_users(
        &self,
        kind: AssignmentKind,
        owner_id: EntityId,
    ) -> CoreResult<Vec<EntityId>> {
        self.require_entity(kind.owner_kind(), owner_id)?;
        SqliteAssignmentRelations::new(self.conn).users_for(kind, owner_id)
    }

    /// Direct parent of a task, when one exists.
    pub fn parent_of(&self, task_id: EntityId) -> CoreResult<Option<EntityId>> {
        self.require_entity(EntityKind::Task, task_id)?;
        SqliteTaskHierarchy::new(self.conn).parent_of(task_id)
    }

    /// Direct subtasks of a task, ascending.
    pub fn subtasks_of(&self, task_id: EntityId) -> CoreResult<Vec<EntityId>> {
        self.require_entity(EntityKind::Task, task_id)?;
        SqliteTaskHierarchy::new(self.conn).children_of(task_id)
    }

    fn require_entity(&self, kind: EntityKind, id: EntityId) -> CoreResult<()> {
        if !SqliteEntityStore::new(self.conn).exists(kind, id)? {
            return Err(CoreError::NotFound { kind, id });
        }
        Ok(())
    }
}
