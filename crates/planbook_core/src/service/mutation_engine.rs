//! Mutation engine: the single write entry point for the core.
//!
//! # Responsibility
//! - Express every cross-store change as one atomic, invariant-checked
//!   operation spanning the entity store, assignment relations, and the
//!   task hierarchy.
//!
//! # Invariants
//! - Each operation runs inside one immediate SQLite transaction; on error
//!   the transaction is rolled back and no partial state remains.
//! - Engine operations are serialized per connection: `rusqlite::Connection`
//!   is not `Sync`, so two operations never interleave on one store handle.
//! - Deleting an entity cleans up every relation row referencing it.

use crate::error::{CoreError, CoreResult};
use crate::model::entity::{
    EntityId, EntityKind, MeetingPatch, NewMeeting, NewTask, NewUser, TaskPatch, UserPatch,
    ValidationError,
};
use crate::repo::assignment_repo::{AssignmentKind, AssignmentRelations, SqliteAssignmentRelations};
use crate::repo::entity_repo::{EntityStore, SqliteEntityStore};
use crate::repo::hierarchy_repo::{SqliteTaskHierarchy, TaskHierarchy};
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Confirmation token required by `drop_all_of_kind`.
pub const WIPE_CONFIRMATION_TOKEN: &str = "goodbye123";

/// Atomic mutation surface over one store handle.
///
/// The handle is passed in explicitly; no process-global connection exists,
/// so tests and embedders can run isolated instances side by side.
pub struct MutationEngine<'conn> {
    conn: &'conn Connection,
}

impl<'conn> MutationEngine<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a user row. Fails with `Validation` on a blank required field
    /// or a duplicate username/email.
    pub fn create_user(&self, input: &NewUser) -> CoreResult<EntityId> {
        self.run_logged("create_user", |tx| {
            SqliteEntityStore::new(tx).insert_user(input)
        })
    }

    /// Creates a task row and sets its assignment set in one step.
    pub fn create_task(&self, input: &NewTask, user_ids: &[EntityId]) -> CoreResult<EntityId> {
        self.run_logged("create_task", |tx| {
            let task_id = SqliteEntityStore::new(tx).insert_task(input)?;
            SqliteAssignmentRelations::new(tx).replace_for_owner(
                AssignmentKind::Task,
                task_id,
                user_ids,
            )?;
            Ok(task_id)
        })
    }

    /// Creates a task row as a subtask of an existing parent.
    pub fn create_sub_task(
        &self,
        parent_id: EntityId,
        input: &NewTask,
        user_ids: &[EntityId],
    ) -> CoreResult<EntityId> {
        self.run_logged("create_sub_task", |tx| {
            let store = SqliteEntityStore::new(tx);
            if !store.exists(EntityKind::Task, parent_id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::Task,
                    id: parent_id,
                });
            }
            let task_id = store.insert_task(input)?;
            SqliteTaskHierarchy::new(tx).set_parent(task_id, parent_id)?;
            SqliteAssignmentRelations::new(tx).replace_for_owner(
                AssignmentKind::Task,
                task_id,
                user_ids,
            )?;
            Ok(task_id)
        })
    }

    /// Creates a meeting row and sets its assignment set in one step.
    pub fn create_meeting(
        &self,
        input: &NewMeeting,
        user_ids: &[EntityId],
    ) -> CoreResult<EntityId> {
        self.run_logged("create_meeting", |tx| {
            let meeting_id = SqliteEntityStore::new(tx).insert_meeting(input)?;
            SqliteAssignmentRelations::new(tx).replace_for_owner(
                AssignmentKind::Meeting,
                meeting_id,
                user_ids,
            )?;
            Ok(meeting_id)
        })
    }

    /// Applies a partial update to a user row.
    pub fn edit_user(&self, id: EntityId, patch: &UserPatch) -> CoreResult<()> {
        self.run_logged("edit_user", |tx| {
            SqliteEntityStore::new(tx).update_user(id, patch)
        })
    }

    /// Applies a partial update to a task row, optionally replacing its
    /// assignment set. An edit with neither fields nor a user list is
    /// rejected, not silently accepted.
    pub fn edit_task(
        &self,
        id: EntityId,
        patch: &TaskPatch,
        user_ids: Option<&[EntityId]>,
    ) -> CoreResult<()> {
        self.run_logged("edit_task", |tx| {
            if patch.is_empty() && user_ids.is_none() {
                return Err(ValidationError::EmptyUpdate(EntityKind::Task).into());
            }
            let store = SqliteEntityStore::new(tx);
            if !store.exists(EntityKind::Task, id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::Task,
                    id,
                });
            }
            if !patch.is_empty() {
                store.update_task(id, patch)?;
            }
            if let Some(user_ids) = user_ids {
                SqliteAssignmentRelations::new(tx).replace_for_owner(
                    AssignmentKind::Task,
                    id,
                    user_ids,
                )?;
            }
            Ok(())
        })
    }

    /// Applies a partial update to a meeting row, optionally replacing its
    /// assignment set.
    pub fn edit_meeting(
        &self,
        id: EntityId,
        patch: &MeetingPatch,
        user_ids: Option<&[EntityId]>,
    ) -> CoreResult<()> {
        self.run_logged("edit_meeting", |tx| {
            if patch.is_empty() && user_ids.is_none() {
                return Err(ValidationError::EmptyUpdate(EntityKind::Meeting).into());
            }
            let store = SqliteEntityStore::new(tx);
            if !store.exists(EntityKind::Meeting, id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::Meeting,
                    id,
                });
            }
            if !patch.is_empty() {
                store.update_meeting(id, patch)?;
            }
            if let Some(user_ids) = user_ids {
                SqliteAssignmentRelations::new(tx).replace_for_owner(
                    AssignmentKind::Meeting,
                    id,
                    user_ids,
                )?;
            }
            Ok(())
        })
    }

    /// Removes the task's parent edge, making it a main task. No-op when the
    /// task already has no parent.
    pub fn promote_task(&self, id: EntityId) -> CoreResult<()> {
        self.run_logged("promote_task", |tx| {
            SqliteTaskHierarchy::new(tx).clear_parent(id)
        })
    }

    /// Assigns or reassigns the task's parent edge, enforcing the
    /// single-parent and acyclicity invariants.
    pub fn demote_task(&self, id: EntityId, new_parent_id: EntityId) -> CoreResult<()> {
        self.run_logged("demote_task", |tx| {
            SqliteTaskHierarchy::new(tx).set_parent(id, new_parent_id)
        })
    }

    /// Deletes a user and every assignment referencing them. Tasks and
    /// meetings the user was assigned to are untouched.
    pub fn delete_user(&self, id: EntityId) -> CoreResult<()> {
        self.run_logged("delete_user", |tx| {
            let store = SqliteEntityStore::new(tx);
            if !store.exists(EntityKind::User, id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::User,
                    id,
                });
            }
            SqliteAssignmentRelations::new(tx).remove_user(id)?;
            store.delete_row(EntityKind::User, id)
        })
    }

    /// Deletes a task, its assignments, and its hierarchy edges. Descendant
    /// tasks are not deleted; they become main tasks.
    pub fn delete_task(&self, id: EntityId) -> CoreResult<()> {
        self.run_logged("delete_task", |tx| {
            let store = SqliteEntityStore::new(tx);
            if !store.exists(EntityKind::Task, id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::Task,
                    id,
                });
            }
            SqliteAssignmentRelations::new(tx).remove_owner(AssignmentKind::Task, id)?;
            SqliteTaskHierarchy::new(tx).detach(id)?;
            store.delete_row(EntityKind::Task, id)
        })
    }

    /// Deletes a meeting and its assignments.
    pub fn delete_meeting(&self, id: EntityId) -> CoreResult<()> {
        self.run_logged("delete_meeting", |tx| {
            let store = SqliteEntityStore::new(tx);
            if !store.exists(EntityKind::Meeting, id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::Meeting,
                    id,
                });
            }
            SqliteAssignmentRelations::new(tx).remove_owner(AssignmentKind::Meeting, id)?;
            store.delete_row(EntityKind::Meeting, id)
        })
    }

    /// Wipes the entire store for one entity kind plus every relation row
    /// referencing that kind. Requires the fixed confirmation token.
    pub fn drop_all_of_kind(&self, kind: EntityKind, confirmation_token: &str) -> CoreResult<()> {
        self.run_logged("drop_all_of_kind", |tx| {
            if confirmation_token != WIPE_CONFIRMATION_TOKEN {
                return Err(CoreError::Unauthorized);
            }
            match kind {
                EntityKind::User => {
                    // Every assignment references a user, so both relation
                    // tables empty out with the user store.
                    tx.execute("DELETE FROM task_assignments;", [])?;
                    tx.execute("DELETE FROM meeting_assignments;", [])?;
                    tx.execute("DELETE FROM users;", [])?;
                }
                EntityKind::Task => {
                    tx.execute("DELETE FROM task_assignments;", [])?;
                    tx.execute("DELETE FROM task_edges;", [])?;
                    tx.execute("DELETE FROM tasks;", [])?;
                }
                EntityKind::Meeting => {
                    tx.execute("DELETE FROM meeting_assignments;", [])?;
                    tx.execute("DELETE FROM meetings;", [])?;
                }
            }
            Ok(())
        })
    }

    /// Runs one operation inside an immediate transaction and emits a
    /// structured log event with outcome and duration. Dropping an
    /// uncommitted transaction rolls it back, so an `Err` from `op` leaves
    /// the store unchanged.
    fn run_logged<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&Transaction<'_>) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        match op(&tx) {
            Ok(value) => {
                tx.commit()?;
                info!(
                    "event={operation} module=engine status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event={operation} module=engine status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}
