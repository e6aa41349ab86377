//! Assignment relation contracts and SQLite implementation.
//!
//! # Responsibility
//! - Maintain the Task<->User and Meeting<->User many-to-many sets.
//!
//! # Invariants
//! - Assignments are a set: duplicate (owner, user) pairs collapse to one.
//! - Every stored assignment references an existing user; user existence is
//!   checked here, owner existence by the mutation engine.
//! - `replace_for_owner` has remove-all-then-add semantics, not a diff/merge.

use crate::error::{CoreError, CoreResult};
use crate::model::entity::{EntityId, EntityKind};
use rusqlite::{params, Connection};
use std::collections::BTreeSet;

/// Which side of the schedule owns the assignment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentKind {
    /// Rows in `task_assignments`, owned by a task.
    Task,
    /// Rows in `meeting_assignments`, owned by a meeting.
    Meeting,
}

impl AssignmentKind {
    /// Entity kind of the owning side, for existence checks and errors.
    pub fn owner_kind(self) -> EntityKind {
        match self {
            Self::Task => EntityKind::Task,
            Self::Meeting => EntityKind::Meeting,
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Task => "task_assignments",
            Self::Meeting => "meeting_assignments",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Task => "task_id",
            Self::Meeting => "meeting_id",
        }
    }
}

/// Interface for the many-to-many assignment sets.
pub trait AssignmentRelations {
    /// Replaces the entire assignment set for one owner.
    ///
    /// Duplicate ids in `user_ids` collapse to one assignment. Fails with
    /// `NotFound` when any referenced user does not exist.
    fn replace_for_owner(
        &self,
        kind: AssignmentKind,
        owner_id: EntityId,
        user_ids: &[EntityId],
    ) -> CoreResult<()>;
    /// Drops all assignments owned by one task or meeting.
    fn remove_owner(&self, kind: AssignmentKind, owner_id: EntityId) -> CoreResult<()>;
    /// Drops all assignments (of both kinds) referencing one user.
    fn remove_user(&self, user_id: EntityId) -> CoreResult<()>;
    /// Lists assigned user ids for one owner, ascending.
    fn users_for(&self, kind: AssignmentKind, owner_id: EntityId) -> CoreResult<Vec<EntityId>>;
}

/// SQLite-backed assignment relations.
pub struct SqliteAssignmentRelations<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAssignmentRelations<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AssignmentRelations for SqliteAssignmentRelations<'_> {
    fn replace_for_owner(
        &self,
        kind: AssignmentKind,
        owner_id: EntityId,
        user_ids: &[EntityId],
    ) -> CoreResult<()> {
        let unique_ids: BTreeSet<EntityId> = user_ids.iter().copied().collect();
        for user_id in &unique_ids {
            if !user_exists(self.conn, *user_id)? {
                return Err(CoreError::NotFound {
                    kind: EntityKind::User,
                    id: *user_id,
                });
            }
        }

        self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1;",
                kind.table(),
                kind.owner_column()
            ),
            [owner_id],
        )?;

        let insert_sql = format!(
            "INSERT OR IGNORE INTO {} ({}, user_id) VALUES (?1, ?2);",
            kind.table(),
            kind.owner_column()
        );
        let mut stmt = self.conn.prepare(&insert_sql)?;
        for user_id in unique_ids {
            stmt.execute(params![owner_id, user_id])?;
        }
        Ok(())
    }

    fn remove_owner(&self, kind: AssignmentKind, owner_id: EntityId) -> CoreResult<()> {
        self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1;",
                kind.table(),
                kind.owner_column()
            ),
            [owner_id],
        )?;
        Ok(())
    }

    fn remove_user(&self, user_id: EntityId) -> CoreResult<()> {
        self.conn
            .execute("DELETE FROM task_assignments WHERE user_id = ?1;", [user_id])?;
        self.conn.execute(
            "DELETE FROM meeting_assignments WHERE user_id = ?1;",
            [user_id],
        )?;
        Ok(())
    }

    fn users_for(&self, kind: AssignmentKind, owner_id: EntityId) -> CoreResult<Vec<EntityId>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT user_id FROM {} WHERE {} = ?1 ORDER BY user_id ASC;",
            kind.table(),
            kind.owner_column()
        ))?;
        let mut rows = stmt.query([owner_id])?;
        let mut user_ids = Vec::new();
        while let Some(row) = rows.next()? {
            user_ids.push(row.get(0)?);
        }
        Ok(user_ids)
    }
}

fn user_exists(conn: &Connection, user_id: EntityId) -> CoreResult<bool> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(found == 1)
}
