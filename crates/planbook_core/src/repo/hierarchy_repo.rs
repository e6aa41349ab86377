//! Task hierarchy contracts and SQLite implementation.
//!
//! # Responsibility
//! - Maintain parent/child edges between tasks (`task_edges`).
//!
//! # Invariants
//! - A task has at most one parent; `set_parent` replaces an existing edge
//!   instead of duplicating it.
//! - The edge set stays acyclic: a task is never its own transitive ancestor.
//! - Removing a task detaches its edges without deleting descendant tasks;
//!   orphaned children become main tasks.

use crate::error::{CoreError, CoreResult};
use crate::model::entity::{EntityId, EntityKind, ValidationError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;

/// Interface for the parent/child task edge set.
pub trait TaskHierarchy {
    /// Makes `child_id` a subtask of `parent_id`.
    ///
    /// Fails with `Validation` on self-parenting, `NotFound` when either task
    /// is absent, and `Cycle` when `parent_id` already descends from
    /// `child_id`. Replaces any existing parent edge of `child_id`.
    fn set_parent(&self, child_id: EntityId, parent_id: EntityId) -> CoreResult<()>;
    /// Removes the parent edge of `child_id`, if any. Promoting a task that
    /// is already a main task is a no-op, not an error.
    fn clear_parent(&self, child_id: EntityId) -> CoreResult<()>;
    /// Direct parent, when one exists.
    fn parent_of(&self, task_id: EntityId) -> CoreResult<Option<EntityId>>;
    /// Direct children only; no recursion.
    fn children_of(&self, task_id: EntityId) -> CoreResult<Vec<EntityId>>;
    /// Drops every edge where the task is parent or child.
    fn detach(&self, task_id: EntityId) -> CoreResult<()>;
}

/// SQLite-backed task hierarchy.
pub struct SqliteTaskHierarchy<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskHierarchy<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn require_task(&self, id: EntityId) -> CoreResult<()> {
        let found: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        if found == 0 {
            return Err(CoreError::NotFound {
                kind: EntityKind::Task,
                id,
            });
        }
        Ok(())
    }

    fn ensure_no_cycle(&self, child_id: EntityId, parent_id: EntityId) -> CoreResult<()> {
        // Each task has at most one parent, so walking the chain upward from
        // the candidate parent visits every ancestor it would gain.
        let mut visited = HashSet::new();
        let mut cursor = self.parent_of(parent_id)?;
        while let Some(current) = cursor {
            if current == child_id {
                return Err(CoreError::Cycle {
                    task: child_id,
                    ancestor: parent_id,
                });
            }
            if !visited.insert(current) {
                return Err(CoreError::InvalidData(format!(
                    "task hierarchy already contains a cycle through task {current}"
                )));
            }
            cursor = self.parent_of(current)?;
        }
        Ok(())
    }
}

impl TaskHierarchy for SqliteTaskHierarchy<'_> {
    fn set_parent(&self, child_id: EntityId, parent_id: EntityId) -> CoreResult<()> {
        if child_id == parent_id {
            return Err(ValidationError::SelfParent(child_id).into());
        }
        self.require_task(child_id)?;
        self.require_task(parent_id)?;
        self.ensure_no_cycle(child_id, parent_id)?;

        self.conn.execute(
            "INSERT INTO task_edges (parent_task_id, child_task_id)
             VALUES (?1, ?2)
             ON CONFLICT(child_task_id)
             DO UPDATE SET parent_task_id = excluded.parent_task_id;",
            params![parent_id, child_id],
        )?;
        Ok(())
    }

    fn clear_parent(&self, child_id: EntityId) -> CoreResult<()> {
        self.require_task(child_id)?;
        self.conn.execute(
            "DELETE FROM task_edges WHERE child_task_id = ?1;",
            [child_id],
        )?;
        Ok(())
    }

    fn parent_of(&self, task_id: EntityId) -> CoreResult<Option<EntityId>> {
        let parent = self
            .conn
            .query_row(
                "SELECT parent_task_id FROM task_edges WHERE child_task_id = ?1;",
                [task_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(parent)
    }

    fn children_of(&self, task_id: EntityId) -> CoreResult<Vec<EntityId>> {
        let mut stmt = self.conn.prepare(
            "SELECT child_task_id FROM task_edges
             WHERE parent_task_id = ?1
             ORDER BY child_task_id ASC;",
        )?;
        let mut rows = stmt.query([task_id])?;
        let mut children = Vec::new();
        while let Some(row) = rows.next()? {
            children.push(row.get(0)?);
        }
        Ok(children)
    }

    fn detach(&self, task_id: EntityId) -> CoreResult<()> {
        self.conn.execute(
            "DELETE FROM task_edges WHERE parent_task_id = ?1 OR child_task_id = ?1;",
            [task_id],
        )?;
        Ok(())
    }
}
