//! Entity store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD over the `users`, `tasks`, and `meetings` tables.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Insert paths validate creation inputs and uniqueness before SQL.
//! - `list_*` returns rows in insertion (id) order.
//! - Row deletion touches only the entity table; relation cleanup is the
//!   mutation engine's responsibility.

use crate::error::{CoreError, CoreResult};
use crate::model::entity::{
    EntityId, EntityKind, Meeting, MeetingPatch, NewMeeting, NewTask, NewUser, Task, TaskPatch,
    User, UserPatch, ValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password_hash,
    role,
    department,
    created_at,
    updated_at
FROM users";

const TASK_SELECT_SQL: &str = "SELECT
    id,
    name,
    deadline_ms,
    created_at,
    updated_at
FROM tasks";

const MEETING_SELECT_SQL: &str = "SELECT
    id,
    subject,
    start_ms,
    duration_minutes,
    created_at,
    updated_at
FROM meetings";

/// Keyed storage interface for entity rows.
pub trait EntityStore {
    fn insert_user(&self, input: &NewUser) -> CoreResult<EntityId>;
    fn insert_task(&self, input: &NewTask) -> CoreResult<EntityId>;
    fn insert_meeting(&self, input: &NewMeeting) -> CoreResult<EntityId>;
    fn get_user(&self, id: EntityId) -> CoreResult<Option<User>>;
    fn get_task(&self, id: EntityId) -> CoreResult<Option<Task>>;
    fn get_meeting(&self, id: EntityId) -> CoreResult<Option<Meeting>>;
    fn list_users(&self) -> CoreResult<Vec<User>>;
    fn list_tasks(&self) -> CoreResult<Vec<Task>>;
    fn list_meetings(&self) -> CoreResult<Vec<Meeting>>;
    /// Tasks whose deadline falls on the given `YYYY-MM-DD` day (UTC).
    fn list_tasks_due_on(&self, day: &str) -> CoreResult<Vec<Task>>;
    /// Meetings whose start falls on the given `YYYY-MM-DD` day (UTC).
    fn list_meetings_on(&self, day: &str) -> CoreResult<Vec<Meeting>>;
    fn update_user(&self, id: EntityId, patch: &UserPatch) -> CoreResult<()>;
    fn update_task(&self, id: EntityId, patch: &TaskPatch) -> CoreResult<()>;
    fn update_meeting(&self, id: EntityId, patch: &MeetingPatch) -> CoreResult<()>;
    /// Removes the row only. Fails with `NotFound` when the id is absent.
    fn delete_row(&self, kind: EntityKind, id: EntityId) -> CoreResult<()>;
    fn exists(&self, kind: EntityKind, id: EntityId) -> CoreResult<bool>;
}

/// SQLite-backed entity store.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn insert_user(&self, input: &NewUser) -> CoreResult<EntityId> {
        input.validate()?;

        if username_taken(self.conn, &input.username, None)? {
            return Err(ValidationError::DuplicateUsername(input.username.clone()).into());
        }
        if email_taken(self.conn, &input.email, None)? {
            return Err(ValidationError::DuplicateEmail(input.email.clone()).into());
        }

        self.conn.execute(
            "INSERT INTO users (username, email, password_hash, role, department)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                input.username,
                input.email,
                input.password_hash,
                input.role,
                input.department,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_task(&self, input: &NewTask) -> CoreResult<EntityId> {
        input.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (name, deadline_ms) VALUES (?1, ?2);",
            params![input.name, input.deadline_ms],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_meeting(&self, input: &NewMeeting) -> CoreResult<EntityId> {
        input.validate()?;

        self.conn.execute(
            "INSERT INTO meetings (subject, start_ms, duration_minutes)
             VALUES (?1, ?2, ?3);",
            params![input.subject, input.start_ms, input.duration_minutes],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: EntityId) -> CoreResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn get_task(&self, id: EntityId) -> CoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn get_meeting(&self, id: EntityId) -> CoreResult<Option<Meeting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEETING_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meeting_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> CoreResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn list_tasks(&self) -> CoreResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn list_meetings(&self) -> CoreResult<Vec<Meeting>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEETING_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            meetings.push(parse_meeting_row(row)?);
        }
        Ok(meetings)
    }

    fn list_tasks_due_on(&self, day: &str) -> CoreResult<Vec<Task>> {
        // Date-only comparison, UTC. A day string SQLite cannot parse makes
        // date(?1) NULL, which matches nothing.
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE date(deadline_ms / 1000, 'unixepoch') = date(?1)
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([day])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn list_meetings_on(&self, day: &str) -> CoreResult<Vec<Meeting>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEETING_SELECT_SQL}
             WHERE date(start_ms / 1000, 'unixepoch') = date(?1)
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([day])?;
        let mut meetings = Vec::new();
        while let Some(row) = rows.next()? {
            meetings.push(parse_meeting_row(row)?);
        }
        Ok(meetings)
    }

    fn update_user(&self, id: EntityId, patch: &UserPatch) -> CoreResult<()> {
        patch.validate()?;

        if !self.exists(EntityKind::User, id)? {
            return Err(CoreError::NotFound {
                kind: EntityKind::User,
                id,
            });
        }
        if let Some(username) = patch.username.as_deref() {
            if username_taken(self.conn, username, Some(id))? {
                return Err(ValidationError::DuplicateUsername(username.to_string()).into());
            }
        }
        if let Some(email) = patch.email.as_deref() {
            if email_taken(self.conn, email, Some(id))? {
                return Err(ValidationError::DuplicateEmail(email.to_string()).into());
            }
        }

        let mut sets: Vec<&'static str> = Vec::new();
        let mut binds: Vec<Value> = Vec::new();
        if let Some(username) = &patch.username {
            sets.push("username = ?");
            binds.push(Value::Text(username.clone()));
        }
        if let Some(email) = &patch.email {
            sets.push("email = ?");
            binds.push(Value::Text(email.clone()));
        }
        if let Some(password_hash) = &patch.password_hash {
            sets.push("password_hash = ?");
            binds.push(Value::Text(password_hash.clone()));
        }
        if let Some(role) = &patch.role {
            sets.push("role = ?");
            binds.push(Value::Text(role.clone()));
        }
        if let Some(department) = &patch.department {
            sets.push("department = ?");
            binds.push(Value::Text(department.clone()));
        }
        sets.push("updated_at = (strftime('%s', 'now') * 1000)");

        let sql = format!("UPDATE users SET {} WHERE id = ?;", sets.join(", "));
        binds.push(Value::Integer(id));
        self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(())
    }

    fn update_task(&self, id: EntityId, patch: &TaskPatch) -> CoreResult<()> {
        patch.validate()?;

        if !self.exists(EntityKind::Task, id)? {
            return Err(CoreError::NotFound {
                kind: EntityKind::Task,
                id,
            });
        }

        let mut sets: Vec<&'static str> = Vec::new();
        let mut binds: Vec<Value> = Vec::new();
        if let Some(name) = &patch.name {
            sets.push("name = ?");
            binds.push(Value::Text(name.clone()));
        }
        if let Some(deadline_ms) = patch.deadline_ms {
            sets.push("deadline_ms = ?");
            binds.push(Value::Integer(deadline_ms));
        }
        sets.push("updated_at = (strftime('%s', 'now') * 1000)");

        let sql = format!("UPDATE tasks SET {} WHERE id = ?;", sets.join(", "));
        binds.push(Value::Integer(id));
        self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(())
    }

    fn update_meeting(&self, id: EntityId, patch: &MeetingPatch) -> CoreResult<()> {
        patch.validate()?;

        if !self.exists(EntityKind::Meeting, id)? {
            return Err(CoreError::NotFound {
                kind: EntityKind::Meeting,
                id,
            });
        }

        let mut sets: Vec<&'static str> = Vec::new();
        let mut binds: Vec<Value> = Vec::new();
        if let Some(subject) = &patch.subject {
            sets.push("subject = ?");
            binds.push(Value::Text(subject.clone()));
        }
        if let Some(start_ms) = patch.start_ms {
            sets.push("start_ms = ?");
            binds.push(Value::Integer(start_ms));
        }
        if let Some(duration_minutes) = patch.duration_minutes {
            sets.push("duration_minutes = ?");
            binds.push(Value::Integer(duration_minutes));
        }
        sets.push("updated_at = (strftime('%s', 'now') * 1000)");

        let sql = format!("UPDATE meetings SET {} WHERE id = ?;", sets.join(", "));
        binds.push(Value::Integer(id));
        self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(())
    }

    fn delete_row(&self, kind: EntityKind, id: EntityId) -> CoreResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", entity_table(kind)),
            [id],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound { kind, id });
        }
        Ok(())
    }

    fn exists(&self, kind: EntityKind, id: EntityId) -> CoreResult<bool> {
        let found: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
                entity_table(kind)
            ),
            [id],
            |row| row.get(0),
        )?;
        Ok(found == 1)
    }
}

fn entity_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Task => "tasks",
        EntityKind::Meeting => "meetings",
    }
}

fn username_taken(
    conn: &Connection,
    username: &str,
    exclude: Option<EntityId>,
) -> CoreResult<bool> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM users WHERE username = ?1 AND id != COALESCE(?2, -1)
        );",
        params![username, exclude],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

fn email_taken(conn: &Connection, email: &str, exclude: Option<EntityId>) -> CoreResult<bool> {
    let taken: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM users WHERE email = ?1 AND id != COALESCE(?2, -1)
        );",
        params![email, exclude],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

fn parse_user_row(row: &Row<'_>) -> CoreResult<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: row.get("role")?,
        department: row.get("department")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_task_row(row: &Row<'_>) -> CoreResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        deadline_ms: row.get("deadline_ms")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_meeting_row(row: &Row<'_>) -> CoreResult<Meeting> {
    let duration_minutes: i64 = row.get("duration_minutes")?;
    if duration_minutes <= 0 {
        return Err(CoreError::InvalidData(format!(
            "non-positive duration `{duration_minutes}` in meetings.duration_minutes"
        )));
    }
    Ok(Meeting {
        id: row.get("id")?,
        subject: row.get("subject")?,
        start_ms: row.get("start_ms")?,
        duration_minutes,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
