//! Entity row shapes, creation inputs, and partial-update patches.
//!
//! # Responsibility
//! - Define the canonical records stored by the entity store.
//! - Validate field-level requirements before persistence.
//!
//! # Invariants
//! - `id` is assigned by the store, monotonic, and never reused.
//! - Timestamps are Unix epoch milliseconds, UTC; display formatting is the
//!   presentation layer's concern.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for every stored entity.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntityId = i64;

/// Entity category managed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Task,
    Meeting,
}

impl EntityKind {
    /// Stable lowercase label used in errors and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Task => "task",
            Self::Meeting => "meeting",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical user row.
///
/// `password_hash` is opaque to the core; hashing happens in the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Canonical task row. Hierarchy membership lives in `task_edges`, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub name: String,
    /// Epoch ms deadline.
    pub deadline_ms: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Canonical meeting row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: EntityId,
    pub subject: String,
    /// Epoch ms start time.
    pub start_ms: i64,
    pub duration_minutes: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input for a user row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: String,
}

impl NewUser {
    /// Rejects blank required fields before any store write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("username", &self.username)?;
        require_field("email", &self.email)?;
        require_field("password_hash", &self.password_hash)?;
        require_field("role", &self.role)?;
        require_field("department", &self.department)?;
        Ok(())
    }
}

/// Creation input for a task row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub deadline_ms: i64,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("name", &self.name)
    }
}

/// Creation input for a meeting row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMeeting {
    pub subject: String,
    pub start_ms: i64,
    pub duration_minutes: i64,
}

impl NewMeeting {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("subject", &self.subject)?;
        if self.duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration(self.duration_minutes));
        }
        Ok(())
    }
}

/// Partial update for a user row. `None` fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.department.is_none()
    }

    /// Rejects patches with nothing to change, and blank values for fields
    /// that must stay populated.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate(EntityKind::User));
        }
        require_optional_field("username", self.username.as_deref())?;
        require_optional_field("email", self.email.as_deref())?;
        require_optional_field("password_hash", self.password_hash.as_deref())?;
        require_optional_field("role", self.role.as_deref())?;
        require_optional_field("department", self.department.as_deref())?;
        Ok(())
    }
}

/// Partial update for a task row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub deadline_ms: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.deadline_ms.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate(EntityKind::Task));
        }
        require_optional_field("name", self.name.as_deref())
    }
}

/// Partial update for a meeting row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MeetingPatch {
    pub subject: Option<String>,
    pub start_ms: Option<i64>,
    pub duration_minutes: Option<i64>,
}

impl MeetingPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.start_ms.is_none() && self.duration_minutes.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate(EntityKind::Meeting));
        }
        require_optional_field("subject", self.subject.as_deref())?;
        if let Some(duration) = self.duration_minutes {
            if duration <= 0 {
                return Err(ValidationError::NonPositiveDuration(duration));
            }
        }
        Ok(())
    }
}

/// Field-level validation failures surfaced before any store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank after trim.
    MissingField(&'static str),
    /// Another user already holds this username.
    DuplicateUsername(String),
    /// Another user already holds this email.
    DuplicateEmail(String),
    /// Partial update carries no fields to change.
    EmptyUpdate(EntityKind),
    /// A task cannot be its own parent.
    SelfParent(EntityId),
    /// Meeting duration must be a positive number of minutes.
    NonPositiveDuration(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is missing or blank"),
            Self::DuplicateUsername(username) => {
                write!(f, "username `{username}` is already taken")
            }
            Self::DuplicateEmail(email) => write!(f, "email `{email}` is already taken"),
            Self::EmptyUpdate(kind) => write!(f, "{kind} update has no fields to change"),
            Self::SelfParent(id) => write!(f, "task {id} cannot be its own parent"),
            Self::NonPositiveDuration(minutes) => {
                write!(f, "meeting duration must be positive, got {minutes}")
            }
        }
    }
}

impl Error for ValidationError {}

fn require_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn require_optional_field(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => require_field(field, value),
        None => Ok(()),
    }
}
