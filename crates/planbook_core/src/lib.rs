//! Core domain logic for Planbook.
//! This crate is the single source of truth for scheduling-data invariants:
//! entity storage, task/meeting assignments, and the task hierarchy.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use error::{CoreError, CoreResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{
    EntityId, EntityKind, Meeting, MeetingPatch, NewMeeting, NewTask, NewUser, Task, TaskPatch,
    User, UserPatch, ValidationError,
};
pub use repo::assignment_repo::{AssignmentKind, AssignmentRelations, SqliteAssignmentRelations};
pub use repo::entity_repo::{EntityStore, SqliteEntityStore};
pub use repo::hierarchy_repo::{SqliteTaskHierarchy, TaskHierarchy};
pub use service::mutation_engine::{MutationEngine, WIPE_CONFIRMATION_TOKEN};
pub use service::query_facade::QueryFacade;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
