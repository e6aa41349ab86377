//! Repository layer: SQLite persistence for entities and relations.
//!
//! # Responsibility
//! - Define data access contracts for the entity store, assignment
//!   relations, and the task hierarchy.
//! - Isolate SQL details from service-level orchestration.
//!
//! # Invariants
//! - Write paths validate inputs before SQL mutations.
//! - Repositories return semantic errors (`NotFound`, `Validation`) in
//!   addition to DB transport errors.
//! - Cross-repository atomicity is owned by the mutation engine, which runs
//!   each operation inside one transaction.

pub mod assignment_repo;
pub mod entity_repo;
pub mod hierarchy_repo;
