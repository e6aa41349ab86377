//! Domain model for scheduling entities.
//!
//! # Responsibility
//! - Define canonical row shapes for users, tasks, and meetings.
//! - Define creation inputs and partial-update patches with their validation.
//!
//! # Invariants
//! - Every entity is identified by a stable integer `EntityId`.
//! - Creation inputs are validated before any SQL mutation.

pub mod entity;
