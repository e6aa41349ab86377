//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into invariant-preserving operations.
//! - Keep transport/presentation layers decoupled from storage details.
//!
//! # Invariants
//! - All multi-store writes go through the mutation engine; nothing writes
//!   to a single repository directly from outside this module.

pub mod mutation_engine;
pub mod query_facade;
