//! Domain model for tracked communication items.
//!
//! # Responsibility
//! - Define the canonical record stored in the `comms` table.
//! - Own field-level validation shared by insert, update and import paths.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned `CommId`.
//! - Correctness flags only ever hold `Yes` or `No`.

pub mod comm;
