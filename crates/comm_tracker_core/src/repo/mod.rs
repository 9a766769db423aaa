//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for communication records.
//! - Isolate SQLite query details from service and CLI orchestration.
//!
//! # Invariants
//! - Write paths validate required fields before any SQL mutation.
//! - Repository APIs return semantic errors (`NotFound`, `Validation`) in
//!   addition to DB transport errors.

pub mod comm_repo;
