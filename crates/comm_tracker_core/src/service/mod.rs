//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and transfer calls into use-case level APIs.
//! - Keep the CLI decoupled from storage details.

pub mod comm_service;
