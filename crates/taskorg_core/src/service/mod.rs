//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Host the recurrence engine, which works purely on persisted state.

pub mod clock;
pub mod organizer_service;
pub mod recurrence;
