//! Domain model for projects, tasks and their audit history.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep date parsing and status derivation as pure functions.
//!
//! # Invariants
//! - A project exclusively owns its tasks.
//! - History records are independent of entity lifetimes.

pub mod date;
pub mod history;
pub mod project;
pub mod task;
