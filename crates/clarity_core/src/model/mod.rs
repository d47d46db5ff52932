//! Domain model for tasks and the user preference slice.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep write-side validation next to the records it protects.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` and owned by one `UserId`.
//! - Completion preference is always one of the recognised variants.

pub mod task;
pub mod user;
