//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Raise view invalidations after successful writes.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod preference_service;
pub mod task_service;
