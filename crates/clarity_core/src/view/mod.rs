//! Presentation-facing side of the core.
//!
//! # Responsibility
//! - Carry invalidation signals from services to renderers.
//! - Cache rendered read models until their scope is invalidated.
//! - Build the home page read model from current storage state.

pub mod cache;
pub mod home;
pub mod invalidation;
