//! Flutter-facing bindings for the Clarity core.

pub mod api;
