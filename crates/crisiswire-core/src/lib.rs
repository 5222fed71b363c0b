//! # crisiswire-core
//!
//! Core types for the crisiswire disaster-response client toolkit.
//!
//! This crate provides the domain models, the closed real-time event catalog,
//! and the error taxonomy that the other crisiswire crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{
    ConnectionState, EventKind, Notification, Scope, DISASTER_EVENTS, GENERAL_EVENTS,
};
pub use models::*;
