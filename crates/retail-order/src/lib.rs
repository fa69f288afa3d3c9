//! Order lifecycle management for the retail system.
//!
//! Owns the set of valid order statuses and the fixed transition table
//! between them, validates and applies status changes against the storage
//! service, and creates new orders. The [`builder`] module assembles a
//! complete system (storage, catalog stores, lifecycle manager) from
//! configuration.

/// Assembles storage, catalog stores, and the lifecycle manager from config.
pub mod builder;
/// The lifecycle manager and its operations.
pub mod lifecycle;
/// The fixed transition table over order statuses.
pub mod transitions;

pub use builder::{OrderSystem, OrderSystemBuilder, RetailSummary};
pub use lifecycle::{OrderDetails, OrderError, OrderLifecycle};
pub use transitions::{allowed_transitions, can_transition};
