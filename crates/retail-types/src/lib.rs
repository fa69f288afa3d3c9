//! Common types module for the retail system.
//!
//! This module defines the core data types and structures shared by the
//! storage, catalog, and order-lifecycle crates. It provides a centralized
//! location for shared types to ensure consistency across all components.

/// Customer and product entities managed by the catalog stores.
pub mod catalog;
/// Order entities, drafts, and the order status enumeration.
pub mod order;
/// Storage namespaces for the persisted data collections.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use catalog::*;
pub use order::*;
pub use storage::*;
pub use validation::*;
