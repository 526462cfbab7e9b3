//! Domain models for the Restaurant Inventory Management Platform
//!
//! Re-exports the shared domain vocabulary; row and payload types live next
//! to the service that owns them

pub use shared::types::*;
