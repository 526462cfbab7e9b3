//! Shared types and logic for the Restaurant Inventory Management Platform
//!
//! This crate contains the domain vocabulary (statuses, transaction types,
//! the polymorphic recipe component reference), document reference
//! formatting, the unit-inference heuristic, and the pure validation
//! routines used by the backend services.

pub mod refs;
pub mod types;
pub mod units;
pub mod validation;

pub use refs::*;
pub use types::*;
pub use units::*;
pub use validation::*;
