//! External API integrations

pub mod lookup;

pub use lookup::LookupClient;
