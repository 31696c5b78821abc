//! Credential model and the manager that obtains, caches, and refreshes it.

pub mod credential;
pub mod manager;

pub use credential::*;
pub use manager::*;
