//! Shared errors, market types and engine traits

pub mod errors;
pub mod traits;
pub mod types;
