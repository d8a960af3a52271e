//! Persisted document models.

pub mod station;
pub mod user;

pub use station::*;
pub use user::*;
