//! Operations the UI layer calls into.
//!
//! Every mutating operation is a full read-modify-write of the persisted
//! collection through [`crate::db::Store::update`].

pub mod auth;
pub mod booking;
pub mod error;
pub mod stations;

pub use error::{ApiError, ErrorBody, ErrorCode};
