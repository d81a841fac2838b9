//! Remote data gateway for the roster backend.
//!
//! This module provides the `Gateway` trait the store depends on and
//! `ApiClient`, its HTTP implementation. The backend wraps every payload
//! as `{ "data": ... }` and may return identifiers and dates in more than
//! one shape; `wire` normalizes them on the way in.

pub mod client;
pub mod error;
pub mod gateway;
mod wire;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
pub use error::ApiError;
pub use gateway::Gateway;
