//! REST API client module for the book tracker service.
//!
//! This module provides the `ApiClient` for logging in, registering,
//! reading the profile, and managing books. Authenticated calls carry the
//! session token as a bearer credential.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ErrorKind, MISSING_FIELDS_MESSAGE, NETWORK_ERROR_MESSAGE};
