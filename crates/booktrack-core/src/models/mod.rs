//! Data models for the book tracker service.
//!
//! - `Book`, `BookFields`: a stored book and the editable form behind it
//! - `UserProfile`: the authenticated user as returned by `/profile`
//! - Auth payloads: `AuthToken`, `Registration` and their request bodies

pub mod auth;
pub mod book;
pub mod user;

pub use auth::{AuthToken, LoginRequest, RegisterRequest, Registration};
pub use book::{Book, BookFields, BookFilters};
pub use user::UserProfile;
