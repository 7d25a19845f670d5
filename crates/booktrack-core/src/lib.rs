//! Core library for the booktrack reading list client.
//!
//! - `auth`: the persisted session token and its storage backends
//! - `api`: the authenticated REST client and its error shape
//! - `models`: books, profile, and auth payloads
//! - `state`: the local state each screen keeps, driven by the client
//! - `config`: on-disk settings and directory locations

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod state;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use auth::SessionStore;
pub use config::{Config, TokenBackend};
pub use models::{AuthToken, Book, BookFields, BookFilters, Registration, UserProfile};
pub use state::{BookList, ProfileView};
