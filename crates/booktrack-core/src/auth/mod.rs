//! Session token persistence.
//!
//! This module provides:
//! - `SessionStore`: save/load/clear of the single auth token
//! - `TokenStorage`: the key-value backend it sits on, with file, keychain
//!   and in-memory implementations
//!
//! Tokens do not expire client-side; a stale token is only noticed when the
//! service rejects a request.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStorage;
pub use session::{SessionStore, AUTH_TOKEN_KEY};
pub use storage::{FileStorage, MemoryStorage, TokenStorage};
