use std::path::PathBuf;

use tracing::{debug, error};

use super::{FileStorage, MemoryStorage, TokenStorage};

/// Storage key the token lives under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Session file name in the data directory
pub const SESSION_FILE: &str = "session.json";

/// Holds the single auth token for the process.
///
/// Storage failures never reach the caller: `save` and `clear` log and move
/// on, and `load` reports a failed read as "no token".
pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
}

impl SessionStore {
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// A session persisted to `session.json` inside `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(data_dir.into().join(SESSION_FILE)))
    }

    /// A session that is forgotten when the process exits.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn save(&self, token: &str) {
        match self.storage.set(AUTH_TOKEN_KEY, token) {
            Ok(()) => debug!("Saved auth token"),
            Err(e) => error!("Error saving auth token: {:#}", e),
        }
    }

    pub fn load(&self) -> Option<String> {
        match self.storage.get(AUTH_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                error!("Error getting auth token: {:#}", e);
                None
            }
        }
    }

    pub fn clear(&self) {
        match self.storage.remove(AUTH_TOKEN_KEY) {
            Ok(()) => debug!("Removed auth token"),
            Err(e) => error!("Error removing auth token: {:#}", e),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.load().is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
