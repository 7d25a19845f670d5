use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::UserProfile;

/// The profile screen's view of the current user.
///
/// `edit` only changes the local copy. The service has no profile update
/// endpoint yet, so local edits are tracked and reported through
/// `has_unsynced_edits` rather than silently dropped.
#[derive(Debug, Clone, Default)]
pub struct ProfileView {
    user: Option<UserProfile>,
    unsynced_edits: bool,
}

impl ProfileView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Load the profile if a session token exists. Without one the view
    /// stays empty and no request is made.
    pub async fn load(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        if !client.session().is_logged_in() {
            debug!("No session token, skipping profile fetch");
            self.user = None;
            return Ok(());
        }

        match client.fetch_profile().await {
            Ok(profile) => {
                self.user = Some(profile);
                self.unsynced_edits = false;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch user profile");
                Err(e)
            }
        }
    }

    /// Change the local username and email. Returns false when there is no
    /// profile loaded to edit.
    pub fn edit(&mut self, username: impl Into<String>, email: impl Into<String>) -> bool {
        match self.user.as_mut() {
            Some(user) => {
                user.username = username.into();
                user.email = email.into();
                self.unsynced_edits = true;
                true
            }
            None => false,
        }
    }

    pub fn has_unsynced_edits(&self) -> bool {
        self.unsynced_edits
    }

    /// Forget the loaded profile, e.g. after logout.
    pub fn reset(&mut self) {
        self.user = None;
        self.unsynced_edits = false;
    }
}
