//! Login, registration, and logout flows.

use tracing::info;

use crate::api::{ApiClient, ApiError};
use crate::auth::SessionStore;
use crate::models::Registration;

/// Log in and persist the returned token. Empty credentials are rejected
/// before any request is made.
pub async fn sign_in(client: &ApiClient, username: &str, password: &str) -> Result<(), ApiError> {
    let missing: Vec<&str> = [("username", username), ("password", password)]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(missing));
    }

    let auth = client.login(username, password).await?;
    client.session().save(&auth.token);
    info!(username = username, "Logged in");
    Ok(())
}

/// Register a new account. No token is issued; the user logs in afterwards.
pub async fn sign_up(
    client: &ApiClient,
    username: &str,
    password: &str,
    email: &str,
) -> Result<Registration, ApiError> {
    let registration = client.register(username, password, email).await?;
    info!(username = username, "Registered");
    Ok(registration)
}

pub fn sign_out(session: &SessionStore) {
    session.clear();
    info!("Logged out");
}
