//! Credentials for the JIRA API.
//!
//! Requests use Basic Auth (email + API token). Tokens are kept in the OS
//! keyring, keyed by profile name; `JIRA_API_TOKEN` overrides the keyring
//! for scripted use.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use super::error::{ApiError, Result};

/// The keyring service name for stored tokens.
const KEYRING_SERVICE: &str = "jira-panel";

/// Environment variable that takes precedence over the keyring.
pub const TOKEN_ENV_VAR: &str = "JIRA_API_TOKEN";

/// Authentication credentials for JIRA.
#[derive(Debug, Clone)]
pub struct Auth {
    /// The user's email address.
    email: String,
    /// The Base64-encoded authorization header value.
    auth_header: String,
}

impl Auth {
    /// Create credentials from email and token.
    ///
    /// The token is encoded immediately and the raw token is not stored.
    pub fn new(email: &str, token: &str) -> Self {
        let auth_header = build_auth_header(email, token);
        Self {
            email: email.to_string(),
            auth_header,
        }
    }

    /// Resolve credentials for a profile.
    ///
    /// Uses `JIRA_API_TOKEN` when set and non-empty, otherwise the token
    /// stored in the keyring for `profile_name`.
    pub fn resolve(profile_name: &str, email: &str) -> Result<Self> {
        if let Some(token) = token_from_env() {
            debug!("Using API token from {}", TOKEN_ENV_VAR);
            return Ok(Self::new(email, &token));
        }
        let token = get_token(profile_name)?;
        Ok(Self::new(email, &token))
    }

    /// The complete "Basic ..." header value.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// The email address.
    pub fn email(&self) -> &str {
        &self.email
    }
}

fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV_VAR)
        .ok()
        .filter(|token| !token.trim().is_empty())
}

/// Encodes "email:token" in Base64 and prepends "Basic ".
fn build_auth_header(email: &str, token: &str) -> String {
    let credentials = format!("{}:{}", email, token);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

/// Store an API token in the OS keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(token)
        .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))?;

    Ok(())
}

/// Retrieve an API token from the OS keyring.
pub fn get_token(profile_name: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
}

/// Delete an API token from the OS keyring.
pub fn delete_token(profile_name: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .delete_password()
        .map_err(|e| ApiError::Keyring(format!("failed to delete token: {}", e)))?;

    Ok(())
}
