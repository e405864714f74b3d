//! JIRA site profiles.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Connection details for one JIRA site.
///
/// API tokens are not part of the profile; they live in the OS keyring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique, whitespace-free profile name.
    pub name: String,
    /// Site URL, e.g. `https://company.atlassian.net`.
    pub url: String,
    /// Account email used for Basic Auth.
    pub email: String,
}

impl Profile {
    /// Create a new profile.
    ///
    /// A bare site name such as `company` is expanded to
    /// `https://company.atlassian.net`.
    pub fn new(name: impl Into<String>, url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: expand_site_url(&url.into()),
            email: email.into(),
        }
    }

    /// Check that the profile can be used to connect.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.name.is_empty() {
            return invalid("profile name cannot be empty".to_string());
        }
        if self.name.contains(char::is_whitespace) {
            return invalid(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            ));
        }
        if self.url.is_empty() {
            return invalid(format!("profile '{}': URL cannot be empty", self.name));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return invalid(format!(
                "profile '{}': URL must start with http:// or https://",
                self.name
            ));
        }
        if self.email.is_empty() {
            return invalid(format!("profile '{}': email cannot be empty", self.name));
        }
        if !self.email.contains('@') {
            return invalid(format!(
                "profile '{}': '{}' does not appear to be a valid email address",
                self.name, self.email
            ));
        }
        Ok(())
    }
}

/// Turn a bare Atlassian site name into its cloud URL.
fn expand_site_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.contains("://") || trimmed.contains('.') {
        trimmed.to_string()
    } else {
        format!("https://{}.atlassian.net", trimmed)
    }
}
