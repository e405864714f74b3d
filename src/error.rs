//! Top-level error type.
//!
//! Library modules return [`ApiError`] or [`ConfigError`]; commands fold both
//! into [`AppError`], which knows how to explain itself to the user.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;

/// Any error a command can end with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Api(#[from] ApiError),

    /// Reading the delete confirmation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Message for stderr, without internal detail.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Check that it is readable.".to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
                ConfigError::NoProfile => "No JIRA profile is configured.".to_string(),
            },
            AppError::Api(e) => match e {
                ApiError::Unauthorized => {
                    "Authentication failed. Please check your email and API token.".to_string()
                }
                ApiError::Forbidden => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ApiError::NotFound(resource) => format!("{}: not found.", resource),
                ApiError::Conflict(msg) => format!("The change conflicts with the current state: {}", msg),
                ApiError::BadRequest(msg) => format!("JIRA rejected the request: {}", msg),
                ApiError::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => "JIRA server error. Please try again later.".to_string(),
                ApiError::Network(_) => {
                    "Connection failed. Please check your internet connection.".to_string()
                }
                ApiError::Keyring(_) => {
                    "Could not read the API token from secure storage.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from JIRA. Please try again.".to_string()
                }
                ApiError::InvalidRequest(msg) => msg.clone(),
            },
            AppError::Io(_) => "Could not read from the terminal.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// A hint for fixing the error, when there is an obvious one.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::NoProfile) | AppError::Config(ConfigError::ProfileNotFound(_)) => {
                Some("Run 'jira-panel profile add <NAME> --url <URL> --email <EMAIL>' to add one.")
            }
            AppError::Api(ApiError::Unauthorized) => Some(
                "Check your API token at https://id.atlassian.com/manage-profile/security/api-tokens",
            ),
            AppError::Api(ApiError::Keyring(_)) => {
                Some("Set JIRA_API_TOKEN or re-add the profile with --token.")
            }
            AppError::Api(ApiError::RateLimited) => Some("Wait a few seconds and run the command again."),
            AppError::Api(ApiError::Network(_)) => Some("Check your internet connection and JIRA URL."),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::NoProfile.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::NoProfile)));
    }

    #[test]
    fn test_app_error_from_api_error() {
        let app_err: AppError = ApiError::Unauthorized.into();
        assert!(matches!(app_err, AppError::Api(ApiError::Unauthorized)));
    }

    #[test]
    fn test_user_message_unauthorized() {
        let msg = AppError::Api(ApiError::Unauthorized).user_message();
        assert!(msg.contains("email"));
        assert!(msg.contains("API token"));
    }

    #[test]
    fn test_user_message_not_found_names_resource() {
        let err = AppError::Api(ApiError::NotFound("Cannot determine current project".to_string()));
        assert!(err.user_message().contains("Cannot determine current project"));
    }

    #[test]
    fn test_invalid_request_passes_message_through() {
        let err = AppError::Api(ApiError::InvalidRequest("summary cannot be empty".to_string()));
        assert_eq!(err.user_message(), "summary cannot be empty");
        assert!(err.suggested_action().is_none());
    }

    #[test]
    fn test_user_message_config_validation() {
        let err = AppError::Config(ConfigError::ValidationError("duplicate profile".to_string()));
        assert!(err.user_message().contains("duplicate profile"));
    }

    #[test]
    fn test_suggested_action_missing_profile() {
        let action = AppError::Config(ConfigError::NoProfile).suggested_action();
        assert!(action.unwrap().contains("profile add"));
    }

    #[test]
    fn test_suggested_action_unauthorized() {
        let action = AppError::Api(ApiError::Unauthorized).suggested_action();
        assert!(action.unwrap().contains("api-tokens"));
    }

    #[test]
    fn test_other_error() {
        let err = AppError::other("something went wrong");
        assert_eq!(err.user_message(), "something went wrong");
    }
}
