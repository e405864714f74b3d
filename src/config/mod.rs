//! Configuration management.
//!
//! The configuration is a TOML file in the platform config directory
//! (`~/.config/jira-panel/config.toml` on Linux) holding site profiles and
//! application settings.

mod profile;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::MAX_PAGE_SIZE;

pub use profile::Profile;
pub use settings::Settings;

/// Directory name under the platform config directory.
const APP_DIR: &str = "jira-panel";

/// Configuration file name.
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The config directory could not be created.
    #[error("failed to create configuration directory: {0}")]
    CreateDirError(#[source] std::io::Error),

    /// The config file could not be read.
    #[error("failed to read configuration file: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config file could not be written.
    #[error("failed to write configuration file: {0}")]
    WriteError(#[source] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The configuration is structurally valid but semantically wrong.
    #[error("invalid configuration: {0}")]
    ValidationError(String),

    /// A named profile does not exist.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    /// No profile was named and none is configured as default.
    #[error("no profile configured")]
    NoProfile,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Application settings.
    #[serde(default)]
    pub settings: Settings,
    /// Configured JIRA sites.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Config {
    /// Path of the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the configuration from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the configuration from `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!(path = %path.display(), profiles = config.profiles.len(), "Loaded config");
        Ok(config)
    }

    /// Save the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(ConfigError::WriteError)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Validate every profile and check that names are unique.
    pub fn validate(&self) -> Result<()> {
        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }
        for (name, size) in [
            ("page_size", self.settings.page_size),
            ("tree_page_size", self.settings.tree_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_PAGE_SIZE, size
                )));
            }
        }
        Ok(())
    }

    /// Look up a profile by name.
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The default profile, falling back to the first configured one.
    pub fn get_default_profile(&self) -> Option<&Profile> {
        self.settings
            .default_profile
            .as_deref()
            .and_then(|name| self.get_profile(name))
            .or_else(|| self.profiles.first())
    }

    /// Pick the profile to use: `name` if given, else the default.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<&Profile> {
        match name {
            Some(name) => self
                .get_profile(name)
                .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string())),
            None => self.get_default_profile().ok_or(ConfigError::NoProfile),
        }
    }

    /// Add a profile. The first profile added becomes the default.
    pub fn add_profile(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;
        if self.get_profile(&profile.name).is_some() {
            return Err(ConfigError::ValidationError(format!(
                "profile '{}' already exists",
                profile.name
            )));
        }
        if self.settings.default_profile.is_none() {
            self.settings.default_profile = Some(profile.name.clone());
        }
        self.profiles.push(profile);
        Ok(())
    }

    /// Remove a profile, clearing the default if it pointed at it.
    pub fn remove_profile(&mut self, name: &str) -> Result<Profile> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?;
        if self.settings.default_profile.as_deref() == Some(name) {
            self.settings.default_profile = None;
        }
        Ok(self.profiles.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn profile(name: &str) -> Profile {
        Profile::new(name, "https://company.atlassian.net", "user@company.com")
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.settings.page_size, settings::DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.add_profile(profile("work")).unwrap();
        config.settings.app_id = Some("my-app".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.settings.default_profile.as_deref(), Some("work"));
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[settings]
page_size = 3

[[profiles]]
name = "work"
url = "https://company.atlassian.net"
email = "user@company.com"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.settings.page_size, 3);
        assert_eq!(config.settings.tree_page_size, settings::DEFAULT_TREE_PAGE_SIZE);
        assert_eq!(config.get_default_profile().unwrap().name, "work");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "settings = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_duplicate_profiles_rejected() {
        let mut config = Config::default();
        config.add_profile(profile("work")).unwrap();
        let err = config.add_profile(profile("work")).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        config.profiles.push(profile("work"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = Config::default();
        config.settings.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_size_above_search_limit_rejected() {
        let mut config = Config::default();
        config.settings.tree_page_size = MAX_PAGE_SIZE + 100;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tree_page_size"));

        config.settings.tree_page_size = MAX_PAGE_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_profile() {
        let mut config = Config::default();
        assert!(matches!(
            config.resolve_profile(None),
            Err(ConfigError::NoProfile)
        ));

        config.add_profile(profile("work")).unwrap();
        config.add_profile(profile("home")).unwrap();
        assert_eq!(config.resolve_profile(None).unwrap().name, "work");
        assert_eq!(config.resolve_profile(Some("home")).unwrap().name, "home");
        assert!(matches!(
            config.resolve_profile(Some("other")),
            Err(ConfigError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_remove_default_profile_falls_back_to_first() {
        let mut config = Config::default();
        config.add_profile(profile("work")).unwrap();
        config.add_profile(profile("home")).unwrap();

        let removed = config.remove_profile("work").unwrap();
        assert_eq!(removed.name, "work");
        assert!(config.settings.default_profile.is_none());
        assert_eq!(config.get_default_profile().unwrap().name, "home");
        assert!(config.remove_profile("work").is_err());
    }
}
