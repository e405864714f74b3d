//! Application settings configuration.

use serde::{Deserialize, Serialize};

/// Default number of issues per page in the flat table.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page size used when fetching every issue for the tree view.
pub const DEFAULT_TREE_PAGE_SIZE: u32 = 100;

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The name of the default profile to use.
    pub default_profile: Option<String>,
    /// Issues per page in the flat table.
    pub page_size: u32,
    /// Issues per request when fetching all pages for the tree view.
    pub tree_page_size: u32,
    /// App key used for add-on scoped properties (`--global`).
    pub app_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_profile: None,
            page_size: DEFAULT_PAGE_SIZE,
            tree_page_size: DEFAULT_TREE_PAGE_SIZE,
            app_id: None,
        }
    }
}
