//! JIRA API request and response types.
//!
//! These types model the parts of the JIRA REST API v3 used by the settings
//! toggle and the issue manager.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

fn default_true() -> bool {
    true
}

/// Avatar URLs for a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarUrls {
    /// 48x48 pixel avatar.
    #[serde(rename = "48x48", default)]
    pub size_48: Option<String>,
    /// 24x24 pixel avatar.
    #[serde(rename = "24x24", default)]
    pub size_24: Option<String>,
    /// 16x16 pixel avatar.
    #[serde(rename = "16x16", default)]
    pub size_16: Option<String>,
    /// 32x32 pixel avatar.
    #[serde(rename = "32x32", default)]
    pub size_32: Option<String>,
}

/// A JIRA user.
///
/// Returned as an issue's assignee and by the user search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's account ID.
    pub account_id: String,
    /// The user's display name. Hidden for some account types.
    #[serde(default)]
    pub display_name: String,
    /// The user's email address (may be empty).
    #[serde(default)]
    pub email_address: Option<String>,
    /// Whether the user is active.
    #[serde(default = "default_true")]
    pub active: bool,
    /// URLs for the user's avatar images.
    #[serde(default)]
    pub avatar_urls: Option<AvatarUrls>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// A JIRA project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// The project ID.
    pub id: String,
    /// The project key (e.g., "PROJ").
    pub key: String,
    /// The project name.
    pub name: String,
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key)
    }
}

/// One page of `GET /rest/api/3/project/search`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSearchPage {
    /// Projects on this page.
    #[serde(default)]
    pub values: Vec<Project>,
    /// Total number of projects, when reported.
    #[serde(default)]
    pub total: Option<u32>,
    /// Whether this is the last page.
    #[serde(default = "default_true")]
    pub is_last: bool,
}

/// Search result from a JQL query.
///
/// Returned by `GET /rest/api/3/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The index of the first result.
    #[serde(default)]
    pub start_at: u32,
    /// Maximum results requested.
    #[serde(default)]
    pub max_results: u32,
    /// Total number of matching issues.
    #[serde(default)]
    pub total: u32,
    /// The list of issues.
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// A JIRA issue as returned by search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    /// The issue ID.
    pub id: String,
    /// The issue key (e.g., "PROJ-123").
    pub key: String,
    /// REST URL of the issue.
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
    /// The requested issue fields.
    pub fields: IssueFields,
}

impl Issue {
    /// Get the issue summary.
    pub fn summary(&self) -> &str {
        &self.fields.summary
    }

    /// Get the issue status name.
    pub fn status(&self) -> &str {
        &self.fields.status.name
    }

    /// Get the issue type name.
    pub fn issue_type(&self) -> &str {
        &self.fields.issuetype.name
    }

    /// Get the assignee display name, or "Unassigned" if not set.
    pub fn assignee_name(&self) -> &str {
        self.fields
            .assignee
            .as_ref()
            .map(|u| u.display_name.as_str())
            .unwrap_or("Unassigned")
    }

    /// Key of the declared parent issue, if the parent field was requested
    /// and is set.
    pub fn parent_key(&self) -> Option<&str> {
        self.fields
            .parent
            .as_ref()
            .map(|p| p.key.as_str())
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.fields.summary)
    }
}

/// Issue fields requested by the issue manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueFields {
    /// The issue summary/title.
    #[serde(default)]
    pub summary: String,
    /// The issue status.
    pub status: Status,
    /// The issue type (Bug, Story, Task, Epic, etc.).
    pub issuetype: IssueType,
    /// The issue assignee; absent or null when unassigned.
    #[serde(default)]
    pub assignee: Option<User>,
    /// The parent issue; only present when `parent` was requested.
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

/// Reference to a parent issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentRef {
    /// The parent issue ID.
    #[serde(default)]
    pub id: String,
    /// The parent issue key.
    #[serde(default)]
    pub key: String,
}

/// Issue status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// The status ID.
    #[serde(default)]
    pub id: String,
    /// The status name (e.g., "To Do", "In Progress", "Done").
    pub name: String,
    /// The status category.
    #[serde(default)]
    pub status_category: Option<StatusCategory>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Status category (groups statuses into to-do, in-progress, done).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCategory {
    /// The category ID.
    #[serde(default)]
    pub id: u32,
    /// The category key.
    #[serde(default)]
    pub key: String,
    /// The category name.
    #[serde(default)]
    pub name: String,
}

/// Issue type, also called work type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueType {
    /// The issue type ID.
    #[serde(default)]
    pub id: String,
    /// The issue type name.
    pub name: String,
    /// Whether this is a subtask type.
    #[serde(default)]
    pub subtask: bool,
    /// URL to the issue type icon.
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A workflow transition available for an issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transition {
    /// The transition ID.
    pub id: String,
    /// The transition name (e.g., "Start Progress").
    pub name: String,
    /// The status the issue moves to.
    #[serde(default)]
    pub to: Option<Status>,
}

/// Response of `GET /rest/api/3/issue/{id}/transitions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// The assignee selection in an issue update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeChoice {
    /// Clear the assignee.
    Unassigned,
    /// Assign to the given account ID.
    Account(String),
}

impl FromStr for AssigneeChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("unassigned") {
            Ok(AssigneeChoice::Unassigned)
        } else {
            Ok(AssigneeChoice::Account(trimmed.to_string()))
        }
    }
}

/// Changes for a single `PUT /rest/api/3/issue/{id}`.
///
/// Only the parts that are set end up in the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueUpdate {
    /// New summary.
    pub summary: Option<String>,
    /// New issue type, by name.
    pub issue_type: Option<String>,
    /// New assignee.
    pub assignee: Option<AssigneeChoice>,
    /// Workflow transition to perform.
    pub transition_id: Option<String>,
}

impl IssueUpdate {
    /// Whether nothing would be changed.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.issue_type.is_none()
            && self.assignee.is_none()
            && self.transition_id.is_none()
    }

    /// Build the JSON request body.
    pub fn to_body(&self) -> Value {
        let mut fields = Map::new();
        if let Some(summary) = &self.summary {
            fields.insert("summary".to_string(), json!(summary));
        }
        if let Some(name) = &self.issue_type {
            fields.insert("issuetype".to_string(), json!({ "name": name }));
        }
        match &self.assignee {
            Some(AssigneeChoice::Unassigned) => {
                fields.insert("assignee".to_string(), Value::Null);
            }
            Some(AssigneeChoice::Account(id)) => {
                fields.insert("assignee".to_string(), json!({ "accountId": id }));
            }
            None => {}
        }

        let mut body = Map::new();
        if !fields.is_empty() {
            body.insert("fields".to_string(), Value::Object(fields));
        }
        if let Some(id) = &self.transition_id {
            body.insert("transition".to_string(), json!({ "id": id }));
        }
        Value::Object(body)
    }
}

/// Where an entity property is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyScope {
    /// A property on a project, by project ID or key.
    Project(String),
    /// A property on the add-on itself, by app key.
    Addon(String),
}

impl PropertyScope {
    /// REST path (below `/rest/api/3`) of `key` in this scope.
    pub fn path(&self, key: &str) -> String {
        match self {
            PropertyScope::Project(id) => format!(
                "/project/{}/properties/{}",
                urlencoding::encode(id),
                urlencoding::encode(key)
            ),
            PropertyScope::Addon(app_id) => format!(
                "/addons/{}/properties/{}",
                urlencoding::encode(app_id),
                urlencoding::encode(key)
            ),
        }
    }
}

impl fmt::Display for PropertyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyScope::Project(id) => write!(f, "project {}", id),
            PropertyScope::Addon(app_id) => write!(f, "app {}", app_id),
        }
    }
}

/// An entity property as returned by the properties endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityProperty {
    /// The property key.
    pub key: String,
    /// The stored JSON value.
    #[serde(default)]
    pub value: Value,
}
