//! Trait seams over the JIRA REST API.
//!
//! The retrieval loop, the issue manager and the settings toggle are written
//! against these traits; `JiraClient` is the HTTP implementation.

use async_trait::async_trait;
use serde_json::Value;

use super::error::Result;
use super::types::{
    EntityProperty, IssueType, IssueUpdate, Project, PropertyScope, SearchResult, Transition, User,
};

/// JQL issue search.
#[async_trait]
pub trait IssueSearch: Send + Sync {
    /// Run one bounded search request.
    ///
    /// `fields` lists the issue fields to return.
    async fn search_issues(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: &[&str],
    ) -> Result<SearchResult>;
}

/// Project, issue and user operations used by the issue manager.
#[async_trait]
pub trait IssueTracker: IssueSearch {
    /// `GET /project`: every project visible to the user.
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// `GET /project/search`: the first page of the paginated project search.
    async fn search_projects(&self) -> Result<Vec<Project>>;

    /// `PUT /issue/{id}`.
    async fn update_issue(&self, issue_id: &str, update: &IssueUpdate) -> Result<()>;

    /// `DELETE /issue/{id}`.
    async fn delete_issue(&self, issue_id: &str) -> Result<()>;

    /// `GET /issue/{id}/transitions`.
    async fn get_transitions(&self, issue_id: &str) -> Result<Vec<Transition>>;

    /// `GET /issuetype/project?projectId=`.
    async fn get_project_issue_types(&self, project_id: &str) -> Result<Vec<IssueType>>;

    /// `GET /user/assignable/search?project=`.
    async fn get_assignable_users(&self, project_key: &str) -> Result<Vec<User>>;

    /// `GET /users/search`: one page of all users.
    async fn search_users(&self, start_at: u32, max_results: u32) -> Result<Vec<User>>;
}

/// Scoped key/value entity property storage.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Read a property. A missing property is `Ok(None)`, not an error.
    async fn get_property(
        &self,
        scope: &PropertyScope,
        key: &str,
    ) -> Result<Option<EntityProperty>>;

    /// Create or replace a property.
    async fn set_property(&self, scope: &PropertyScope, key: &str, value: &Value) -> Result<()>;

    /// Remove a property. Removing a missing property succeeds.
    async fn delete_property(&self, scope: &PropertyScope, key: &str) -> Result<()>;
}
