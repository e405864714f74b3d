//! JIRA API client implementation.
//!
//! This module provides the HTTP client for the JIRA REST API v3. Every
//! operation is a single request: failures are returned to the caller as-is
//! and never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::service::{IssueSearch, IssueTracker, PropertyStore};
use super::types::{
    EntityProperty, IssueType, IssueUpdate, Project, ProjectSearchPage, PropertyScope,
    SearchResult, Transition, TransitionsResponse, User,
};
use crate::config::Profile;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// JIRA caps `maxResults` on search at this value.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Path prefix of the REST API v3.
const API_PREFIX: &str = "/rest/api/3";

/// The JIRA API client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    /// The HTTP client.
    client: Client,
    /// The base URL for the JIRA instance.
    base_url: String,
    /// Authentication credentials.
    auth: Auth,
}

impl JiraClient {
    /// Create a client for a profile.
    ///
    /// Resolves the API token from the environment or the OS keyring.
    #[instrument(skip(profile), fields(profile_name = %profile.name))]
    pub fn new(profile: &Profile) -> Result<Self> {
        info!("Creating JIRA client for profile");
        let auth = Auth::resolve(&profile.name, &profile.email)?;
        debug!(email = %auth.email(), url = %profile.url, "Resolved credentials");
        Self::with_auth(&profile.url, auth)
    }

    /// Create a client with explicit credentials.
    #[cfg(test)]
    pub fn with_credentials(base_url: &str, email: &str, token: &str) -> Result<Self> {
        Self::with_auth(base_url, Auth::new(email, token))
    }

    fn with_auth(base_url: &str, auth: Auth) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            auth,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path such as `/project`.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, self.auth.header_value())
            .header(header::ACCEPT, "application/json")
    }

    /// Perform a GET request and parse the JSON body.
    #[instrument(skip(self), fields(url = %url))]
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    /// Perform a request whose response body is not needed.
    async fn send_expecting_success(&self, builder: RequestBuilder) -> Result<()> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", body);
        Err(error_from_response(status, &url, &body))
    }

    /// Handle the HTTP response, checking for errors and parsing JSON.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);
            Err(error_from_response(status, &url, &error_body))
        }
    }
}

#[async_trait]
impl IssueSearch for JiraClient {
    #[instrument(skip(self), fields(jql = %jql))]
    async fn search_issues(
        &self,
        jql: &str,
        start_at: u32,
        max_results: u32,
        fields: &[&str],
    ) -> Result<SearchResult> {
        debug!("Searching issues: startAt={}, maxResults={}", start_at, max_results);

        let url = format!(
            "{}{}",
            self.api_url("/search"),
            search_query(jql, start_at, max_results, fields)
        );
        let result: SearchResult = self.get(&url).await.map_err(|e| {
            error!("Issue search failed: {}", e);
            e
        })?;
        debug!("Found {} issues (total: {})", result.issues.len(), result.total);
        Ok(result)
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let projects: Vec<Project> = self.get(&self.api_url("/project")).await?;
        debug!("Fetched {} projects", projects.len());
        Ok(projects)
    }

    #[instrument(skip(self))]
    async fn search_projects(&self) -> Result<Vec<Project>> {
        let page: ProjectSearchPage = self.get(&self.api_url("/project/search")).await?;
        debug!(
            "Project search returned {} projects (last page: {})",
            page.values.len(),
            page.is_last
        );
        Ok(page.values)
    }

    #[instrument(skip(self, update), fields(issue_id = %issue_id))]
    async fn update_issue(&self, issue_id: &str, update: &IssueUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("no changes to apply".to_string()));
        }
        let url = self.api_url(&format!("/issue/{}", urlencoding::encode(issue_id)));
        let builder = self.request(Method::PUT, &url).json(&update.to_body());
        self.send_expecting_success(builder).await.map_err(|e| {
            error!("Failed to update issue: {}", e);
            e
        })?;
        info!("Issue updated");
        Ok(())
    }

    #[instrument(skip(self), fields(issue_id = %issue_id))]
    async fn delete_issue(&self, issue_id: &str) -> Result<()> {
        let url = self.api_url(&format!("/issue/{}", urlencoding::encode(issue_id)));
        self.send_expecting_success(self.request(Method::DELETE, &url))
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotFound(format!("Issue '{}' not found", issue_id)),
                other => other,
            })?;
        info!("Issue deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(issue_id = %issue_id))]
    async fn get_transitions(&self, issue_id: &str) -> Result<Vec<Transition>> {
        let url = self.api_url(&format!(
            "/issue/{}/transitions",
            urlencoding::encode(issue_id)
        ));
        let response: TransitionsResponse = self.get(&url).await?;
        debug!("Issue has {} transitions", response.transitions.len());
        Ok(response.transitions)
    }

    #[instrument(skip(self))]
    async fn get_project_issue_types(&self, project_id: &str) -> Result<Vec<IssueType>> {
        let url = format!(
            "{}?projectId={}",
            self.api_url("/issuetype/project"),
            urlencoding::encode(project_id)
        );
        self.get(&url).await
    }

    #[instrument(skip(self))]
    async fn get_assignable_users(&self, project_key: &str) -> Result<Vec<User>> {
        let url = format!(
            "{}?project={}",
            self.api_url("/user/assignable/search"),
            urlencoding::encode(project_key)
        );
        self.get(&url).await
    }

    #[instrument(skip(self))]
    async fn search_users(&self, start_at: u32, max_results: u32) -> Result<Vec<User>> {
        let url = format!(
            "{}?startAt={}&maxResults={}",
            self.api_url("/users/search"),
            start_at,
            max_results
        );
        self.get(&url).await
    }
}

#[async_trait]
impl PropertyStore for JiraClient {
    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_property(
        &self,
        scope: &PropertyScope,
        key: &str,
    ) -> Result<Option<EntityProperty>> {
        match self.get::<EntityProperty>(&self.api_url(&scope.path(key))).await {
            Ok(property) => Ok(Some(property)),
            Err(e) if e.is_not_found() => {
                debug!("Property {} is not set", key);
                Ok(None)
            }
            Err(e) => {
                warn!("Failed to read property {}: {}", key, e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self, value), fields(scope = %scope))]
    async fn set_property(&self, scope: &PropertyScope, key: &str, value: &Value) -> Result<()> {
        let builder = self
            .request(Method::PUT, &self.api_url(&scope.path(key)))
            .json(value);
        self.send_expecting_success(builder).await.map_err(|e| {
            error!("Failed to set property {}: {}", key, e);
            e
        })
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn delete_property(&self, scope: &PropertyScope, key: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &self.api_url(&scope.path(key)));
        match self.send_expecting_success(builder).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("Property {} was already absent", key);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete property {}: {}", key, e);
                Err(e)
            }
        }
    }
}

/// Build the query string of an issue search request.
fn search_query(jql: &str, start_at: u32, max_results: u32, fields: &[&str]) -> String {
    let mut query = format!(
        "?jql={}&startAt={}&maxResults={}",
        urlencoding::encode(jql),
        start_at,
        max_results.min(MAX_PAGE_SIZE)
    );
    if !fields.is_empty() {
        query.push_str("&fields=");
        query.push_str(&fields.join(","));
    }
    query
}

/// Create an appropriate error from an HTTP response.
///
/// JIRA reports details either as `errorMessages` or as a field map under
/// `errors`; the URL is used when neither is present.
fn error_from_response(status: StatusCode, url: &str, body: &str) -> ApiError {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(arr) = json.get("errorMessages").and_then(Value::as_array) {
            let messages: Vec<&str> = arr.iter().filter_map(Value::as_str).collect();
            if !messages.is_empty() {
                return ApiError::from_status(status, &messages.join(", "));
            }
        }
        if let Some(obj) = json.get("errors").and_then(Value::as_object) {
            let error_strings: Vec<String> = obj
                .iter()
                .map(|(k, v)| match v.as_str() {
                    Some(s) => format!("{}: {}", k, s),
                    None => format!("{}: {}", k, v),
                })
                .collect();
            if !error_strings.is_empty() {
                return ApiError::from_status(status, &error_strings.join(", "));
            }
        }
    }

    ApiError::from_status(status, url)
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}
