//! Paginated issue retrieval for a single project.

use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, Result};
use crate::api::types::Issue;
use crate::api::{IssueSearch, MAX_PAGE_SIZE};

/// Fields every issue row needs.
const BASE_FIELDS: [&str; 4] = ["summary", "status", "assignee", "issuetype"];

/// Extra field carrying parent linkage.
const PARENT_FIELD: &str = "parent";

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    /// Key of the project to search.
    pub project_key: String,
    /// Offset of the first issue.
    pub start_at: u32,
    /// Issues per request.
    pub page_size: u32,
    /// Request the `parent` field.
    pub include_parent: bool,
    /// Keep requesting pages until the result set is exhausted.
    pub fetch_all: bool,
}

impl IssueQuery {
    /// A single-page query without parent linkage.
    pub fn page(project_key: impl Into<String>, start_at: u32, page_size: u32) -> Self {
        Self {
            project_key: project_key.into(),
            start_at,
            page_size,
            include_parent: false,
            fetch_all: false,
        }
    }

    /// A query for every issue of the project, with parent linkage.
    pub fn all_with_parents(project_key: impl Into<String>, page_size: u32) -> Self {
        Self {
            project_key: project_key.into(),
            start_at: 0,
            page_size,
            include_parent: true,
            fetch_all: true,
        }
    }

    /// JQL selecting the project's issues, newest first.
    pub fn jql(&self) -> String {
        format!(
            "project = \"{}\" ORDER BY created DESC",
            self.project_key.replace('"', "\\\"")
        )
    }

    /// Fields to request.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = BASE_FIELDS.to_vec();
        if self.include_parent {
            fields.push(PARENT_FIELD);
        }
        fields
    }
}

/// Issues returned by a query plus the server-reported total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuePage {
    pub issues: Vec<Issue>,
    pub total: u32,
}

/// Fetch the issues a query selects.
///
/// An empty project key yields an empty page without calling the server.
/// Page sizes above [`MAX_PAGE_SIZE`] are lowered to it. In fetch-all mode
/// the offset advances by the page size until a page comes back empty or the accumulated count reaches the reported total. Any
/// failed request aborts the whole fetch.
#[instrument(skip(search, query), fields(project = %query.project_key, fetch_all = query.fetch_all))]
pub async fn fetch_issues<S>(search: &S, query: &IssueQuery) -> Result<IssuePage>
where
    S: IssueSearch + ?Sized,
{
    if query.project_key.trim().is_empty() {
        warn!("Project key is required to fetch issues");
        return Ok(IssuePage::default());
    }
    if query.page_size == 0 {
        return Err(ApiError::InvalidRequest(
            "page size must be greater than zero".to_string(),
        ));
    }

    let page_size = query.page_size.min(MAX_PAGE_SIZE);
    let jql = query.jql();
    let fields = query.fields();

    if !query.fetch_all {
        let result = search
            .search_issues(&jql, query.start_at, page_size, &fields)
            .await?;
        return Ok(IssuePage {
            issues: result.issues,
            total: result.total,
        });
    }

    let mut issues = Vec::new();
    let mut offset = query.start_at;
    let mut total;
    let mut requests = 0u32;

    loop {
        let page = search
            .search_issues(&jql, offset, page_size, &fields)
            .await?;
        requests += 1;
        total = page.total;

        if page.issues.is_empty() {
            debug!(offset, "Empty page, stopping");
            break;
        }

        issues.extend(page.issues);
        if issues.len() as u64 >= u64::from(total) {
            break;
        }
        offset = offset.saturating_add(page_size);
    }

    info!(count = issues.len(), total, requests, "Fetched all issues");
    Ok(IssuePage { issues, total })
}
