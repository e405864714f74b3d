//! Issue manager session.
//!
//! [`ManagerContext`] holds the state the issue table works from: the
//! project list, the selected project, the current page and the last
//! fetched view. Every mutation is one API write followed by a refetch.

use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, Result};
use crate::api::types::{
    AssigneeChoice, Issue, IssueType, IssueUpdate, Project, Transition, User,
};
use crate::api::{IssueTracker, MAX_PAGE_SIZE};
use crate::issues::{build_forest, fetch_issues, IssueNode, IssueQuery};

/// How issues are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// One page of issues at a time.
    #[default]
    Flat,
    /// Every issue, nested under its parent.
    Tree,
}

/// The issues currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueView {
    Flat {
        issues: Vec<Issue>,
        total: u32,
        /// 1-based page number.
        page: u32,
        page_count: u32,
    },
    Tree {
        roots: Vec<IssueNode>,
        total: u32,
    },
}

impl IssueView {
    /// Whether there is nothing to show.
    pub fn is_empty(&self) -> bool {
        match self {
            IssueView::Flat { issues, .. } => issues.is_empty(),
            IssueView::Tree { roots, .. } => roots.is_empty(),
        }
    }
}

/// Choices offered when updating an issue.
///
/// A list that failed to load is `None`; values for that field are then
/// sent unchecked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    pub transitions: Option<Vec<Transition>>,
    pub work_types: Option<Vec<IssueType>>,
    pub assignable_users: Option<Vec<User>>,
}

impl UpdateOptions {
    /// Check an update against the offered choices.
    ///
    /// A transition may be given by ID or by name; names are replaced by the
    /// matching ID.
    pub fn validate(&self, mut update: IssueUpdate) -> Result<IssueUpdate> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("no changes to apply".to_string()));
        }

        if let Some(summary) = &update.summary {
            if summary.trim().is_empty() {
                return Err(ApiError::InvalidRequest("summary cannot be empty".to_string()));
            }
        }

        if let (Some(wanted), Some(transitions)) = (&update.transition_id, &self.transitions) {
            let found = transitions
                .iter()
                .find(|t| t.id == *wanted)
                .or_else(|| transitions.iter().find(|t| t.name.eq_ignore_ascii_case(wanted)))
                .ok_or_else(|| {
                    ApiError::InvalidRequest(format!(
                        "transition '{}' is not available (choose from: {})",
                        wanted,
                        transitions
                            .iter()
                            .map(|t| t.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?;
            update.transition_id = Some(found.id.clone());
        }

        if let (Some(wanted), Some(types)) = (&update.issue_type, &self.work_types) {
            let found = types
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(wanted))
                .ok_or_else(|| {
                    ApiError::InvalidRequest(format!(
                        "work type '{}' does not exist in this project",
                        wanted
                    ))
                })?;
            update.issue_type = Some(found.name.clone());
        }

        if let (Some(AssigneeChoice::Account(account_id)), Some(users)) =
            (&update.assignee, &self.assignable_users)
        {
            if !users.iter().any(|u| u.account_id == *account_id) {
                return Err(ApiError::InvalidRequest(format!(
                    "user '{}' cannot be assigned issues in this project",
                    account_id
                )));
            }
        }

        Ok(update)
    }
}

/// State of one issue manager session.
pub struct ManagerContext<'a, T: IssueTracker + ?Sized> {
    tracker: &'a T,
    projects: Vec<Project>,
    selected: Option<Project>,
    current_page: u32,
    page_size: u32,
    tree_page_size: u32,
    mode: ViewMode,
    /// Flat mode shows every issue on one page.
    all_pages: bool,
    view: Option<IssueView>,
}

impl<'a, T: IssueTracker + ?Sized> ManagerContext<'a, T> {
    pub fn new(tracker: &'a T, page_size: u32, tree_page_size: u32) -> Self {
        Self {
            tracker,
            projects: Vec::new(),
            selected: None,
            current_page: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            tree_page_size: tree_page_size.clamp(1, MAX_PAGE_SIZE),
            mode: ViewMode::Flat,
            all_pages: false,
            view: None,
        }
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected.as_ref()
    }

    #[cfg(test)]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Fetch every page into a single flat view instead of one page.
    pub fn set_all_pages(&mut self, all_pages: bool) {
        self.all_pages = all_pages;
    }

    /// Set the 1-based page used by the flat view.
    pub fn set_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    /// Load the project list. The first project is selected if none is.
    #[instrument(skip(self))]
    pub async fn load_projects(&mut self) -> Result<&[Project]> {
        self.projects = self.tracker.list_projects().await?;
        if self.selected.is_none() {
            self.selected = self.projects.first().cloned();
            if let Some(project) = &self.selected {
                debug!(project = %project.key, "Selected first project");
            }
        }
        Ok(&self.projects)
    }

    /// Load projects, select `preferred` (or the first one) and fetch its
    /// issues at the page set with [`set_page`](Self::set_page).
    pub async fn open(&mut self, preferred: Option<&str>) -> Result<Option<&IssueView>> {
        self.load_projects().await?;
        if let Some(key) = preferred {
            let page = self.current_page;
            self.select(key)?;
            self.current_page = page;
        }
        if self.selected.is_none() {
            info!("No projects available");
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    /// Select a project by key or ID and fetch its first page.
    pub async fn select_project(&mut self, key: &str) -> Result<&IssueView> {
        self.select(key)?;
        self.refresh().await
    }

    fn select(&mut self, key: &str) -> Result<()> {
        let project = self
            .projects
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key) || p.id == key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Project '{}' not found", key)))?;
        self.selected = Some(project);
        self.current_page = 1;
        Ok(())
    }

    /// Refetch the selected project's issues for the current mode and page.
    #[instrument(skip(self), fields(mode = ?self.mode, page = self.current_page))]
    pub async fn refresh(&mut self) -> Result<&IssueView> {
        let project = self
            .selected
            .as_ref()
            .ok_or_else(|| ApiError::InvalidRequest("no project selected".to_string()))?;

        let view = match self.mode {
            ViewMode::Flat if self.all_pages => {
                let query = IssueQuery {
                    fetch_all: true,
                    ..IssueQuery::page(project.key.clone(), 0, self.page_size)
                };
                let page = fetch_issues(self.tracker, &query).await?;
                IssueView::Flat {
                    issues: page.issues,
                    total: page.total,
                    page: 1,
                    page_count: 1,
                }
            }
            ViewMode::Flat => {
                let start_at = (self.current_page - 1).saturating_mul(self.page_size);
                let query = IssueQuery::page(project.key.clone(), start_at, self.page_size);
                let page = fetch_issues(self.tracker, &query).await?;
                IssueView::Flat {
                    page_count: page_count(page.total, self.page_size),
                    issues: page.issues,
                    total: page.total,
                    page: self.current_page,
                }
            }
            ViewMode::Tree => {
                let query = IssueQuery::all_with_parents(project.key.clone(), self.tree_page_size);
                let page = fetch_issues(self.tracker, &query).await?;
                let roots = build_forest(page.issues);
                debug!(roots = roots.len(), "Built issue tree");
                IssueView::Tree {
                    roots,
                    total: page.total,
                }
            }
        };

        Ok(self.view.insert(view))
    }

    /// Load the choices for an issue's update form.
    ///
    /// Each list is loaded independently; a failure only empties that list.
    pub async fn update_options(&self, issue_id: &str) -> UpdateOptions {
        let transitions = self
            .tracker
            .get_transitions(issue_id)
            .await
            .map_err(|e| warn!("Failed to load transitions: {}", e))
            .ok();

        let (work_types, assignable_users) = match &self.selected {
            Some(project) => (
                self.tracker
                    .get_project_issue_types(&project.id)
                    .await
                    .map_err(|e| warn!("Failed to load work types: {}", e))
                    .ok(),
                self.tracker
                    .get_assignable_users(&project.key)
                    .await
                    .map_err(|e| warn!("Failed to load assignable users: {}", e))
                    .ok(),
            ),
            None => (None, None),
        };

        UpdateOptions {
            transitions,
            work_types,
            assignable_users,
        }
    }

    /// Validate and apply an update, then refetch.
    #[instrument(skip(self, update))]
    pub async fn update_issue(&mut self, issue_id: &str, update: IssueUpdate) -> Result<&IssueView> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("no changes to apply".to_string()));
        }
        let options = self.update_options(issue_id).await;
        let update = options.validate(update)?;
        self.tracker.update_issue(issue_id, &update).await?;
        info!("Issue {} updated", issue_id);
        self.refresh().await
    }

    /// Delete an issue, then refetch.
    #[instrument(skip(self))]
    pub async fn delete_issue(&mut self, issue_id: &str) -> Result<&IssueView> {
        self.tracker.delete_issue(issue_id).await?;
        info!("Issue {} deleted", issue_id);
        self.refresh().await
    }
}

/// Number of pages needed for `total` items, at least one.
pub fn page_count(total: u32, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    (total / page_size + u32::from(total % page_size != 0)).max(1)
}
