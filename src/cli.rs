//! Command-line interface.
//!
//! Handlers are generic over the JIRA connection and return the text to
//! print, so they run against in-memory fakes in tests.

use std::io::{BufRead, Write};

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, instrument, warn};

use crate::api::auth;
use crate::api::types::{AssigneeChoice, IssueUpdate, Project, PropertyScope};
use crate::api::{ApiError, IssueTracker, PropertyStore, MAX_PAGE_SIZE};
use crate::config::{Config, Profile, Settings};
use crate::error::{AppError, Result};
use crate::manager::{ManagerContext, ViewMode};
use crate::render;
use crate::toggle::{current_project, SettingsToggle};
use crate::users::{fetch_all_users, sort_users, SortOrder, UserSortKey};

#[derive(Parser, Debug)]
#[command(
    name = "jira-panel",
    version,
    about = "Manage JIRA project issues and the per-project disable flag"
)]
pub struct Cli {
    /// Profile to use instead of the default one.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the projects you can browse.
    Projects,
    /// Show a project's issues.
    Issues(IssuesArgs),
    /// Update, delete or inspect a single issue.
    #[command(subcommand)]
    Issue(IssueCommand),
    /// List the work types of a project.
    WorkTypes(ProjectArg),
    /// List users who can be assigned issues in a project.
    Assignable(ProjectArg),
    /// List every user on the site.
    Users(UsersArgs),
    /// Show or change whether the app is disabled.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Manage site profiles.
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args, Debug, Default)]
pub struct ProjectArg {
    /// Project key; defaults to the first project.
    #[arg(long)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct IssuesArgs {
    #[command(flatten)]
    pub project: ProjectArg,

    /// Nest issues under their parents (fetches every page).
    #[arg(long, conflicts_with_all = ["all", "page"])]
    pub tree: bool,

    /// Show every issue on a single page.
    #[arg(long, conflicts_with = "page")]
    pub all: bool,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Issues per page; defaults to the configured page size.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_PAGE_SIZE as i64))]
    pub page_size: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum IssueCommand {
    /// Change an issue's summary, work type, status or assignee.
    Update(UpdateArgs),
    /// Delete an issue.
    Delete(DeleteArgs),
    /// List the transitions available for an issue.
    Transitions {
        /// Issue ID or key.
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue ID or key.
    pub id: String,

    #[arg(long)]
    pub summary: Option<String>,

    /// Work type name.
    #[arg(long = "type")]
    pub issue_type: Option<String>,

    /// Transition ID or name.
    #[arg(long)]
    pub transition: Option<String>,

    /// Account ID, or "unassigned".
    #[arg(long)]
    pub assignee: Option<String>,

    #[command(flatten)]
    pub project: ProjectArg,
}

impl UpdateArgs {
    fn to_update(&self) -> IssueUpdate {
        IssueUpdate {
            summary: self.summary.clone(),
            issue_type: self.issue_type.clone(),
            assignee: self
                .assignee
                .as_deref()
                .map(|a| a.parse().unwrap_or(AssigneeChoice::Unassigned)),
            transition_id: self.transition.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue ID or key.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub yes: bool,

    #[command(flatten)]
    pub project: ProjectArg,
}

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[arg(long, value_enum, default_value_t = UserSortKey::DisplayName)]
    pub sort: UserSortKey,

    /// Sort in descending order.
    #[arg(long)]
    pub desc: bool,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show whether the app is disabled.
    Show(ScopeArgs),
    /// Enable the app.
    Enable(ScopeArgs),
    /// Disable the app.
    Disable(ScopeArgs),
}

#[derive(Args, Debug, Default)]
pub struct ScopeArgs {
    /// Project key or ID; defaults to the current project.
    #[arg(long, conflicts_with = "global")]
    pub project: Option<String>,

    /// Use the app-wide flag (requires `app_id` in the config).
    #[arg(long)]
    pub global: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Add a site profile and store its API token.
    Add {
        name: String,
        /// Site URL, or just the site name for `<name>.atlassian.net`.
        #[arg(long)]
        url: String,
        #[arg(long)]
        email: String,
        /// API token; falls back to JIRA_API_TOKEN.
        #[arg(long)]
        token: Option<String>,
    },
    /// List configured profiles.
    List,
    /// Remove a profile and its stored token.
    Remove { name: String },
}

/// The JIRA operations commands need.
pub trait Jira: IssueTracker + PropertyStore {}

impl<T: IssueTracker + PropertyStore + ?Sized> Jira for T {}

/// Run a command that talks to JIRA.
pub async fn run<J: Jira + ?Sized>(jira: &J, settings: &Settings, command: Command) -> Result<String> {
    match command {
        Command::Projects => Ok(render::projects(&jira.list_projects().await?)),
        Command::Issues(args) => show_issues(jira, settings, &args).await,
        Command::Issue(IssueCommand::Update(args)) => update_issue(jira, settings, &args).await,
        Command::Issue(IssueCommand::Delete(args)) => {
            let stdin = std::io::stdin();
            delete_issue(jira, settings, &args, &mut stdin.lock()).await
        }
        Command::Issue(IssueCommand::Transitions { id }) => {
            Ok(render::transitions(&jira.get_transitions(&id).await?))
        }
        Command::WorkTypes(args) => {
            let project = find_project(jira, args.project.as_deref()).await?;
            Ok(render::work_types(&jira.get_project_issue_types(&project.id).await?))
        }
        Command::Assignable(args) => {
            let project = find_project(jira, args.project.as_deref()).await?;
            Ok(render::assignable_users(&jira.get_assignable_users(&project.key).await?))
        }
        Command::Users(args) => {
            let mut users = fetch_all_users(jira, MAX_PAGE_SIZE).await?;
            let order = if args.desc {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            sort_users(&mut users, args.sort, order);
            Ok(render::users(&users))
        }
        Command::Settings(command) => run_settings(jira, settings, command).await,
        Command::Profile(_) => Err(AppError::other("profile commands do not use a connection")),
    }
}

/// The named project, or the first one when no key is given.
async fn find_project<J: Jira + ?Sized>(jira: &J, key: Option<&str>) -> Result<Project> {
    let projects = jira.list_projects().await?;
    let found = match key {
        Some(key) => projects
            .into_iter()
            .find(|p| p.key.eq_ignore_ascii_case(key) || p.id == key),
        None => projects.into_iter().next(),
    };
    found.ok_or_else(|| match key {
        Some(key) => ApiError::NotFound(format!("Project '{}'", key)).into(),
        None => AppError::other("No projects available."),
    })
}

#[instrument(skip(jira, settings))]
async fn show_issues<J: Jira + ?Sized>(jira: &J, settings: &Settings, args: &IssuesArgs) -> Result<String> {
    let page_size = args.page_size.unwrap_or(settings.page_size);
    let mut ctx = ManagerContext::new(jira, page_size, settings.tree_page_size);
    if args.tree {
        ctx.set_mode(ViewMode::Tree);
    }
    ctx.set_all_pages(args.all);
    ctx.set_page(args.page);

    match ctx.open(args.project.project.as_deref()).await? {
        Some(view) => Ok(render::issues(view)),
        None => Ok("No projects available.\n".to_string()),
    }
}

async fn update_issue<J: Jira + ?Sized>(jira: &J, settings: &Settings, args: &UpdateArgs) -> Result<String> {
    let mut ctx = ManagerContext::new(jira, settings.page_size, settings.tree_page_size);
    let project = open_project(&mut ctx, args.project.project.as_deref()).await?;
    let view = ctx.update_issue(&args.id, args.to_update()).await?;
    Ok(format!("Updated {} in {}.\n\n{}", args.id, project, render::issues(view)))
}

async fn delete_issue<J: Jira + ?Sized>(
    jira: &J,
    settings: &Settings,
    args: &DeleteArgs,
    input: &mut dyn BufRead,
) -> Result<String> {
    if !args.yes && !confirm(&format!("Delete issue {}? [y/N] ", args.id), input)? {
        return Ok("Cancelled.\n".to_string());
    }

    let mut ctx = ManagerContext::new(jira, settings.page_size, settings.tree_page_size);
    let project = open_project(&mut ctx, args.project.project.as_deref()).await?;
    let view = ctx.delete_issue(&args.id).await?;
    Ok(format!("Deleted {} from {}.\n\n{}", args.id, project, render::issues(view)))
}

/// Open the manager on a project and return the project's display name.
async fn open_project<J: Jira + ?Sized>(
    ctx: &mut ManagerContext<'_, J>,
    key: Option<&str>,
) -> Result<String> {
    if ctx.open(key).await?.is_none() {
        return Err(AppError::other("No projects available."));
    }
    ctx.selected_project()
        .map(ToString::to_string)
        .ok_or_else(|| AppError::other("No projects available."))
}

/// Ask a yes/no question on stderr; anything but "y" or "yes" is no.
fn confirm(prompt: &str, input: &mut dyn BufRead) -> Result<bool> {
    let mut stderr = std::io::stderr();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Resolve which entity the disable flag lives on.
async fn resolve_scope<J: Jira + ?Sized>(
    jira: &J,
    settings: &Settings,
    args: &ScopeArgs,
) -> Result<PropertyScope> {
    if args.global {
        return settings
            .app_id
            .clone()
            .map(PropertyScope::Addon)
            .ok_or_else(|| AppError::other("--global needs `app_id` in the [settings] table."));
    }
    match &args.project {
        Some(project) => Ok(PropertyScope::Project(project.clone())),
        None => Ok(PropertyScope::Project(current_project(jira).await?.id)),
    }
}

async fn run_settings<J: Jira + ?Sized>(
    jira: &J,
    settings: &Settings,
    command: SettingsCommand,
) -> Result<String> {
    let (args, target) = match &command {
        SettingsCommand::Show(args) => (args, None),
        SettingsCommand::Enable(args) => (args, Some(false)),
        SettingsCommand::Disable(args) => (args, Some(true)),
    };

    let scope = resolve_scope(jira, settings, args).await?;
    let mut toggle = SettingsToggle::new(jira, scope);
    toggle.load().await;

    // Always write: a failed read loads as enabled.
    if let Some(disabled) = target {
        toggle.set_disabled(disabled);
        debug!(changed = toggle.is_dirty(), "Saving disable flag");
        toggle.save().await?;
        info!("Flag set to {} for {}", toggle.state().label(), toggle.scope());
    }
    Ok(render::toggle_status(&toggle))
}

/// Run a `profile` subcommand against the loaded config and save it.
pub fn run_profile(config: &mut Config, command: ProfileCommand) -> Result<String> {
    match command {
        ProfileCommand::Add {
            name,
            url,
            email,
            token,
        } => {
            let profile = Profile::new(name, url, email);
            config.add_profile(profile.clone())?;
            let token = token.or_else(|| {
                std::env::var(auth::TOKEN_ENV_VAR)
                    .ok()
                    .filter(|t| !t.trim().is_empty())
            });
            if let Some(token) = token {
                auth::store_token(&profile.name, &token)?;
            }
            config.save()?;
            Ok(format!("Added profile '{}' for {}.\n", profile.name, profile.url))
        }
        ProfileCommand::List => Ok(render_profiles(config)),
        ProfileCommand::Remove { name } => {
            let profile = config.remove_profile(&name)?;
            if let Err(e) = auth::delete_token(&profile.name) {
                warn!("Could not delete stored token: {}", e);
            }
            config.save()?;
            Ok(format!("Removed profile '{}'.\n", profile.name))
        }
    }
}

fn render_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "No profiles configured.\n".to_string();
    }
    let default = config.get_default_profile().map(|p| p.name.as_str());
    config
        .profiles
        .iter()
        .map(|p| {
            let marker = if Some(p.name.as_str()) == default { "*" } else { " " };
            format!("{} {}  {}  {}\n", marker, p.name, p.url, p.email)
        })
        .collect()
}
