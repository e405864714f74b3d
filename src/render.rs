//! Plain-text rendering of command results.
//!
//! Every function returns the finished text; printing is left to `main`.

use std::fmt::Write;

use crate::api::types::{Issue, IssueType, Project, Transition, User};
use crate::api::PropertyStore;
use crate::issues::flatten;
use crate::manager::IssueView;
use crate::toggle::SettingsToggle;

/// Widest summary column before truncation.
const SUMMARY_WIDTH: usize = 50;

/// Shown instead of an empty issue table.
pub const NO_ISSUES: &str = "No issues found for this project.";

/// Shorten `s` to at most `max_len` characters, ending in "..." when cut.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Lay out rows as left-aligned columns separated by two spaces.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &widths, headers.iter().copied());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &widths, rule.iter().map(String::as_str));
    for row in rows {
        push_line(&mut out, &widths, row.iter().map(String::as_str));
    }
    out
}

fn push_line<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let mut text = String::new();
    for (i, (cell, width)) in cells.zip(widths).enumerate() {
        if i > 0 {
            text.push_str("  ");
        }
        let pad = width.saturating_sub(cell.chars().count());
        text.push_str(cell);
        text.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(text.trim_end());
    out.push('\n');
}

fn issue_row(issue: &Issue, indent: usize) -> Vec<String> {
    let prefix = if indent == 0 {
        String::new()
    } else {
        format!("{}└ ", "  ".repeat(indent - 1))
    };
    vec![
        issue.issue_type().to_string(),
        format!("{}{}", prefix, issue.key),
        truncate(issue.summary(), SUMMARY_WIDTH),
        issue.status().to_string(),
        issue.assignee_name().to_string(),
    ]
}

const ISSUE_HEADERS: [&str; 5] = ["Type", "Key", "Summary", "Status", "Assignee"];

/// Render the issue table for a flat page or a tree.
pub fn issues(view: &IssueView) -> String {
    if view.is_empty() {
        return format!("{}\n", NO_ISSUES);
    }

    match view {
        IssueView::Flat {
            issues,
            total,
            page,
            page_count,
        } => {
            let rows: Vec<Vec<String>> = issues.iter().map(|i| issue_row(i, 0)).collect();
            let mut out = table(&ISSUE_HEADERS, &rows);
            let _ = writeln!(out, "\nPage {} of {} ({} issues)", page, page_count, total);
            out
        }
        IssueView::Tree { roots, total } => {
            let rows: Vec<Vec<String>> = flatten(roots)
                .into_iter()
                .map(|(depth, issue)| issue_row(issue, depth))
                .collect();
            let mut out = table(&ISSUE_HEADERS, &rows);
            let _ = writeln!(out, "\n{} issues", total);
            out
        }
    }
}

pub fn projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects available.\n".to_string();
    }
    let rows: Vec<Vec<String>> = projects
        .iter()
        .map(|p| vec![p.key.clone(), p.name.clone(), p.id.clone()])
        .collect();
    table(&["Key", "Name", "ID"], &rows)
}

/// Render the user directory with an Active/Inactive column.
pub fn users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.account_id.clone(),
                u.display_name.clone(),
                u.email_address.clone().unwrap_or_default(),
                if u.active { "Active" } else { "Inactive" }.to_string(),
            ]
        })
        .collect();
    table(&["Account ID", "Name", "Email", "Status"], &rows)
}

pub fn assignable_users(users: &[User]) -> String {
    let mut rows = vec![vec!["unassigned".to_string(), "Unassigned".to_string()]];
    rows.extend(
        users
            .iter()
            .map(|u| vec![u.account_id.clone(), u.display_name.clone()]),
    );
    table(&["Account ID", "Name"], &rows)
}

pub fn transitions(transitions: &[Transition]) -> String {
    if transitions.is_empty() {
        return "No transitions available.\n".to_string();
    }
    let rows: Vec<Vec<String>> = transitions
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.name.clone(),
                t.to.as_ref().map(|s| s.name.clone()).unwrap_or_default(),
            ]
        })
        .collect();
    table(&["ID", "Name", "To Status"], &rows)
}

pub fn work_types(types: &[IssueType]) -> String {
    if types.is_empty() {
        return "No work types found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = types
        .iter()
        .map(|t| {
            vec![
                t.name.clone(),
                if t.subtask { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    table(&["Name", "Subtask"], &rows)
}

/// One line describing the toggle, plus the last error if any.
pub fn toggle_status<P: PropertyStore + ?Sized>(toggle: &SettingsToggle<'_, P>) -> String {
    let mut out = format!("App is {} for {}\n", toggle.state().label(), toggle.scope());
    if let Some(error) = toggle.error() {
        let _ = writeln!(out, "{}", error);
    }
    out
}
