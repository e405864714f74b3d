//! User directory listing.

use std::cmp::Ordering;

use clap::ValueEnum;
use tracing::{debug, instrument};

use crate::api::error::{ApiError, Result};
use crate::api::types::User;
use crate::api::IssueTracker;

/// Column to sort the directory by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UserSortKey {
    AccountId,
    #[default]
    DisplayName,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Fetch every user, one page at a time, until a page comes back empty.
#[instrument(skip(tracker))]
pub async fn fetch_all_users<T>(tracker: &T, page_size: u32) -> Result<Vec<User>>
where
    T: IssueTracker + ?Sized,
{
    if page_size == 0 {
        return Err(ApiError::InvalidRequest(
            "page size must be greater than zero".to_string(),
        ));
    }

    let mut users = Vec::new();
    let mut offset = 0u32;
    loop {
        let page = tracker.search_users(offset, page_size).await?;
        if page.is_empty() {
            break;
        }
        offset = offset.saturating_add(page.len() as u32);
        users.extend(page);
    }
    debug!(count = users.len(), "Fetched user directory");
    Ok(users)
}

fn sort_value(user: &User, key: UserSortKey) -> &str {
    match key {
        UserSortKey::AccountId => &user.account_id,
        UserSortKey::DisplayName => &user.display_name,
    }
}

/// Sort users case-insensitively. Users with an empty sort value keep their
/// relative position against everything else.
pub fn sort_users(users: &mut [User], key: UserSortKey, order: SortOrder) {
    users.sort_by(|a, b| {
        let (a, b) = (sort_value(a, key), sort_value(b, key));
        if a.is_empty() || b.is_empty() {
            return Ordering::Equal;
        }
        let ordering = a.to_lowercase().cmp(&b.to_lowercase());
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::types::{IssueType, IssueUpdate, Project, SearchResult, Transition};
    use crate::api::IssueSearch;

    fn user(account_id: &str, display_name: &str) -> User {
        User {
            account_id: account_id.to_string(),
            display_name: display_name.to_string(),
            email_address: None,
            active: true,
            avatar_urls: None,
        }
    }

    struct Directory {
        users: Vec<User>,
        requests: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl IssueSearch for Directory {
        async fn search_issues(&self, _: &str, _: u32, _: u32, _: &[&str]) -> Result<SearchResult> {
            unimplemented!("not used by the directory")
        }
    }

    #[async_trait]
    impl IssueTracker for Directory {
        async fn list_projects(&self) -> Result<Vec<Project>> {
            Ok(Vec::new())
        }
        async fn search_projects(&self) -> Result<Vec<Project>> {
            Ok(Vec::new())
        }
        async fn update_issue(&self, _: &str, _: &IssueUpdate) -> Result<()> {
            Ok(())
        }
        async fn delete_issue(&self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn get_transitions(&self, _: &str) -> Result<Vec<Transition>> {
            Ok(Vec::new())
        }
        async fn get_project_issue_types(&self, _: &str) -> Result<Vec<IssueType>> {
            Ok(Vec::new())
        }
        async fn get_assignable_users(&self, _: &str) -> Result<Vec<User>> {
            Ok(Vec::new())
        }
        async fn search_users(&self, start_at: u32, max_results: u32) -> Result<Vec<User>> {
            self.requests.lock().unwrap().push(start_at);
            Ok(self
                .users
                .iter()
                .skip(start_at as usize)
                .take(max_results as usize)
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_fetch_all_users_pages_until_empty() {
        let directory = Directory {
            users: (0..5).map(|i| user(&format!("acc-{}", i), "x")).collect(),
            requests: Mutex::new(Vec::new()),
        };
        let users = fetch_all_users(&directory, 2).await.unwrap();
        assert_eq!(users.len(), 5);
        assert_eq!(*directory.requests.lock().unwrap(), vec![0, 2, 4, 5]);
    }

    #[test]
    fn test_sort_by_display_name_case_insensitive() {
        let mut users = vec![user("3", "carol"), user("1", "Alice"), user("2", "bob")];
        sort_users(&mut users, UserSortKey::DisplayName, SortOrder::Ascending);
        let names: Vec<_> = users.iter().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "bob", "carol"]);
    }

    #[test]
    fn test_sort_by_account_id_descending() {
        let mut users = vec![user("a", "x"), user("c", "y"), user("b", "z")];
        sort_users(&mut users, UserSortKey::AccountId, SortOrder::Descending);
        let ids: Vec<_> = users.iter().map(|u| u.account_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_keeps_user_without_name_in_place() {
        let mut users = vec![user("1", ""), user("2", "Zed")];
        sort_users(&mut users, UserSortKey::DisplayName, SortOrder::Ascending);
        assert_eq!(users[0].account_id, "1");
    }
}
