//! Issue retrieval and hierarchy building.

mod fetch;
mod tree;

pub use fetch::{fetch_issues, IssuePage, IssueQuery};
pub use tree::{build_forest, flatten, node_count, IssueNode};
