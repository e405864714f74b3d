//! JIRA API client and types.
//!
//! This module provides the interface for communicating with the JIRA REST API.

pub mod auth;
mod client;
pub mod error;
mod service;
pub mod types;

pub use client::{JiraClient, MAX_PAGE_SIZE};
pub use error::ApiError;
pub use service::{IssueSearch, IssueTracker, PropertyStore};
