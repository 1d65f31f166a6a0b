//! Enumerations and field types for tasks.
//!
//! This module defines the closed value sets used to classify and query tasks:
//! priority levels, sort keys and completion-status filters, together with the
//! suggested category names offered when a task is created.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Category given to tasks created without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Suggested categories offered by the interactive menu.
pub const CATEGORIES: [&str; 7] = [
    "General", "Work", "Personal", "Shopping", "Health", "Finance", "Learning",
];

/// Task importance, most urgent first.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All levels in ascending rank (urgent first).
    pub const ALL: [Priority; 4] = [Priority::Urgent, Priority::High, Priority::Medium, Priority::Low];

    /// Sort rank: 0 for urgent through 3 for low.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    /// Lowercase name as stored on disk.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Capitalised name for menus and listings.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    /// Urgent first.
    Priority,
    /// Earliest due date first, undated last.
    Due,
    /// Oldest creation time first.
    Date,
    /// Alphabetical by title.
    Title,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [SortKey::Priority, SortKey::Due, SortKey::Date, SortKey::Title];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Priority => "Priority",
            SortKey::Due => "Due date",
            SortKey::Date => "Created date",
            SortKey::Title => "Title",
        }
    }
}

/// Completion-status filter.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    Pending,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, completed: bool) -> bool {
        match self {
            StatusFilter::Pending => !completed,
            StatusFilter::Completed => completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rank_follows_declaration_order() {
        let ranks: Vec<u8> = Priority::ALL.iter().map(|p| p.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
        assert!(Priority::Urgent < Priority::Low);
    }

    #[test]
    fn priority_serialises_lowercase() {
        let json = serde_json::to_string(&Priority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
        let back: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(back, Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn status_filter_matches_completion_flag() {
        assert!(StatusFilter::Pending.matches(false));
        assert!(!StatusFilter::Pending.matches(true));
        assert!(StatusFilter::Completed.matches(true));
    }
}
