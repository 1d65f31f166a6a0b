//! Pure query functions over task lists: filtering, searching, sorting and
//! aggregate statistics. Nothing in here touches the filesystem.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::fields::{Priority, SortKey, StatusFilter};
use crate::task::Task;

/// Recognised filter options. Every supplied option must match; `None`
/// imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub status: Option<StatusFilter>,
    pub priority: Option<Priority>,
    /// Compared case-insensitively against the whole category.
    pub category: Option<String>,
}

impl FilterCriteria {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if !status.matches(task.completed) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if task.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive substring match on title, description, category or any tag.
pub fn matches_query(task: &Task, query: &str) -> bool {
    let needle = query.to_lowercase();
    task.title.to_lowercase().contains(&needle)
        || task.description.to_lowercase().contains(&needle)
        || task.category.to_lowercase().contains(&needle)
        || task.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Stable sort over a copy of `tasks`.
///
/// With `reverse` the comparison is inverted, except that undated tasks stay
/// after dated ones when sorting by due date.
pub fn sort_tasks(tasks: &[Task], key: SortKey, reverse: bool) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| compare(a, b, key, reverse));
    sorted
}

fn compare(a: &Task, b: &Task, key: SortKey, reverse: bool) -> Ordering {
    let directed = |ord: Ordering| if reverse { ord.reverse() } else { ord };
    match key {
        SortKey::Priority => directed(a.priority.rank().cmp(&b.priority.rank())),
        SortKey::Due => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Date => directed(a.created_at.cmp(&b.created_at)),
        SortKey::Title => directed(compare_titles(&a.title, &b.title)),
    }
}

/// Dictionary-style title order. Accents and case are ignored first, so
/// "éclair" sorts between "apple" and "zebra"; accented and cased forms then
/// break ties, and the raw string last.
fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Lower-cased canonical decomposition with combining marks removed.
fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Aggregate counts over a task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Percentage of completed tasks, rounded; 0 for an empty list.
    pub completion_rate: u32,
    /// Always holds an entry for every priority level.
    pub by_priority: BTreeMap<Priority, usize>,
    pub categories: BTreeMap<String, usize>,
}

impl Stats {
    pub fn collect(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.completed).count();
        let completion_rate = if total == 0 {
            0
        } else {
            (completed as f64 * 100.0 / total as f64).round() as u32
        };

        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        for t in tasks {
            *by_priority.entry(t.priority).or_default() += 1;
            *categories.entry(t.category.clone()).or_default() += 1;
        }

        Stats {
            total,
            completed,
            pending: total - completed,
            completion_rate,
            by_priority,
            categories,
        }
    }
}
