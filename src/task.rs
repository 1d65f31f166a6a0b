//! Task data structure and related functionality.
//!
//! This module defines the persisted `Task` record along with the field sets
//! used to create (`NewTask`) and edit (`TaskPatch`) one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::fields::{Priority, DEFAULT_CATEGORY};

/// A single to-do item.
///
/// Field names on disk are camelCase (`dueDate`, `completedAt`, `createdAt`).
/// `completed_at` is `Some` exactly when `completed` is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// `dueDate` as stored: a `YYYY-MM-DD` string or null. Anything else reads
/// as "no due date" so one bad value does not sink the whole record.
fn lenient_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
        Some(serde_json::Value::String(s)) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(value = %s, error = %e, "ignoring unparseable due date");
                None
            }
        },
        Some(other) => {
            warn!(value = %other, "ignoring non-string due date");
            None
        }
    })
}

impl Task {
    /// Build a fresh task with a new id and creation timestamp.
    pub fn create(fields: NewTask, now: DateTime<Utc>) -> Self {
        let category = fields
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_category);
        Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: fields.title,
            description: fields.description.unwrap_or_default(),
            priority: fields.priority.unwrap_or_default(),
            category,
            due_date: fields.due_date,
            completed: false,
            completed_at: None,
            created_at: now,
            tags: fields.tags,
        }
    }

    /// First eight characters of the id, used in listings.
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    /// Set the completion flag, keeping `completed_at` in step with it.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed == self.completed {
            return;
        }
        self.completed = completed;
        self.completed_at = completed.then_some(now);
    }

    /// Shallow merge: every supplied field replaces the stored one.
    pub fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            self.set_completed(completed, now);
        }
    }
}

/// Fields accepted when adding a task. Omitted fields take their defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Fields accepted by an update. `None` leaves the stored value untouched;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let task = Task::create(NewTask::titled("Water plants"), now());
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, "General");
        assert_eq!(task.description, "");
        assert!(task.due_date.is_none());
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(task.tags.is_empty());
        assert_eq!(task.created_at, now());
        assert_eq!(task.short_id().len(), 8);
    }

    #[test]
    fn blank_category_falls_back_to_default() {
        let fields = NewTask {
            category: Some("   ".into()),
            ..NewTask::titled("x")
        };
        assert_eq!(Task::create(fields, now()).category, "General");
    }

    #[test]
    fn serialises_with_camel_case_fields() {
        let fields = NewTask {
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..NewTask::titled("Pay rent")
        };
        let task = Task::create(fields, now());
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["dueDate"], "2024-03-01");
        assert_eq!(value["completedAt"], serde_json::Value::Null);
        assert!(value["createdAt"].is_string());
        assert_eq!(value["priority"], "medium");
    }

    #[test]
    fn set_completed_tracks_timestamp() {
        let mut task = Task::create(NewTask::titled("x"), now());
        task.set_completed(true, now());
        assert_eq!(task.completed_at, Some(now()));
        task.set_completed(false, now());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn apply_replaces_only_supplied_fields() {
        let mut task = Task::create(NewTask::titled("Old"), now());
        task.description = "keep me".into();
        task.apply(
            TaskPatch {
                title: Some("New".into()),
                priority: Some(Priority::High),
                due_date: Some(NaiveDate::from_ymd_opt(2024, 5, 5)),
                ..Default::default()
            },
            now(),
        );
        assert_eq!(task.title, "New");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.description, "keep me");
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 5, 5));

        task.apply(
            TaskPatch {
                due_date: Some(None),
                ..Default::default()
            },
            now(),
        );
        assert!(task.due_date.is_none());
    }

    #[test]
    fn bad_due_dates_read_as_none() {
        let record = |due: &str| {
            format!(
                r#"{{"id":"a1","title":"Keep me","createdAt":"2024-02-01T09:30:00Z","dueDate":{due}}}"#
            )
        };
        for due in [r#""""#, r#""next tuesday""#, r#""03/01/2024""#, "42", "null"] {
            let task: Task = serde_json::from_str(&record(due)).unwrap();
            assert_eq!(task.title, "Keep me");
            assert!(task.due_date.is_none(), "dueDate {due} should read as none");
        }
        let task: Task = serde_json::from_str(&record(r#""2024-03-01""#)).unwrap();
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let missing: Task =
            serde_json::from_str(r#"{"id":"a1","title":"t","createdAt":"2024-02-01T09:30:00Z"}"#).unwrap();
        assert!(missing.due_date.is_none());
    }

    proptest! {
        #[test]
        fn toggling_twice_is_identity(start_done in any::<bool>(), minutes in 0i64..10_000) {
            let mut task = Task::create(NewTask::titled("x"), now());
            task.set_completed(start_done, now());
            let before = task.clone();
            let later = now() + chrono::Duration::minutes(minutes);
            let flipped = !task.completed;
            task.set_completed(flipped, later);
            prop_assert_eq!(task.completed_at.is_some(), task.completed);
            let back = !task.completed;
            task.set_completed(back, later);
            prop_assert_eq!(task.completed, before.completed);
            prop_assert_eq!(task.completed_at.is_some(), before.completed);
            prop_assert_eq!(task.title, before.title);
            prop_assert_eq!(task.created_at, before.created_at);
        }

        #[test]
        fn created_ids_are_unique(count in 1usize..64) {
            let ids: std::collections::HashSet<String> = (0..count)
                .map(|_| Task::create(NewTask::titled("t"), now()).id)
                .collect();
            prop_assert_eq!(ids.len(), count);
        }
    }
}
