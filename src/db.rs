//! Record store and input helpers for task management.
//!
//! This module provides `TaskStore`, which keeps no tasks in memory: every
//! operation reloads the whole list from disk, transforms it and writes the
//! whole list back. Before each write the previous file contents are copied to
//! a sibling backup file. It also provides the helpers the command surface and
//! the menu use to turn user input into task fields.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::query::{matches_query, FilterCriteria, Stats};
use crate::task::{NewTask, Task, TaskPatch};

/// Result of a scoped transform: whether the list must be written back.
pub enum Commit<R> {
    Write(R),
    Discard(R),
}

/// File-backed task collection. The file is the only source of truth.
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl TaskStore {
    /// Store backed by `path`, with its backup at `<path>.bak`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = backup_path_for(&path);
        TaskStore { path, backup_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Load every task. A missing or unreadable file loads as an empty list.
    pub fn load_all(&self) -> Vec<Task> {
        if !self.path.exists() {
            return Vec::new();
        }
        let buf = match fs::read_to_string(&self.path) {
            Ok(buf) => buf,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read task file, starting empty");
                return Vec::new();
            }
        };
        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&buf) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse task file, starting empty");
                return Vec::new();
            }
        };

        // One malformed record is dropped on its own; the rest still load.
        let tasks: Vec<Task> = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| match serde_json::from_value::<Task>(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!(path = %self.path.display(), index = i, error = %e, "skipping malformed task record");
                    None
                }
            })
            .collect();
        debug!(count = tasks.len(), path = %self.path.display(), "loaded tasks");
        tasks
    }

    /// Copy the current file to the backup path, then write `tasks` in its place.
    pub fn save_all(&self, tasks: &[Task]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io("create", parent, e))?;
        }
        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, &self.backup_path) {
                warn!(backup = %self.backup_path.display(), error = %e, "failed to refresh backup");
            }
        }

        // Atomic-ish write via temp + rename.
        let data = serde_json::to_string_pretty(tasks)?;
        let tmp = sibling_path(&self.path, ".tmp");
        let written = write_then_rename(&tmp, &self.path, data.as_bytes());
        if written.is_err() && tmp.exists() {
            if let Err(e) = fs::remove_file(&tmp) {
                warn!(tmp = %tmp.display(), error = %e, "failed to remove temp file");
            }
        }
        written?;
        debug!(count = tasks.len(), path = %self.path.display(), "saved tasks");
        Ok(())
    }

    /// Reload, hand the list to `f`, and write it back if `f` asks for it.
    pub fn with_tasks<R>(&self, f: impl FnOnce(&mut Vec<Task>) -> Commit<R>) -> Result<R, StoreError> {
        let mut tasks = self.load_all();
        match f(&mut tasks) {
            Commit::Write(out) => {
                self.save_all(&tasks)?;
                Ok(out)
            }
            Commit::Discard(out) => Ok(out),
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<Task> {
        self.load_all().into_iter().find(|t| t.id == id)
    }

    /// Append a new task. Rejects blank titles without touching the file.
    pub fn add(&self, fields: NewTask) -> Result<Task, StoreError> {
        if fields.title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        let task = Task::create(fields, Utc::now());
        let created = task.clone();
        self.with_tasks(move |tasks| {
            tasks.push(task);
            Commit::Write(())
        })?;
        info!(id = %created.id, title = %created.title, "added task");
        Ok(created)
    }

    /// Merge `patch` over the task with `id`. `None` when no such task exists.
    pub fn update(&self, id: &str, patch: TaskPatch) -> Result<Option<Task>, StoreError> {
        let now = Utc::now();
        let updated = self.with_tasks(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.apply(patch, now);
                Commit::Write(Some(task.clone()))
            }
            None => Commit::Discard(None),
        })?;
        if updated.is_some() {
            info!(id, "updated task");
        }
        Ok(updated)
    }

    /// Remove the task with `id`, reporting whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.with_tasks(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() < before {
                Commit::Write(true)
            } else {
                Commit::Discard(false)
            }
        })?;
        if removed {
            info!(id, "deleted task");
        }
        Ok(removed)
    }

    /// Flip the completion flag of the task with `id`.
    pub fn toggle_complete(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let now = Utc::now();
        self.with_tasks(|tasks| match tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                let flipped = !task.completed;
                task.set_completed(flipped, now);
                Commit::Write(Some(task.clone()))
            }
            None => Commit::Discard(None),
        })
    }

    /// Drop every completed task and return how many went.
    pub fn clear_completed(&self) -> Result<usize, StoreError> {
        let removed = self.with_tasks(|tasks| {
            let before = tasks.len();
            tasks.retain(|t| !t.completed);
            Commit::Write(before - tasks.len())
        })?;
        info!(removed, "cleared completed tasks");
        Ok(removed)
    }

    pub fn search(&self, query: &str) -> Vec<Task> {
        self.load_all()
            .into_iter()
            .filter(|t| matches_query(t, query))
            .collect()
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<Task> {
        self.load_all()
            .into_iter()
            .filter(|t| criteria.matches(t))
            .collect()
    }

    pub fn stats(&self) -> Stats {
        Stats::collect(&self.load_all())
    }
}

fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let mut f = fs::File::create(tmp).map_err(|e| StoreError::io("create", tmp, e))?;
    f.write_all(data)
        .and_then(|_| f.flush())
        .map_err(|e| StoreError::io("write", tmp, e))?;
    drop(f);
    fs::rename(tmp, path).map_err(|e| StoreError::io("replace", path, e))
}

/// `path` with `suffix` appended to its full file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tasks.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

/// Sibling backup path: `tasks.json` becomes `tasks.json.bak`.
pub fn backup_path_for(path: &Path) -> PathBuf {
    sibling_path(path, ".bak")
}

/// Split comma-separated tag input, trimming entries and dropping empties
/// and repeats while keeping first-seen order.
pub fn split_tags<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in inputs {
        for part in raw.as_ref().split(',') {
            let tag = part.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday" .. "sunday" (and three-letter forms), "next friday", "this friday"
/// - "end of week" / "eow", "end of month" / "eom", "weekend"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_relative_to(s, Local::now().date_naive())
}

/// `parse_due_input` against a fixed `today`.
pub fn parse_due_relative_to(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            // Coming Saturday
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (count, unit_days) = if let Some(n) = rest.strip_suffix('d') {
            (n, 1)
        } else if let Some(n) = rest.strip_suffix('w') {
            (n, 7)
        } else if let Some(n) = rest.strip_suffix('m') {
            // Approximate: 30 days per month
            (n, 30)
        } else {
            ("", 0)
        };
        if let Ok(n) = count.trim().parse::<i64>() {
            return Some(today + Duration::days(n * unit_days));
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Start and end dates of the ISO week (Monday to Sunday) containing `today`.
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Resolve a task identifier (full id, unique id prefix, or exact title) to a task id.
pub fn resolve_task_identifier(identifier: &str, tasks: &[Task]) -> Result<String, String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err("No task identifier given".to_string());
    }
    if let Some(t) = tasks.iter().find(|t| t.id == identifier) {
        return Ok(t.id.clone());
    }

    let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(identifier)).collect();
    if by_prefix.len() == 1 {
        return Ok(by_prefix[0].id.clone());
    }

    let by_title: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.title.to_lowercase() == identifier.to_lowercase())
        .collect();

    let candidates = if by_prefix.len() > 1 { by_prefix } else { by_title };
    match candidates.len() {
        0 => Err(format!("No task found matching '{identifier}'")),
        1 => Ok(candidates[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple tasks match '{identifier}':\n");
            for task in candidates {
                error_msg.push_str(&format!("  {}: {}\n", task.short_id(), task.title));
            }
            error_msg.push_str("Please use a longer id instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, StatusFilter};
    use std::collections::HashSet;

    fn store() -> (tempfile::TempDir, TaskStore) {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = TaskStore::new(dir.path().join("tasks.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let (_dir, store) = store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn malformed_record_does_not_drop_the_rest() {
        let (_dir, store) = store();
        let file = r#"[
            {"id":"k1","title":"keep me","createdAt":"2024-02-01T09:30:00Z","dueDate":"2024-03-01"},
            {"id":"k2","title":"blank due","createdAt":"2024-02-01T09:31:00Z","dueDate":""},
            {"id":"k3","createdAt":"2024-02-01T09:32:00Z"}
        ]"#;
        fs::write(store.path(), file).unwrap();

        let titles = |tasks: Vec<Task>| tasks.into_iter().map(|t| t.title).collect::<Vec<_>>();
        assert_eq!(titles(store.load_all()), vec!["keep me", "blank due"]);

        store.add(NewTask::titled("new one")).unwrap();
        store.add(NewTask::titled("another")).unwrap();
        assert_eq!(
            titles(store.load_all()),
            vec!["keep me", "blank due", "new one", "another"]
        );
        let backup = fs::read_to_string(store.backup_path()).unwrap();
        assert!(backup.contains("keep me"));
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let (dir, store) = store();
        fs::create_dir(store.path()).unwrap();
        assert!(store.add(NewTask::titled("doomed")).is_err());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
    }

    #[test]
    fn temp_names_follow_the_full_file_name() {
        assert_eq!(sibling_path(Path::new("/d/tasks.json"), ".tmp"), Path::new("/d/tasks.json.tmp"));
        assert_eq!(sibling_path(Path::new("/d/tasks.db"), ".tmp"), Path::new("/d/tasks.db.tmp"));
    }

    #[test]
    fn missing_ids_leave_the_file_untouched() {
        let (_dir, store) = store();
        store.add(NewTask::titled("only")).unwrap();
        let before = fs::read(store.path()).unwrap();
        let modified = fs::metadata(store.path()).unwrap().modified().unwrap();

        let patch = TaskPatch {
            title: Some("x".into()),
            ..Default::default()
        };
        assert!(store.update("nope", patch).unwrap().is_none());
        assert!(!store.delete("nope").unwrap());
        assert!(store.toggle_complete("nope").unwrap().is_none());

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(fs::metadata(store.path()).unwrap().modified().unwrap(), modified);
        assert!(!store.backup_path().exists());
    }

    #[test]
    fn save_copies_previous_contents_to_backup() {
        let (_dir, store) = store();
        store.add(NewTask::titled("first")).unwrap();
        assert!(!store.backup_path().exists());
        let first_snapshot = fs::read_to_string(store.path()).unwrap();

        store.add(NewTask::titled("second")).unwrap();
        let backup = fs::read_to_string(store.backup_path()).unwrap();
        assert_eq!(backup, first_snapshot);
        assert_eq!(store.load_all().len(), 2);
    }

    #[test]
    fn backup_path_sits_beside_primary() {
        let path = Path::new("/tmp/x/tasks.json");
        assert_eq!(backup_path_for(path), PathBuf::from("/tmp/x/tasks.json.bak"));
    }

    #[test]
    fn add_rejects_blank_title() {
        let (_dir, store) = store();
        let err = store.add(NewTask::titled("   ")).unwrap_err();
        assert!(matches!(err, StoreError::EmptyTitle));
        assert!(!store.path().exists());
    }

    #[test]
    fn add_then_search_is_case_insensitive() {
        let (_dir, store) = store();
        store.add(NewTask::titled("Buy milk")).unwrap();
        let rent = store
            .add(NewTask {
                priority: Some(Priority::Urgent),
                category: Some("Finance".into()),
                due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                ..NewTask::titled("Pay rent")
            })
            .unwrap();

        let hits = store.search("rent");
        assert_eq!(hits, vec![rent.clone()]);
        assert_eq!(store.search("RENT"), vec![rent]);
    }

    #[test]
    fn update_merges_and_reports_missing() {
        let (_dir, store) = store();
        let task = store.add(NewTask::titled("Draft")).unwrap();
        let patch = TaskPatch {
            description: Some("two pages".into()),
            ..Default::default()
        };
        let updated = store.update(&task.id, patch).unwrap().unwrap();
        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.description, "two pages");
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(store.get_by_id(&task.id), Some(updated));

        assert!(store.update("nope", TaskPatch::default()).unwrap().is_none());
    }

    #[test]
    fn toggle_twice_restores_original() {
        let (_dir, store) = store();
        let task = store.add(NewTask::titled("Stretch")).unwrap();
        let once = store.toggle_complete(&task.id).unwrap().unwrap();
        assert!(once.completed);
        assert!(once.completed_at.is_some());
        let twice = store.toggle_complete(&task.id).unwrap().unwrap();
        assert_eq!(twice.completed, task.completed);
        assert_eq!(twice.completed_at, task.completed_at);
        assert!(store.toggle_complete("missing").unwrap().is_none());
    }

    #[test]
    fn delete_reports_whether_removed() {
        let (_dir, store) = store();
        let task = store.add(NewTask::titled("Temp")).unwrap();
        assert!(store.delete(&task.id).unwrap());
        assert!(!store.delete(&task.id).unwrap());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn clear_completed_counts_exactly() {
        let (_dir, store) = store();
        let a = store.add(NewTask::titled("a")).unwrap();
        store.add(NewTask::titled("b")).unwrap();
        let c = store.add(NewTask::titled("c")).unwrap();
        store.toggle_complete(&a.id).unwrap();
        store.toggle_complete(&c.id).unwrap();

        assert_eq!(store.clear_completed().unwrap(), 2);
        assert_eq!(store.clear_completed().unwrap(), 0);
        let left: Vec<String> = store.load_all().into_iter().map(|t| t.title).collect();
        assert_eq!(left, vec!["b"]);
    }

    #[test]
    fn filter_and_stats_read_from_disk() {
        let (_dir, store) = store();
        let a = store
            .add(NewTask {
                priority: Some(Priority::High),
                category: Some("Work".into()),
                ..NewTask::titled("a")
            })
            .unwrap();
        store.add(NewTask::titled("b")).unwrap();
        store.toggle_complete(&a.id).unwrap();

        let done = store.filter(&FilterCriteria {
            status: Some(StatusFilter::Completed),
            category: Some("WORK".into()),
            ..Default::default()
        });
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, a.id);

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn ids_stay_unique_across_mutations() {
        let (_dir, store) = store();
        let mut created = Vec::new();
        for i in 0..20 {
            let t = store.add(NewTask::titled(format!("task {i}"))).unwrap();
            if i % 3 == 0 {
                store.delete(&t.id).unwrap();
            } else {
                store.toggle_complete(&t.id).unwrap();
                created.push(t);
            }
        }
        let tasks = store.load_all();
        let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), tasks.len());
        for t in &created {
            let stored = tasks.iter().find(|s| s.id == t.id).unwrap();
            assert_eq!(stored.created_at, t.created_at);
        }
    }

    #[test]
    fn split_tags_trims_and_dedups() {
        let tags = split_tags(&["home, urgent ,", "home,garden"]);
        assert_eq!(tags, vec!["home", "urgent", "garden"]);
    }

    #[test]
    fn parse_due_relative_forms() {
        // 2024-02-14 is a Wednesday
        let today = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd);
        assert_eq!(parse_due_relative_to("today", today), d(2024, 2, 14));
        assert_eq!(parse_due_relative_to("Tomorrow", today), d(2024, 2, 15));
        assert_eq!(parse_due_relative_to("in 3d", today), d(2024, 2, 17));
        assert_eq!(parse_due_relative_to("in 2w", today), d(2024, 2, 28));
        assert_eq!(parse_due_relative_to("friday", today), d(2024, 2, 16));
        assert_eq!(parse_due_relative_to("next friday", today), d(2024, 2, 23));
        assert_eq!(parse_due_relative_to("wed", today), d(2024, 2, 14));
        assert_eq!(parse_due_relative_to("eow", today), d(2024, 2, 18));
        assert_eq!(parse_due_relative_to("eom", today), d(2024, 2, 29));
        assert_eq!(parse_due_relative_to("weekend", today), d(2024, 2, 17));
        assert_eq!(parse_due_relative_to("2024-03-01", today), d(2024, 3, 1));
        assert_eq!(parse_due_relative_to("someday", today), None);
    }

    #[test]
    fn resolve_identifier_by_prefix_and_title() {
        let (_dir, store) = store();
        let a = store.add(NewTask::titled("Call mom")).unwrap();
        let tasks = store.load_all();
        assert_eq!(resolve_task_identifier(&a.id, &tasks).unwrap(), a.id);
        assert_eq!(resolve_task_identifier(a.short_id(), &tasks).unwrap(), a.id);
        assert_eq!(resolve_task_identifier("call MOM", &tasks).unwrap(), a.id);
        assert!(resolve_task_identifier("nothing", &tasks).is_err());
    }
}
