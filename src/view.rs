//! Presentation helpers: pure functions turning tasks and statistics into
//! plain display lines. Nothing here decides anything about the data.

use chrono::{Local, NaiveDate};

use crate::fields::Priority;
use crate::query::Stats;
use crate::task::Task;

const BAR_WIDTH: usize = 20;

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Bracketed priority badge, e.g. `[URGENT]`.
pub fn priority_badge(p: Priority) -> String {
    format!("[{}]", p.as_str().to_uppercase())
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// One-line label used for task options inside prompts.
pub fn task_option_label(task: &Task) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    format!(
        "{} {} {} ({})",
        check,
        truncate(&task.title, 40),
        priority_badge(task.priority),
        task.category
    )
}

/// Listing entry for a task: a headline plus optional description and tag lines.
pub fn format_task_lines(task: &Task, today: NaiveDate) -> Vec<String> {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let mut headline = format!(
        "{} {}  {}  {}  {}",
        check,
        task.short_id(),
        task.title,
        priority_badge(task.priority),
        task.category
    );
    if task.due_date.is_some() {
        headline.push_str(&format!("  due {}", format_due_relative(task.due_date, today)));
    }

    let mut lines = vec![headline];
    if !task.description.is_empty() {
        lines.push(format!("      {}", task.description));
    }
    if !task.tags.is_empty() {
        lines.push(format!("      #{}", task.tags.join(" #")));
    }
    lines
}

/// Listing for a whole collection, with a placeholder line when empty.
pub fn format_task_list(tasks: &[Task], today: NaiveDate) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["No tasks found.".to_string()];
    }
    tasks
        .iter()
        .flat_map(|t| format_task_lines(t, today))
        .collect()
}

/// Every field of a task, one per line.
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".into());
    let completed_at = task
        .completed_at
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into());
    let tags = if task.tags.is_empty() {
        "-".to_string()
    } else {
        task.tags.join(", ")
    };
    let description = if task.description.is_empty() {
        "-"
    } else {
        task.description.as_str()
    };

    vec![
        format!("ID:          {}", task.id),
        format!("Title:       {}", task.title),
        format!("Description: {}", description),
        format!("Priority:    {}", task.priority.label()),
        format!("Category:    {}", task.category),
        format!("Due:         {}", due),
        format!("Status:      {}", if task.completed { "Completed" } else { "Pending" }),
        format!("Completed:   {}", completed_at),
        format!(
            "Created:     {}",
            task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        format!("Tags:        {}", tags),
    ]
}

/// Text progress bar for a 0-100 percentage.
pub fn progress_bar(percent: u32) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn format_stats(stats: &Stats) -> Vec<String> {
    let mut lines = vec![
        "Statistics".to_string(),
        format!("  Total:      {}", stats.total),
        format!("  Completed:  {}", stats.completed),
        format!("  Pending:    {}", stats.pending),
        format!(
            "  Progress:   {} {}%",
            progress_bar(stats.completion_rate),
            stats.completion_rate
        ),
        String::new(),
        "By priority".to_string(),
    ];
    for (priority, count) in &stats.by_priority {
        lines.push(format!("  {:<8} {}", priority.label(), count));
    }
    lines.push(String::new());
    lines.push("By category".to_string());
    if stats.categories.is_empty() {
        lines.push("  -".to_string());
    }
    for (category, count) in &stats.categories {
        lines.push(format!("  {:<12} {}", truncate(category, 12), count));
    }
    lines
}

pub fn help_lines() -> Vec<String> {
    [
        "Keys",
        "  Up/Down   move the cursor",
        "  Enter     choose the highlighted entry",
        "  Space     mark or unmark an entry in multi-select lists",
        "  Esc       cancel the current menu",
        "  Ctrl+C    quit immediately",
        "",
        "Menu",
        "  View tasks        list every task",
        "  Add task          create a task (title is required)",
        "  Edit task         change title, description, priority, category or due date",
        "  Toggle complete   mark a task done or pending",
        "  Delete tasks      remove one or more tasks",
        "  Search            match title, description, category and tags",
        "  Filter            show tasks by status, priority or category",
        "  Sort              order tasks by priority, due date, creation date or title",
        "  Statistics        totals and completion rate",
        "  Clear completed   remove every completed task",
        "",
        "Due dates accept YYYY-MM-DD, today, tomorrow, in 3d, friday, next monday, eow, eom.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::Utc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()
    }

    #[test]
    fn due_relative_labels() {
        let d = |dd| NaiveDate::from_ymd_opt(2024, 2, dd);
        assert_eq!(format_due_relative(None, today()), "-");
        assert_eq!(format_due_relative(d(14), today()), "today");
        assert_eq!(format_due_relative(d(15), today()), "tomorrow");
        assert_eq!(format_due_relative(d(20), today()), "in 6d");
        assert_eq!(format_due_relative(d(12), today()), "2d late");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn task_lines_include_optional_parts() {
        let mut task = Task::create(
            NewTask {
                description: Some("before friday".into()),
                tags: vec!["home".into(), "bills".into()],
                due_date: NaiveDate::from_ymd_opt(2024, 2, 15),
                ..NewTask::titled("Pay rent")
            },
            Utc::now(),
        );
        let lines = format_task_lines(&task, today());
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[ ] "));
        assert!(lines[0].contains("Pay rent"));
        assert!(lines[0].contains("[MEDIUM]"));
        assert!(lines[0].ends_with("due tomorrow"));
        assert_eq!(lines[2], "      #home #bills");

        task.set_completed(true, Utc::now());
        task.description.clear();
        task.tags.clear();
        let lines = format_task_lines(&task, today());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[x] "));
    }

    #[test]
    fn empty_list_has_placeholder() {
        assert_eq!(format_task_list(&[], today()), vec!["No tasks found."]);
    }

    #[test]
    fn progress_bar_scales() {
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(20)));
        assert_eq!(progress_bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
    }

    #[test]
    fn stats_lines_list_every_priority() {
        let stats = Stats::collect(&[]);
        let lines = format_stats(&stats);
        assert!(lines.iter().any(|l| l.contains("Urgent")));
        assert!(lines.iter().any(|l| l.contains("Low")));
        assert!(lines.iter().any(|l| l.contains("0%")));
    }
}
