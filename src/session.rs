//! The menu-driven session: show the main menu, run the chosen handler,
//! repeat until the user leaves.
//!
//! Handlers read and write through the `TaskStore` and render through the
//! presentation helpers. Validation problems, missing tasks and failed writes
//! end the handler with a one-line message and the menu comes back.

use chrono::{Local, NaiveDate};
use tracing::warn;

use crate::db::{parse_due_input, split_tags, TaskStore};
use crate::error::{AppError, StoreError};
use crate::fields::{Priority, SortKey, StatusFilter, CATEGORIES, DEFAULT_CATEGORY};
use crate::query::{sort_tasks, FilterCriteria};
use crate::task::{NewTask, Task, TaskPatch};
use crate::tui::console::Console;
use crate::tui::terminal::PromptIo;
use crate::view::{
    format_stats, format_task_detail, format_task_list, help_lines, task_option_label,
};

const CUSTOM_CATEGORY: &str = "Custom...";
const RETURN_HINT: &str = "Press any key to return to the menu";

/// Main menu entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    View,
    Add,
    Edit,
    Toggle,
    Delete,
    Search,
    Filter,
    Sort,
    Stats,
    ClearCompleted,
    Help,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 12] = [
        MenuItem::View,
        MenuItem::Add,
        MenuItem::Edit,
        MenuItem::Toggle,
        MenuItem::Delete,
        MenuItem::Search,
        MenuItem::Filter,
        MenuItem::Sort,
        MenuItem::Stats,
        MenuItem::ClearCompleted,
        MenuItem::Help,
        MenuItem::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::View => "View tasks",
            MenuItem::Add => "Add task",
            MenuItem::Edit => "Edit task",
            MenuItem::Toggle => "Toggle complete",
            MenuItem::Delete => "Delete tasks",
            MenuItem::Search => "Search",
            MenuItem::Filter => "Filter",
            MenuItem::Sort => "Sort",
            MenuItem::Stats => "Statistics",
            MenuItem::ClearCompleted => "Clear completed",
            MenuItem::Help => "Help",
            MenuItem::Exit => "Exit",
        }
    }
}

/// What the user typed for a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DueInput {
    Blank,
    Clear,
    Date(NaiveDate),
    Invalid,
}

pub struct Session<'a, I: PromptIo> {
    store: &'a TaskStore,
    console: Console<I>,
}

impl<'a, I: PromptIo> Session<'a, I> {
    pub fn new(store: &'a TaskStore, console: Console<I>) -> Self {
        Session { store, console }
    }

    pub fn into_console(self) -> Console<I> {
        self.console
    }

    /// Run until Exit (or Esc on the main menu). Without a terminal the
    /// default entry runs once.
    pub fn run(&mut self) -> Result<(), AppError> {
        if !self.console.is_interactive() {
            return self.dispatch(MenuItem::View);
        }

        let labels: Vec<&str> = MenuItem::ALL.iter().map(|m| m.label()).collect();
        loop {
            let choice = self.console.select("Task Tracker", &labels)?;
            let Some(index) = choice.chosen() else { break };
            let item = MenuItem::ALL[index];
            if item == MenuItem::Exit {
                break;
            }
            self.dispatch(item)?;
        }
        self.console.message("Goodbye!")?;
        Ok(())
    }

    /// Run one handler. Store failures become an inline message.
    pub fn dispatch(&mut self, item: MenuItem) -> Result<(), AppError> {
        let result = match item {
            MenuItem::View => self.view_tasks(),
            MenuItem::Add => self.add_task(),
            MenuItem::Edit => self.edit_task(),
            MenuItem::Toggle => self.toggle_task(),
            MenuItem::Delete => self.delete_tasks(),
            MenuItem::Search => self.search_tasks(),
            MenuItem::Filter => self.filter_tasks(),
            MenuItem::Sort => self.sort_tasks(),
            MenuItem::Stats => self.show_stats(),
            MenuItem::ClearCompleted => self.clear_completed(),
            MenuItem::Help => self.show_help(),
            MenuItem::Exit => Ok(()),
        };
        match result {
            Err(AppError::Store(e)) => {
                warn!(error = %e, handler = item.label(), "store operation failed");
                self.console.message(&format!("Error: {e}"))?;
                Ok(())
            }
            other => other,
        }
    }

    fn show_tasks(&mut self, heading: &str, tasks: &[Task]) -> Result<(), AppError> {
        let today = Local::now().date_naive();
        self.console.print_lines(&[String::new(), heading.to_string()])?;
        self.console.print_lines(&format_task_list(tasks, today))?;
        self.console.pause(RETURN_HINT)?;
        Ok(())
    }

    fn view_tasks(&mut self) -> Result<(), AppError> {
        let tasks = self.store.load_all();
        self.show_tasks(&format!("Tasks ({})", tasks.len()), &tasks)
    }

    fn add_task(&mut self) -> Result<(), AppError> {
        let title = self.console.input("Title")?;
        let title = title.trim();
        if title.is_empty() {
            self.console.message("Title cannot be empty.")?;
            return Ok(());
        }
        let description = self.console.input("Description (optional)")?.trim().to_string();
        let priority = self.pick_priority("Priority")?.unwrap_or_default();
        let category = self
            .pick_category()?
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let due_date = match self.ask_due_date("Due date (optional, e.g. 2024-03-01, tomorrow)")? {
            DueInput::Date(d) => Some(d),
            DueInput::Invalid => {
                self.console.message("Unrecognised date; no due date set.")?;
                None
            }
            DueInput::Blank | DueInput::Clear => None,
        };
        let tags = split_tags(&[self.console.input("Tags (comma separated, optional)")?]);

        let fields = NewTask {
            title: title.to_string(),
            description: Some(description),
            priority: Some(priority),
            category: Some(category),
            due_date,
            tags,
        };
        match self.store.add(fields) {
            Ok(task) => {
                self.console
                    .message(&format!("Added \"{}\" ({}).", task.title, task.short_id()))?;
                Ok(())
            }
            Err(StoreError::EmptyTitle) => {
                self.console.message("Title cannot be empty.")?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn edit_task(&mut self) -> Result<(), AppError> {
        let Some(task) = self.pick_task("Edit which task?")? else {
            return Ok(());
        };
        self.console.print_lines(&format_task_detail(&task))?;
        self.console
            .message("Leave a field blank to keep it; enter - to clear description or due date.")?;

        let mut patch = TaskPatch::default();
        let title = self.console.input(&format!("Title [{}]", task.title))?;
        if !title.trim().is_empty() {
            patch.title = Some(title.trim().to_string());
        }
        let description = self.console.input("Description")?;
        match description.trim() {
            "" => {}
            "-" => patch.description = Some(String::new()),
            text => patch.description = Some(text.to_string()),
        }
        patch.priority = self
            .pick_priority(&format!("Priority [{}]", task.priority.label()))?
            .filter(|p| *p != task.priority);
        patch.category = self.pick_category()?.filter(|c| *c != task.category);
        match self.ask_due_date("Due date")? {
            DueInput::Blank => {}
            DueInput::Clear => patch.due_date = Some(None),
            DueInput::Date(d) => patch.due_date = Some(Some(d)),
            DueInput::Invalid => self.console.message("Unrecognised date; due date unchanged.")?,
        }

        if patch.is_empty() {
            self.console.message("Nothing changed.")?;
            return Ok(());
        }
        match self.store.update(&task.id, patch)? {
            Some(updated) => self.console.message(&format!("Updated \"{}\".", updated.title))?,
            None => self.console.message("That task no longer exists.")?,
        }
        Ok(())
    }

    fn toggle_task(&mut self) -> Result<(), AppError> {
        let Some(task) = self.pick_task("Toggle which task?")? else {
            return Ok(());
        };
        match self.store.toggle_complete(&task.id)? {
            Some(t) => {
                let state = if t.completed { "completed" } else { "pending" };
                self.console
                    .message(&format!("Marked \"{}\" as {}.", t.title, state))?;
            }
            None => self.console.message("That task no longer exists.")?,
        }
        Ok(())
    }

    fn delete_tasks(&mut self) -> Result<(), AppError> {
        let tasks = self.store.load_all();
        if tasks.is_empty() {
            self.console.message("No tasks yet.")?;
            return Ok(());
        }
        let labels: Vec<String> = tasks.iter().map(task_option_label).collect();
        let picked = self.console.multi_select("Delete which tasks?", &labels)?;
        if !picked.accepted || picked.indexes.is_empty() {
            self.console.message("Nothing deleted.")?;
            return Ok(());
        }

        let question = format!("Delete {} task(s)? This cannot be undone.", picked.indexes.len());
        if !self.console.confirm(&question, "Delete", "Cancel")?.accepted {
            self.console.message("Nothing deleted.")?;
            return Ok(());
        }

        let mut removed = 0;
        for index in picked.indexes {
            if self.store.delete(&tasks[index].id)? {
                removed += 1;
            }
        }
        self.console.message(&format!("Deleted {removed} task(s)."))?;
        Ok(())
    }

    fn search_tasks(&mut self) -> Result<(), AppError> {
        let query = self.console.input("Search for")?;
        let query = query.trim();
        if query.is_empty() {
            self.console.message("Search text cannot be empty.")?;
            return Ok(());
        }
        let hits = self.store.search(query);
        self.show_tasks(&format!("Results for \"{}\" ({})", query, hits.len()), &hits)
    }

    fn filter_tasks(&mut self) -> Result<(), AppError> {
        let options = ["Pending", "Completed", "By priority", "By category"];
        let Some(choice) = self.console.select("Filter tasks", &options)?.chosen() else {
            return Ok(());
        };

        let mut criteria = FilterCriteria::default();
        match choice {
            0 => criteria.status = Some(StatusFilter::Pending),
            1 => criteria.status = Some(StatusFilter::Completed),
            2 => match self.pick_priority("Which priority?")? {
                Some(p) => criteria.priority = Some(p),
                None => return Ok(()),
            },
            _ => {
                let known: Vec<String> = self.store.stats().categories.into_keys().collect();
                if known.is_empty() {
                    self.console.message("No tasks yet.")?;
                    return Ok(());
                }
                match self.console.select("Which category?", &known)?.chosen() {
                    Some(i) => criteria.category = Some(known[i].clone()),
                    None => return Ok(()),
                }
            }
        }

        let hits = self.store.filter(&criteria);
        self.show_tasks(&format!("{} ({})", options[choice], hits.len()), &hits)
    }

    fn sort_tasks(&mut self) -> Result<(), AppError> {
        let keys: Vec<&str> = SortKey::ALL.iter().map(|k| k.label()).collect();
        let Some(key_index) = self.console.select("Sort by", &keys)?.chosen() else {
            return Ok(());
        };
        let Some(order) = self
            .console
            .select("Order", &["Ascending", "Descending"])?
            .chosen()
        else {
            return Ok(());
        };

        let key = SortKey::ALL[key_index];
        let sorted = sort_tasks(&self.store.load_all(), key, order == 1);
        self.show_tasks(&format!("Sorted by {}", key.label().to_lowercase()), &sorted)
    }

    fn show_stats(&mut self) -> Result<(), AppError> {
        let stats = self.store.stats();
        self.console.print_lines(&format_stats(&stats))?;
        self.console.pause(RETURN_HINT)?;
        Ok(())
    }

    fn clear_completed(&mut self) -> Result<(), AppError> {
        let done = self.store.stats().completed;
        if done == 0 {
            self.console.message("No completed tasks to clear.")?;
            return Ok(());
        }
        let question = format!("Remove {done} completed task(s)?");
        if !self.console.confirm(&question, "Clear", "Cancel")?.accepted {
            return Ok(());
        }
        let removed = self.store.clear_completed()?;
        self.console.message(&format!("Cleared {removed} completed task(s)."))?;
        Ok(())
    }

    fn show_help(&mut self) -> Result<(), AppError> {
        self.console.print_lines(&help_lines())?;
        self.console.pause(RETURN_HINT)?;
        Ok(())
    }

    fn pick_task(&mut self, title: &str) -> Result<Option<Task>, AppError> {
        let mut tasks = self.store.load_all();
        if tasks.is_empty() {
            self.console.message("No tasks yet.")?;
            return Ok(None);
        }
        let labels: Vec<String> = tasks.iter().map(task_option_label).collect();
        Ok(self
            .console
            .select(title, &labels)?
            .chosen()
            .map(|i| tasks.swap_remove(i)))
    }

    fn pick_priority(&mut self, title: &str) -> Result<Option<Priority>, AppError> {
        let labels: Vec<&str> = Priority::ALL.iter().map(|p| p.label()).collect();
        Ok(self
            .console
            .select(title, &labels)?
            .chosen()
            .map(|i| Priority::ALL[i]))
    }

    /// Suggested categories plus a free-text option. `None` when cancelled or left blank.
    fn pick_category(&mut self) -> Result<Option<String>, AppError> {
        let mut options: Vec<&str> = CATEGORIES.to_vec();
        options.push(CUSTOM_CATEGORY);
        let Some(index) = self.console.select("Category", &options)?.chosen() else {
            return Ok(None);
        };
        if index < CATEGORIES.len() {
            return Ok(Some(CATEGORIES[index].to_string()));
        }
        let custom = self.console.input("Category name")?;
        let custom = custom.trim();
        Ok((!custom.is_empty()).then(|| custom.to_string()))
    }

    fn ask_due_date(&mut self, label: &str) -> Result<DueInput, AppError> {
        let raw = self.console.input(label)?;
        Ok(match raw.trim() {
            "" => DueInput::Blank,
            "-" => DueInput::Clear,
            text => parse_due_input(text).map_or(DueInput::Invalid, DueInput::Date),
        })
    }
}
