//! todo.txt task lists.
//!
//! Each non-blank line is one task:
//! `x 2024-01-02 (A) 2024-01-01 Call mom +family @phone due:2024-01-05`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::Regex;

use crate::styles::stylesheet;
use crate::util::{builtin, line_error};

/// Option key overriding the date used for overdue checks (`YYYY-MM-DD`).
pub const TODAY: &str = "today";

const DATE_FORMAT: &str = "%Y-%m-%d";

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+").unwrap());
static PRIORITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\(([A-Za-z])\)\s+").unwrap());
static PROJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)\+(\S+)").unwrap());
static CONTEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:^|\s)@(\S+)").unwrap());
static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+):(\S+)").unwrap());
static STRIP_PROJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+\S+").unwrap());
static STRIP_CONTEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\S+").unwrap());
static DATE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2,4}[-/.]\d{1,2}[-/.]\d{1,4}$").unwrap());

/// One parsed todo.txt line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoTask {
    pub line: String,
    pub done: bool,
    pub priority: Option<char>,
    pub completion_date: Option<String>,
    pub creation_date: Option<String>,
    pub description: String,
    pub projects: Vec<String>,
    pub contexts: Vec<String>,
    pub key_values: BTreeMap<String, String>,
}

impl TodoTask {
    /// Parse a single task line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut rest = line.trim();

        let done = rest.starts_with("x ") || rest.starts_with("X ");
        if done {
            rest = rest[2..].trim_start();
        }

        let mut completion_date = None;
        if done && let Some(caps) = LEADING_DATE.captures(rest) {
            completion_date = Some(caps[1].to_owned());
            rest = &rest[caps[0].len()..];
        }

        let mut priority = None;
        if let Some(caps) = PRIORITY.captures(rest) {
            priority = caps[1].chars().next().map(|c| c.to_ascii_uppercase());
            rest = &rest[caps[0].len()..];
        }

        let mut creation_date = None;
        if let Some(caps) = LEADING_DATE.captures(rest) {
            creation_date = Some(caps[1].to_owned());
            rest = &rest[caps[0].len()..];
        }

        let projects = PROJECT
            .captures_iter(line)
            .map(|caps| caps[1].to_owned())
            .collect();
        let contexts = CONTEXT
            .captures_iter(line)
            .map(|caps| caps[1].to_owned())
            .collect();
        let key_values = KEY_VALUE
            .captures_iter(line)
            .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
            .collect();

        let description = STRIP_PROJECT.replace_all(rest, "");
        let description = STRIP_CONTEXT.replace_all(&description, "");
        let description = KEY_VALUE.replace_all(&description, "");
        let description = description.split_whitespace().collect::<Vec<_>>().join(" ");

        Self {
            line: line.to_owned(),
            done,
            priority,
            completion_date,
            creation_date,
            description,
            projects,
            contexts,
            key_values,
        }
    }

    /// The `due:` value, if any.
    #[must_use]
    pub fn due_date(&self) -> Option<&str> {
        self.key_values.get("due").map(String::as_str)
    }

    fn due(&self) -> Option<NaiveDate> {
        self.due_date()
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
    }

    /// Open task whose due date is before `today`.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.done && self.due().is_some_and(|due| due < today)
    }

    /// Open task due on `today`.
    #[must_use]
    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        !self.done && self.due().is_some_and(|due| due == today)
    }
}

/// Parse every non-blank line as a task.
#[must_use]
pub fn parse_tasks(content: &str) -> Vec<TodoTask> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(TodoTask::parse)
        .collect()
}

fn today(options: &ParseOptions) -> NaiveDate {
    options
        .get_str(TODAY)
        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        .unwrap_or_else(|| Local::now().date_naive())
}

/// Parser for todo.txt files.
pub struct TodoTxtParser {
    format: &'static TextFormat,
}

impl TodoTxtParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::TODOTXT),
        }
    }

    fn task_html(out: &mut String, task: &TodoTask, today: NaiveDate) {
        let mut classes = vec!["task".to_owned()];
        if task.done {
            classes.push("done".to_owned());
        }
        if task.is_overdue(today) {
            classes.push("overdue".to_owned());
        }
        if task.is_due_today(today) {
            classes.push("due-today".to_owned());
        }
        if let Some(p) = task.priority {
            classes.push(format!("priority-{}", p.to_ascii_lowercase()));
        }

        let _ = write!(out, "<div class='{}'>", classes.join(" "));
        let checkbox = if task.done { "\u{2611}" } else { "\u{2610}" };
        let _ = write!(out, "<span class='checkbox'>{checkbox}</span> ");
        if let Some(p) = task.priority {
            let _ = write!(out, "<span class='priority'>({p})</span> ");
        }
        let _ = write!(
            out,
            "<span class='description'>{}</span>",
            escape_html(&task.description)
        );
        if !task.projects.is_empty() {
            out.push_str(" <span class='projects'>");
            for project in &task.projects {
                let _ = write!(out, "<span class='project'>+{}</span> ", escape_html(project));
            }
            out.push_str("</span>");
        }
        if !task.contexts.is_empty() {
            out.push_str(" <span class='contexts'>");
            for context in &task.contexts {
                let _ = write!(out, "<span class='context'>@{}</span> ", escape_html(context));
            }
            out.push_str("</span>");
        }
        if let Some(due) = task.due_date() {
            let _ = write!(out, " <span class='due-date'>due:{}</span>", escape_html(due));
        }
        out.push_str("</div>\n");
    }
}

impl Default for TodoTxtParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for TodoTxtParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let tasks = parse_tasks(content);
        let today = today(options);

        let mut metadata = BTreeMap::new();
        metadata.insert("totalTasks".to_owned(), tasks.len().to_string());
        metadata.insert(
            "completedTasks".to_owned(),
            tasks.iter().filter(|t| t.done).count().to_string(),
        );
        metadata.insert(
            "pendingTasks".to_owned(),
            tasks.iter().filter(|t| !t.done).count().to_string(),
        );
        metadata.insert(
            "overdueTasks".to_owned(),
            tasks.iter().filter(|t| t.is_overdue(today)).count().to_string(),
        );

        let mut html = format!("<div class='todotxt'>{}", stylesheet(ids::TODOTXT, true));
        for task in &tasks {
            Self::task_html(&mut html, task, today);
        }
        html.push_str("</div>");

        ParsedDocument::new(self.format.clone(), content, html).with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let rest = trimmed
                .strip_prefix("x ")
                .or_else(|| trimmed.strip_prefix("X "))
                .map_or(trimmed, str::trim_start);
            let rest = LEADING_DATE
                .find(rest)
                .map_or(rest, |m| &rest[m.end()..]);
            if rest.starts_with('(') && !PRIORITY.is_match(rest) {
                errors.push(line_error(index, "Invalid priority format"));
            }

            let task = TodoTask::parse(line);
            let dates = task
                .completion_date
                .iter()
                .chain(task.creation_date.iter())
                .map(String::as_str)
                .chain(task.due_date());
            let leading = trimmed
                .split_whitespace()
                .take(3)
                .filter(|token| DATE_LIKE.is_match(token));
            let invalid = dates
                .chain(leading)
                .any(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).is_err());
            if invalid {
                errors.push(line_error(index, "Invalid date format"));
            }
        }

        errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}
