//! TaskPaper outlines.
//!
//! Projects end with `:`, tasks start with `- `, everything else is a note.
//! Tabs set the nesting depth and `@tag(value)` annotates any item.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::Regex;

use crate::styles::stylesheet;
use crate::util::{base_metadata, builtin, line_error};

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)(?:\(([^)]*)\))?").unwrap());
static UNCLOSED_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+\([^)]*$").unwrap());

/// Kind of outline line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Project,
    Task,
    Note,
    Empty,
}

/// One outline line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPaperItem {
    pub kind: ItemKind,
    pub text: String,
    pub depth: usize,
    pub tags: BTreeMap<String, String>,
}

impl TaskPaperItem {
    /// Classify a single line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        if line.trim().is_empty() {
            return Self {
                kind: ItemKind::Empty,
                text: String::new(),
                depth: 0,
                tags: BTreeMap::new(),
            };
        }

        let depth = line.chars().take_while(|&c| c == '\t').count();
        let trimmed = line.trim_start();
        let (kind, text) = if let Some(task) = trimmed.strip_prefix("- ") {
            (ItemKind::Task, task)
        } else if TAG.replace_all(trimmed, "").trim_end().ends_with(':') {
            (ItemKind::Project, trimmed)
        } else {
            (ItemKind::Note, trimmed)
        };

        let tags = TAG
            .captures_iter(text)
            .map(|caps| {
                let value = caps.get(2).map_or("", |m| m.as_str());
                (caps[1].to_owned(), value.to_owned())
            })
            .collect();

        Self {
            kind,
            text: text.trim_end().to_owned(),
            depth,
            tags,
        }
    }

    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.has_tag("done")
    }

    #[must_use]
    pub fn is_today(&self) -> bool {
        self.has_tag("today")
    }
}

/// Every line of the outline.
#[must_use]
pub fn items(content: &str) -> Vec<TaskPaperItem> {
    content.lines().map(TaskPaperItem::parse).collect()
}

/// Escape text and wrap each tag in a span.
fn highlight_tags(text: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for caps in TAG.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let class = match &caps[1] {
            "done" => "taskpaper-tag taskpaper-tag-done",
            "today" => "taskpaper-tag taskpaper-tag-today",
            _ => "taskpaper-tag",
        };
        out.push_str(&escape_html(&text[last..whole.start()]));
        let _ = write!(out, "<span class='{class}'>{}</span>", escape_html(whole.as_str()));
        last = whole.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

fn to_html(items: &[TaskPaperItem]) -> String {
    let mut out = format!("<div class='taskpaper'>{}", stylesheet(ids::TASKPAPER, true));
    out.push_str("<pre style='white-space: pre-wrap;'>");
    for item in items {
        out.push_str(&"\t".repeat(item.depth));
        match item.kind {
            ItemKind::Empty => {}
            ItemKind::Project => {
                let _ = write!(
                    out,
                    "<span class='taskpaper-project'>{}</span>",
                    highlight_tags(&item.text)
                );
            }
            ItemKind::Task => {
                let class = if item.is_done() { "taskpaper-task-done" } else { "taskpaper-task" };
                let _ = write!(out, "<span class='{class}'>- {}</span>", highlight_tags(&item.text));
            }
            ItemKind::Note => {
                let _ = write!(
                    out,
                    "<span class='taskpaper-note'>{}</span>",
                    escape_html(&item.text)
                );
            }
        }
        out.push('\n');
    }
    out.push_str("</pre></div>");
    out
}

/// Parser for TaskPaper files.
pub struct TaskPaperParser {
    format: &'static TextFormat,
}

impl TaskPaperParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::TASKPAPER),
        }
    }
}

impl Default for TaskPaperParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for TaskPaperParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let items = items(content);
        let count = |pred: &dyn Fn(&TaskPaperItem) -> bool| {
            items.iter().filter(|item| pred(item)).count().to_string()
        };

        let mut metadata = base_metadata(content, options);
        metadata.insert("projects".to_owned(), count(&|i| i.kind == ItemKind::Project));
        metadata.insert("tasks".to_owned(), count(&|i| i.kind == ItemKind::Task));
        metadata.insert("notes".to_owned(), count(&|i| i.kind == ItemKind::Note));
        metadata.insert(
            "doneTasks".to_owned(),
            count(&|i| i.kind == ItemKind::Task && i.is_done()),
        );
        metadata.insert(
            "todayTasks".to_owned(),
            count(&|i| i.kind == ItemKind::Task && i.is_today()),
        );

        ParsedDocument::new(self.format.clone(), content, to_html(&items)).with_metadata(metadata)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with('-') && !trimmed.starts_with("- ") {
                errors.push(line_error(
                    index,
                    "Task marker should be '- ' (hyphen followed by space)",
                ));
            }
            if UNCLOSED_TAG.is_match(trimmed) {
                errors.push(line_error(index, "Unclosed tag parameter"));
            }
        }
        errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OUTLINE: &str = "Inbox:\n\t- Buy milk @today\n\t- File taxes @done(2024-04-01)\n\tRemember receipts\n\nWork: @flagged\n\t- Ship <release> @due(2024-05-01)\n";

    #[test]
    fn test_classify_items() {
        let items = items(OUTLINE);
        assert_eq!(items[0].kind, ItemKind::Project);
        assert_eq!(items[1].kind, ItemKind::Task);
        assert_eq!(items[1].depth, 1);
        assert!(items[1].is_today());
        assert_eq!(items[2].tags.get("done").map(String::as_str), Some("2024-04-01"));
        assert_eq!(items[3].kind, ItemKind::Note);
        assert_eq!(items[4].kind, ItemKind::Empty);
        assert_eq!(items[5].kind, ItemKind::Project);
    }

    #[test]
    fn test_metadata() {
        let doc = TaskPaperParser::new().parse(OUTLINE, &ParseOptions::default());
        assert_eq!(doc.meta("projects"), Some("2"));
        assert_eq!(doc.meta("tasks"), Some("3"));
        assert_eq!(doc.meta("notes"), Some("1"));
        assert_eq!(doc.meta("doneTasks"), Some("1"));
        assert_eq!(doc.meta("todayTasks"), Some("1"));
    }

    #[test]
    fn test_html() {
        let doc = TaskPaperParser::new().parse(OUTLINE, &ParseOptions::default());
        let html = doc.parsed_content();
        assert!(html.contains("<span class='taskpaper-project'>Inbox:</span>"));
        assert!(html.contains(
            "\t<span class='taskpaper-task-done'>- File taxes <span class='taskpaper-tag taskpaper-tag-done'>@done(2024-04-01)</span></span>"
        ));
        assert!(html.contains("<span class='taskpaper-tag taskpaper-tag-today'>@today</span>"));
        assert!(html.contains("Ship &lt;release&gt; "));
        assert!(html.contains("<span class='taskpaper-note'>Remember receipts</span>"));
    }

    #[test]
    fn test_validate() {
        let errors = TaskPaperParser::new().validate("-no space\n- ok @due(2024\n- fine @x(1)");
        assert_eq!(
            errors,
            vec![
                "Line 1: Task marker should be '- ' (hyphen followed by space)",
                "Line 2: Unclosed tag parameter",
            ]
        );
    }
}
