//! Jupyter notebooks (`.ipynb`).
//!
//! The notebook JSON is deserialized with serde. Only the parts needed for
//! rendering are modeled; everything else in the document is ignored.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::markdown::MarkdownParser;
use crate::styles::stylesheet;
use crate::util::{builtin, theme_class};

const DEFAULT_KERNEL: &str = "python3";
const DEFAULT_LANGUAGE: &str = "python";

/// Multi-line text as stored by Jupyter: one string or a list of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CellSource {
    Text(String),
    Lines(Vec<String>),
    #[default]
    Absent,
}

impl CellSource {
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lines(lines) => lines.concat(),
            Self::Absent => String::new(),
        }
    }
}

/// Text of a MIME bundle entry; non-text payloads yield nothing.
fn bundle_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(chunks) => Some(chunks.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

/// Accepts any JSON for an execution count and keeps only non-negative integers.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(Value::as_u64))
}

#[derive(Debug, Default, Deserialize)]
struct NameOnly {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotebookMetadata {
    #[serde(default)]
    kernelspec: NameOnly,
    #[serde(default)]
    language_info: NameOnly,
    title: Option<String>,
}

/// One cell output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellOutput {
    #[serde(default)]
    pub output_type: String,
    #[serde(default)]
    pub text: CellSource,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    pub ename: Option<String>,
    pub evalue: Option<String>,
}

impl CellOutput {
    fn is_error(&self) -> bool {
        self.output_type == "error"
    }

    /// Plain-text rendition of the output.
    #[must_use]
    pub fn plain_text(&self) -> String {
        if self.is_error() {
            return format!(
                "{}: {}",
                self.ename.as_deref().unwrap_or("Error"),
                self.evalue.as_deref().unwrap_or_default()
            );
        }
        match (&self.text, self.data.get("text/plain").and_then(bundle_text)) {
            (CellSource::Absent, Some(plain)) => plain,
            (text, _) => text.text(),
        }
    }
}

fn default_cell_type() -> String {
    "code".to_owned()
}

/// One notebook cell.
#[derive(Debug, Clone, Deserialize)]
pub struct NotebookCell {
    #[serde(default = "default_cell_type")]
    pub cell_type: String,
    #[serde(default)]
    pub source: CellSource,
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub execution_count: Option<u64>,
}

fn default_nbformat() -> u32 {
    4
}

/// A deserialized notebook.
#[derive(Debug, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<NotebookCell>,
    #[serde(default)]
    metadata: NotebookMetadata,
    #[serde(default = "default_nbformat")]
    nbformat: u32,
    #[serde(default)]
    nbformat_minor: u32,
}

impl Notebook {
    /// Deserialize notebook JSON.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    #[must_use]
    pub fn kernel(&self) -> &str {
        self.metadata.kernelspec.name.as_deref().unwrap_or(DEFAULT_KERNEL)
    }

    #[must_use]
    pub fn language(&self) -> &str {
        self.metadata.language_info.name.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    /// `nbformat.nbformat_minor`.
    #[must_use]
    pub fn format_version(&self) -> String {
        format!("{}.{}", self.nbformat, self.nbformat_minor)
    }

    /// Cells whose type is not `code`, `markdown` or `raw`.
    fn unknown_cells(&self) -> Vec<String> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !matches!(cell.cell_type.as_str(), "code" | "markdown" | "raw"))
            .map(|(index, cell)| format!("Cell {}: Unknown cell type '{}'", index + 1, cell.cell_type))
            .collect()
    }

    fn metadata_map(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("cells".to_owned(), self.cells.len().to_string());
        metadata.insert("kernel".to_owned(), self.kernel().to_owned());
        metadata.insert("language".to_owned(), self.language().to_owned());
        metadata.insert("format_version".to_owned(), self.format_version());
        if let Some(title) = self.title() {
            metadata.insert("title".to_owned(), title.to_owned());
        }
        metadata
    }

    fn cell_html(&self, out: &mut String, cell: &NotebookCell) {
        let source = cell.source.text();
        match cell.cell_type.as_str() {
            "markdown" => {
                let _ = write!(
                    out,
                    "<div class='cell markdown-cell'>{}</div>",
                    MarkdownParser::render(&source, None)
                );
            }
            "code" => {
                let prompt = cell
                    .execution_count
                    .map_or_else(|| "In [ ]:".to_owned(), |n| format!("In [{n}]:"));
                let _ = write!(
                    out,
                    "<div class='cell code-cell'><div class='prompt'>{prompt}</div><pre><code class='language-{}'>{}</code></pre>",
                    escape_html(self.language()),
                    escape_html(&source)
                );
                for output in &cell.outputs {
                    let class = if output.is_error() { "output error" } else { "output" };
                    let _ = write!(
                        out,
                        "<div class='{class}'><pre>{}</pre></div>",
                        escape_html(&output.plain_text())
                    );
                }
                out.push_str("</div>");
            }
            other => {
                let _ = write!(
                    out,
                    "<div class='cell raw-cell' data-cell-type='{}'><pre>{}</pre></div>",
                    escape_html(other),
                    escape_html(&source)
                );
            }
        }
    }

    fn to_html(&self, light_mode: bool) -> String {
        let mut out = format!(
            "<div class='notebook {}'>{}",
            theme_class(light_mode),
            stylesheet(ids::JUPYTER, light_mode)
        );
        let _ = write!(
            out,
            "<div class='notebook-header'><h1>{}</h1><div class='notebook-info'>\
<span class='kernel'>Kernel: {}</span> <span class='language'>Language: {}</span> \
<span class='cells'>Cells: {}</span></div></div>",
            escape_html(self.title().unwrap_or("Jupyter Notebook")),
            escape_html(self.kernel()),
            escape_html(self.language()),
            self.cells.len()
        );
        for cell in &self.cells {
            self.cell_html(&mut out, cell);
        }
        out.push_str("</div>");
        out
    }
}

fn error_html(content: &str, error: &serde_json::Error, light_mode: bool) -> String {
    format!(
        "<div class='notebook {}'>{}<div class='error'>Failed to parse notebook: {}</div><pre>{}</pre></div>",
        theme_class(light_mode),
        stylesheet(ids::JUPYTER, light_mode),
        escape_html(&error.to_string()),
        escape_html(content)
    )
}

/// Parser for Jupyter notebooks.
pub struct JupyterParser {
    format: &'static TextFormat,
}

impl JupyterParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::JUPYTER),
        }
    }
}

impl Default for JupyterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for JupyterParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
        match Notebook::from_json(content) {
            Ok(notebook) => ParsedDocument::new(self.format.clone(), content, notebook.to_html(true))
                .with_metadata(notebook.metadata_map())
                .with_errors(notebook.unknown_cells()),
            Err(err) => {
                tracing::debug!(format = ids::JUPYTER, error = %err, "Notebook JSON did not parse");
                ParsedDocument::new(self.format.clone(), content, content)
                    .with_errors(vec![format!("Invalid JSON format: {err}")])
            }
        }
    }

    fn validate(&self, content: &str) -> Vec<String> {
        match Notebook::from_json(content) {
            Ok(notebook) => notebook.unknown_cells(),
            Err(err) => vec![format!("Invalid JSON format: {err}")],
        }
    }

    fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
        let content = document.raw_content();
        match Notebook::from_json(content) {
            Ok(notebook) => notebook.to_html(light_mode),
            Err(err) => error_html(content, &err, light_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const NOTEBOOK: &str = r##"{
  "nbformat": 4,
  "nbformat_minor": 5,
  "metadata": {
    "kernelspec": {"name": "ir", "display_name": "R"},
    "language_info": {"name": "R"},
    "title": "Analysis"
  },
  "cells": [
    {"cell_type": "markdown", "source": ["# Intro\n", "Some *text*."]},
    {"cell_type": "code", "execution_count": 3, "source": "x <- 1 < 2",
     "outputs": [
       {"output_type": "stream", "text": ["TRUE\n"]},
       {"output_type": "execute_result", "data": {"text/plain": "[1] TRUE"}},
       {"output_type": "error", "ename": "ValueError", "evalue": "bad"}
     ]},
    {"cell_type": "raw", "source": "raw <b>"}
  ]
}"##;

    #[test]
    fn test_metadata() {
        let doc = JupyterParser::new().parse(NOTEBOOK, &ParseOptions::default());
        assert_eq!(doc.meta("cells"), Some("3"));
        assert_eq!(doc.meta("kernel"), Some("ir"));
        assert_eq!(doc.meta("language"), Some("R"));
        assert_eq!(doc.meta("format_version"), Some("4.5"));
        assert_eq!(doc.meta("title"), Some("Analysis"));
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn test_defaults() {
        let doc = JupyterParser::new().parse(r#"{"cells": [{"source": null}]}"#, &ParseOptions::default());
        assert_eq!(doc.meta("kernel"), Some("python3"));
        assert_eq!(doc.meta("language"), Some("python"));
        assert_eq!(doc.meta("format_version"), Some("4.0"));
        assert_eq!(doc.meta("title"), None);
        assert!(doc.parsed_content().contains("In [ ]:"));
    }

    #[test]
    fn test_cells_rendered() {
        let html = JupyterParser::new()
            .parse(NOTEBOOK, &ParseOptions::default())
            .parsed_content()
            .to_owned();
        assert!(html.contains("<h1>Intro</h1>"));
        assert!(html.contains("<em>text</em>"));
        assert!(html.contains("<div class='prompt'>In [3]:</div>"));
        assert!(html.contains("<code class='language-R'>x &lt;- 1 &lt; 2</code>"));
        assert!(html.contains("<pre>TRUE\n</pre>"));
        assert!(html.contains("<pre>[1] TRUE</pre>"));
        assert!(html.contains("<div class='output error'><pre>ValueError: bad</pre></div>"));
        assert!(html.contains("<pre>raw &lt;b&gt;</pre>"));
    }

    #[test]
    fn test_source_forms() {
        let text: CellSource = serde_json::from_str(r#""a\nb""#).unwrap();
        let lines: CellSource = serde_json::from_str(r#"["a\n", "b"]"#).unwrap();
        let absent: CellSource = serde_json::from_str("null").unwrap();
        assert_eq!(text.text(), "a\nb");
        assert_eq!(lines.text(), "a\nb");
        assert_eq!(absent, CellSource::Absent);
    }

    #[test]
    fn test_rich_outputs_are_not_json_errors() {
        let content = r#"{
  "cells": [
    {"cell_type": "code", "execution_count": null, "source": "display(d)",
     "outputs": [
       {"output_type": "display_data",
        "data": {"text/plain": ["{", "}"], "application/json": {"a": 1},
                 "application/vnd.jupyter.widget-view+json": {"model_id": "m1"}}}
     ]},
    {"cell_type": "code", "execution_count": "7", "source": "", "outputs": []}
  ]
}"#;
        let parser = JupyterParser::new();
        let doc = parser.parse(content, &ParseOptions::default());
        assert!(doc.errors().is_empty());
        assert!(parser.validate(content).is_empty());
        assert_eq!(doc.meta("cells"), Some("2"));

        let notebook = Notebook::from_json(content).unwrap();
        assert_eq!(notebook.cells[0].outputs[0].plain_text(), "{}");
        assert_eq!(notebook.cells[0].execution_count, None);
        assert_eq!(notebook.cells[1].execution_count, None);
    }

    #[test]
    fn test_unknown_cell_type() {
        let content = r#"{"cells": [{"cell_type": "code"}, {"cell_type": "widget"}]}"#;
        let parser = JupyterParser::new();
        let doc = parser.parse(content, &ParseOptions::default());
        assert_eq!(doc.errors(), ["Cell 2: Unknown cell type 'widget'"]);
        assert_eq!(parser.validate(content), vec!["Cell 2: Unknown cell type 'widget'"]);
    }

    #[test]
    fn test_invalid_json() {
        let parser = JupyterParser::new();
        let doc = parser.parse("{not json", &ParseOptions::default());
        assert_eq!(doc.parsed_content(), "{not json");
        assert!(doc.metadata().is_empty());
        assert!(doc.errors()[0].starts_with("Invalid JSON format: "));
        assert!(parser.validate("{not json")[0].starts_with("Invalid JSON format: "));

        let html = parser.to_html(&doc, false);
        assert!(html.starts_with("<div class='notebook dark'>"));
        assert!(html.contains("<div class='error'>Failed to parse notebook: "));
        assert!(html.contains("<pre>{not json</pre>"));
    }

    #[test]
    fn test_theme_in_to_html() {
        let parser = JupyterParser::new();
        let doc = parser.parse(NOTEBOOK, &ParseOptions::default());
        assert!(doc.parsed_content().starts_with("<div class='notebook light'>"));
        assert!(parser.to_html(&doc, false).starts_with("<div class='notebook dark'>"));
    }
}
