//! Delimited tables (CSV, TSV and friends).
//!
//! The delimiter and quote character are inferred from the first non-blank
//! line. Records are read with the `csv` crate in flexible mode so ragged rows
//! survive and are reported instead of aborting the parse.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use ::csv::{ReaderBuilder, StringRecord};
use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};

use crate::styles::stylesheet;
use crate::util::builtin;

/// Dialect settings for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: char,
    pub quote: char,
    pub has_header: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            has_header: true,
        }
    }
}

impl CsvDialect {
    /// Infer settings from the first line: tab, `;`, `|`, then `,`.
    #[must_use]
    pub fn infer(first_line: &str) -> Self {
        let delimiter = ['\t', ';', '|', ',']
            .into_iter()
            .find(|c| first_line.contains(*c))
            .unwrap_or(',');
        let quote = if first_line.contains('\'') { '\'' } else { '"' };
        Self {
            delimiter,
            quote,
            has_header: true,
        }
    }
}

/// A parsed table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CsvTable {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    /// Problems found while reading, such as ragged rows.
    pub errors: Vec<String>,
}

impl CsvTable {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Header width, else the width of the first row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers
            .as_ref()
            .map(Vec::len)
            .or_else(|| self.rows.first().map(Vec::len))
            .unwrap_or(0)
    }

    /// Render as a Markdown pipe table.
    #[must_use]
    pub fn to_markdown_table(&self) -> String {
        let mut out = String::new();
        if let Some(headers) = &self.headers {
            let names: Vec<&str> = headers.iter().map(|h| h.trim()).collect();
            let _ = writeln!(out, "| {} |", names.join(" | "));
            let _ = writeln!(out, "|{}|", vec![" --- "; headers.len()].join("|"));
        }
        for row in &self.rows {
            let cells: Vec<&str> = row
                .iter()
                .map(|c| match c.trim() {
                    "" => "&nbsp;",
                    cell => cell,
                })
                .collect();
            let _ = writeln!(out, "| {} |", cells.join(" | "));
        }
        out
    }

    fn to_html(&self) -> String {
        let mut out = String::from("<div class='csv-table'><table>");
        if let Some(headers) = &self.headers {
            out.push_str("<thead><tr>");
            for header in headers {
                let _ = write!(out, "<th>{}</th>", escape_html(header.trim()));
            }
            out.push_str("</tr></thead>");
        }
        out.push_str("<tbody>");
        for row in &self.rows {
            out.push_str("<tr>");
            for cell in row {
                match cell.trim() {
                    "" => out.push_str("<td>&nbsp;</td>"),
                    cell => {
                        let _ = write!(out, "<td>{}</td>", escape_html(cell).replace('\n', "<br/>"));
                    }
                }
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table></div>");
        out
    }
}

fn to_row(record: &StringRecord) -> Vec<String> {
    record.iter().map(str::to_owned).collect()
}

/// Parse `content` with the given dialect.
///
/// Blank lines and lines starting with `#` are skipped.
#[must_use]
pub fn parse_table(content: &str, dialect: CsvDialect) -> CsvTable {
    let filtered: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .collect();
    let filtered = filtered.join("\n");

    let delimiter = u8::try_from(dialect.delimiter).unwrap_or(b',');
    let quote = u8::try_from(dialect.quote).unwrap_or(b'"');
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .quote(quote)
        .has_headers(false)
        .flexible(true)
        .from_reader(filtered.as_bytes());

    let mut table = CsvTable::default();
    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => records.push(to_row(&record)),
            Err(err) => {
                tracing::warn!(format = ids::CSV, row = index + 1, error = %err, "Unreadable CSV record");
                table.errors.push(format!("Row {}: {err}", index + 1));
            }
        }
    }

    let mut records = records.into_iter();
    if dialect.has_header {
        table.headers = records.next();
    }
    table.rows = records.collect();

    let expected = table.column_count();
    let offset = usize::from(table.headers.is_some());
    for (index, row) in table.rows.iter().enumerate() {
        if row.len() != expected {
            table.errors.push(format!(
                "Row {}: expected {expected} columns, found {}",
                index + offset + 1,
                row.len()
            ));
        }
    }

    table
}

/// Parser for delimited tables.
pub struct CsvParser {
    format: &'static TextFormat,
}

impl CsvParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::CSV),
        }
    }

    fn read(content: &str) -> (CsvDialect, CsvTable) {
        let first_line = content
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("");
        let dialect = CsvDialect::infer(first_line);
        (dialect, parse_table(content, dialect))
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for CsvParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, _options: &ParseOptions) -> ParsedDocument {
        let (dialect, table) = Self::read(content);

        let mut metadata = BTreeMap::new();
        metadata.insert("rows".to_owned(), table.row_count().to_string());
        metadata.insert("columns".to_owned(), table.column_count().to_string());
        metadata.insert("delimiter".to_owned(), dialect.delimiter.to_string());
        metadata.insert("hasHeader".to_owned(), dialect.has_header.to_string());

        let html = format!("{}{}", stylesheet(ids::CSV, true), table.to_html());
        ParsedDocument::new(self.format.clone(), content, html)
            .with_metadata(metadata)
            .with_errors(table.errors)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        Self::read(content).1.errors
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer_dialect() {
        assert_eq!(CsvDialect::infer("a\tb,c").delimiter, '\t');
        assert_eq!(CsvDialect::infer("a;b,c").delimiter, ';');
        assert_eq!(CsvDialect::infer("a|b").delimiter, '|');
        assert_eq!(CsvDialect::infer("a,b").delimiter, ',');
        assert_eq!(CsvDialect::infer("ab").delimiter, ',');
        assert_eq!(CsvDialect::infer("'a','b'").quote, '\'');
        assert_eq!(CsvDialect::infer("a,b").quote, '"');
    }

    #[test]
    fn test_parse_with_quotes_and_comments() {
        let content = "# exported\nname,note\n\nAda,\"likes, commas\"\nBob,\n";
        let table = parse_table(content, CsvDialect::default());
        assert_eq!(table.headers, Some(vec!["name".to_owned(), "note".to_owned()]));
        assert_eq!(table.rows[0], vec!["Ada", "likes, commas"]);
        assert_eq!(table.rows[1], vec!["Bob", ""]);
        assert!(table.errors.is_empty());
    }

    #[test]
    fn test_parse_metadata_and_html() {
        let doc = CsvParser::new().parse("a;b\n1;\n3;4", &ParseOptions::default());
        assert_eq!(doc.meta("rows"), Some("2"));
        assert_eq!(doc.meta("columns"), Some("2"));
        assert_eq!(doc.meta("delimiter"), Some(";"));
        assert_eq!(doc.meta("hasHeader"), Some("true"));
        let html = doc.parsed_content();
        assert!(html.contains("<thead><tr><th>a</th><th>b</th></tr></thead>"));
        assert!(html.contains("<tr><td>1</td><td>&nbsp;</td></tr>"));
    }

    #[test]
    fn test_ragged_rows_reported() {
        let parser = CsvParser::new();
        let errors = parser.validate("a,b,c\n1,2,3\n4,5\n");
        assert_eq!(errors, vec!["Row 3: expected 3 columns, found 2"]);
        let doc = parser.parse("a,b,c\n1,2,3\n4,5\n", &ParseOptions::default());
        assert_eq!(doc.errors().len(), 1);
        assert_eq!(doc.meta("rows"), Some("2"));
    }

    #[test]
    fn test_markdown_table() {
        let table = parse_table("h1,h2\nx,\n", CsvDialect::default());
        assert_eq!(
            table.to_markdown_table(),
            "| h1 | h2 |\n| --- | --- |\n| x | &nbsp; |\n"
        );
    }

    #[test]
    fn test_empty_content() {
        let doc = CsvParser::new().parse("", &ParseOptions::default());
        assert_eq!(doc.meta("rows"), Some("0"));
        assert_eq!(doc.meta("columns"), Some("0"));
        assert!(doc.errors().is_empty());
    }
}
