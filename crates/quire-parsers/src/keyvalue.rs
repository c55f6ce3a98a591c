//! Key-value configuration files: INI, properties, YAML, TOML, JSON and
//! line-oriented records like vCard and iCalendar.

use std::fmt::Write as _;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};

use crate::styles::stylesheet;
use crate::util::{base_metadata, builtin, line_error};

/// Flavor of key-value file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValueKind {
    Ini,
    Yaml,
    Json,
    Toml,
    Properties,
    VCard,
    ICalendar,
    Zim,
    Generic,
}

impl KeyValueKind {
    /// Classify by lowercase extension (with leading dot).
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".ini" => Self::Ini,
            ".yaml" | ".yml" => Self::Yaml,
            ".json" => Self::Json,
            ".toml" => Self::Toml,
            ".properties" => Self::Properties,
            ".vcf" => Self::VCard,
            ".ics" => Self::ICalendar,
            ".zim" => Self::Zim,
            _ => Self::Generic,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ini => "ini",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
            Self::Properties => "properties",
            Self::VCard => "vcard",
            Self::ICalendar => "icalendar",
            Self::Zim => "zim",
            Self::Generic => "generic",
        }
    }
}

/// One classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Section(String),
    Comment(String),
    Pair {
        key: String,
        value: String,
        section: Option<String>,
    },
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';') || trimmed.starts_with("//")
}

fn section_name(trimmed: &str) -> Option<&str> {
    trimmed.strip_prefix('[')?.strip_suffix(']')
}

/// Byte offset of the key-value separator.
///
/// The earlier of `=` and `:` wins; `-` is only a separator when neither
/// is present.
fn separator(line: &str) -> Option<usize> {
    match (line.find('='), line.find(':')) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b).or_else(|| line.find('-')),
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(s)
}

/// Classify every non-blank line.
#[must_use]
pub fn entries(content: &str) -> Vec<Entry> {
    let mut found = Vec::new();
    let mut section: Option<String> = None;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(name) = section_name(trimmed) {
            section = Some(name.to_owned());
            found.push(Entry::Section(name.to_owned()));
        } else if is_comment(trimmed) {
            found.push(Entry::Comment(trimmed.to_owned()));
        } else if let Some(at) = separator(trimmed) {
            let key = unquote(&trimmed[..at]);
            if !key.is_empty() {
                found.push(Entry::Pair {
                    key: key.to_owned(),
                    value: unquote(&trimmed[at + 1..]).to_owned(),
                    section: section.clone(),
                });
            }
        }
    }
    found
}

fn structural_errors(kind: KeyValueKind, content: &str) -> Vec<String> {
    let result = match kind {
        KeyValueKind::Json => serde_json::from_str::<serde_json::Value>(content)
            .map(|_| ())
            .map_err(|err| format!("Invalid JSON: {err}")),
        KeyValueKind::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)
            .map(|_| ())
            .map_err(|err| format!("Invalid YAML: {err}")),
        _ => Ok(()),
    };
    result.err().into_iter().collect()
}

fn to_html(content: &str) -> String {
    let mut out = String::from("<div class='keyvalue'>");
    out.push_str(&stylesheet(ids::KEYVALUE, true));
    out.push_str("<pre style='white-space: pre-wrap; font-family: monospace;'>");
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out.push('\n');
            continue;
        }
        if section_name(trimmed).is_some() {
            let _ = write!(out, "<span class='section'>{}</span>", escape_html(line));
        } else if is_comment(trimmed) {
            let _ = write!(out, "<span class='comment'>{}</span>", escape_html(line));
        } else if let Some(at) = separator(line) {
            let _ = write!(
                out,
                "<span class='key'>{}</span>{}",
                escape_html(&line[..at]),
                escape_html(&line[at..])
            );
        } else {
            out.push_str(&escape_html(line));
        }
        out.push('\n');
    }
    out.push_str("</pre></div>");
    out
}

/// Parser for key-value files.
pub struct KeyValueParser {
    format: &'static TextFormat,
}

impl KeyValueParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::KEYVALUE),
        }
    }
}

impl Default for KeyValueParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for KeyValueParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let kind = KeyValueKind::from_extension(&options.extension());
        let entries = entries(content);

        let mut metadata = base_metadata(content, options);
        metadata.insert("type".to_owned(), kind.as_str().to_owned());
        metadata.insert(
            "entries".to_owned(),
            entries
                .iter()
                .filter(|e| matches!(e, Entry::Pair { .. }))
                .count()
                .to_string(),
        );
        metadata.insert(
            "sections".to_owned(),
            entries
                .iter()
                .filter(|e| matches!(e, Entry::Section(_)))
                .count()
                .to_string(),
        );

        let errors = structural_errors(kind, content);
        if !errors.is_empty() {
            tracing::debug!(format = ids::KEYVALUE, kind = kind.as_str(), "Structured content did not parse");
        }

        ParsedDocument::new(self.format.clone(), content, to_html(content))
            .with_metadata(metadata)
            .with_errors(errors)
    }

    fn validate(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty()
                    && !is_comment(trimmed)
                    && section_name(trimmed).is_none()
                    && separator(trimmed).is_none()
            })
            .map(|(index, _)| line_error(index, "No key-value separator found"))
            .collect()
    }

    fn to_html(&self, document: &ParsedDocument, _light_mode: bool) -> String {
        document.parsed_content().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INI: &str = "; settings\n[server]\nhost = \"localhost\"\nport: 8080\n\n[paths]\nurl = http://x:1\n";

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(KeyValueKind::from_extension(".yml"), KeyValueKind::Yaml);
        assert_eq!(KeyValueKind::from_extension(".vcf"), KeyValueKind::VCard);
        assert_eq!(KeyValueKind::from_extension(".conf"), KeyValueKind::Generic);
    }

    #[test]
    fn test_entries() {
        let found = entries(INI);
        assert_eq!(found[0], Entry::Comment("; settings".to_owned()));
        assert_eq!(found[1], Entry::Section("server".to_owned()));
        assert_eq!(
            found[2],
            Entry::Pair {
                key: "host".to_owned(),
                value: "localhost".to_owned(),
                section: Some("server".to_owned()),
            }
        );
        assert_eq!(
            found[5],
            Entry::Pair {
                key: "url".to_owned(),
                value: "http://x:1".to_owned(),
                section: Some("paths".to_owned()),
            }
        );
    }

    #[test]
    fn test_parse_metadata() {
        let options = ParseOptions::create().set_filename("app.ini").build();
        let doc = KeyValueParser::new().parse(INI, &options);
        assert_eq!(doc.meta("type"), Some("ini"));
        assert_eq!(doc.meta("entries"), Some("3"));
        assert_eq!(doc.meta("sections"), Some("2"));
        assert!(doc.parsed_content().contains("<span class='section'>[server]</span>"));
        assert!(doc.parsed_content().contains("<span class='key'>host </span>= &quot;localhost&quot;"));
        assert!(doc.errors().is_empty());
    }

    #[test]
    fn test_invalid_json_reported() {
        let options = ParseOptions::create().set_filename("data.json").build();
        let doc = KeyValueParser::new().parse("{\"a\": }", &options);
        assert_eq!(doc.meta("type"), Some("json"));
        assert_eq!(doc.errors().len(), 1);
        assert!(doc.errors()[0].starts_with("Invalid JSON"));
    }

    #[test]
    fn test_invalid_yaml_reported() {
        let options = ParseOptions::create().set_filename("c.yaml").build();
        let doc = KeyValueParser::new().parse("a: [1, 2\n", &options);
        assert!(doc.errors()[0].starts_with("Invalid YAML"));
    }

    #[test]
    fn test_validate() {
        let errors = KeyValueParser::new().validate("a = 1\njust words\n# ok\n[s]");
        assert_eq!(errors, vec!["Line 2: No key-value separator found"]);
    }
}
