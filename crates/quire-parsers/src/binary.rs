//! Binary files: a preview card instead of rendered content.

use std::collections::BTreeMap;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};

use crate::styles::stylesheet;
use crate::util::{builtin, theme_class};

/// Option carrying the file size in bytes.
pub const FILE_SIZE: &str = "file_size";
/// Option overriding the extension-based MIME type.
pub const MIME_TYPE: &str = "mime_type";

const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for a lowercase extension (with leading dot).
#[must_use]
pub fn mime_type(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".webp" => "image/webp",
        ".svg" => "image/svg+xml",
        ".pdf" => "application/pdf",
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/wav",
        ".ogg" => "audio/ogg",
        ".mp4" => "video/mp4",
        ".avi" => "video/x-msvideo",
        ".mov" => "video/quicktime",
        ".zip" => "application/zip",
        ".tar" => "application/x-tar",
        ".gz" => "application/gzip",
        _ => OCTET_STREAM,
    }
}

/// Coarse file category for a MIME type.
#[must_use]
pub fn file_type(mime: &str) -> &'static str {
    if mime.starts_with("image/") {
        "Image"
    } else if mime.starts_with("audio/") {
        "Audio"
    } else if mime.starts_with("video/") {
        "Video"
    } else if mime == "application/pdf" {
        "PDF Document"
    } else if matches!(mime, "application/zip" | "application/x-tar" | "application/gzip") {
        "Archive"
    } else {
        "Binary File"
    }
}

/// Human-readable size using binary units, truncated to whole units.
#[must_use]
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024 && unit < UNITS.len() - 1 {
        value /= 1024;
        unit += 1;
    }
    format!("{value} {}", UNITS[unit])
}

fn metadata(options: &ParseOptions) -> BTreeMap<String, String> {
    let extension = options.extension();
    let mime = options
        .get_str(MIME_TYPE)
        .map_or_else(|| mime_type(&extension).to_owned(), str::to_owned);
    let size = options
        .get(FILE_SIZE)
        .and_then(|v| v.as_int())
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0);

    let mut metadata = BTreeMap::new();
    metadata.insert("file_type".to_owned(), file_type(&mime).to_owned());
    metadata.insert("mime_type".to_owned(), mime);
    metadata.insert("file_size".to_owned(), size.to_string());
    metadata.insert("is_binary".to_owned(), "true".to_owned());
    metadata.insert("extension".to_owned(), extension);
    if let Some(name) = options.filename() {
        metadata.insert("filename".to_owned(), name.to_owned());
    }
    metadata
}

fn preview(metadata: &BTreeMap<String, String>, light_mode: bool) -> String {
    let get = |key: &str| metadata.get(key).map_or("", String::as_str);
    let size = get("file_size").parse().map_or_else(|_| human_size(0), human_size);
    format!(
        "<div class='binary-preview {}'>{}<h3>{}</h3><dl>\
<dt>File</dt><dd>{}</dd><dt>MIME type</dt><dd>{}</dd><dt>Size</dt><dd>{size}</dd></dl>\
<p><em>This file cannot be previewed as text.</em></p></div>",
        theme_class(light_mode),
        stylesheet(ids::BINARY, light_mode),
        escape_html(get("file_type")),
        escape_html(get("filename")),
        escape_html(get("mime_type")),
    )
}

/// Parser for files with no text representation.
pub struct BinaryParser {
    format: &'static TextFormat,
}

impl BinaryParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::BINARY),
        }
    }
}

impl Default for BinaryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for BinaryParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let metadata = metadata(options);
        ParsedDocument::new(self.format.clone(), content, preview(&metadata, true))
            .with_metadata(metadata)
    }

    fn validate(&self, _content: &str) -> Vec<String> {
        Vec::new()
    }

    fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
        preview(document.metadata(), light_mode)
    }
}
