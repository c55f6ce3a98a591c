//! LaTeX documents.
//!
//! Rendering covers the document skeleton (title block, sectioning, lists,
//! display and inline math, verbatim) rather than full TeX semantics.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use quire_core::{ParseOptions, ParsedDocument, TextParser, escape_html};
use quire_format::{TextFormat, ids};
use regex::{Captures, Regex};

use crate::styles::stylesheet;
use crate::util::{Stash, base_metadata, builtin, line_error, rewrite, rules, theme_class};

/// Lines scanned for front metadata.
const FRONT_LINES: usize = 50;

/// Environments whose content is typeset as math.
const MATH_ENVIRONMENTS: &[&str] = &[
    "equation", "equation*", "align", "align*", "gather", "gather*", "multline", "multline*",
    "eqnarray", "eqnarray*", "displaymath", "math",
];

/// Environments where `&` separates columns.
const ALIGNMENT_ENVIRONMENTS: &[&str] = &[
    "tabular", "tabular*", "tabularx", "longtable", "array", "matrix", "pmatrix", "bmatrix",
    "cases", "split", "alignat", "alignat*",
];

static FRONT_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\(title|author|date|documentclass)(?:\[[^\]]*\])?\{([^}]*)\}").unwrap()
});
static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\(part|chapter|section|subsection|subsubsection|paragraph)\*?\{(.*)\}\s*$")
        .unwrap()
});
static BEGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\begin\{([^}]+)\}").unwrap());
static END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\end\{([^}]+)\}").unwrap());
static SKIPPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\(documentclass|usepackage|maketitle|tableofcontents|label|newcommand|renewcommand)\b")
        .unwrap()
});
static INLINE_MATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$([^$]+)\$").unwrap());
static COMMANDS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    rules(&[
        (r"\\textbf\{([^}]*)\}", "<strong>$1</strong>"),
        (r"\\(?:textit|emph)\{([^}]*)\}", "<em>$1</em>"),
        (r"\\underline\{([^}]*)\}", "<u>$1</u>"),
        (r"\\texttt\{([^}]*)\}", "<code>$1</code>"),
        (r"\\href\{([^}]*)\}\{([^}]*)\}", "<a href='$1'>$2</a>"),
        (r"\\url\{([^}]*)\}", "<a href='$1'>$1</a>"),
        (r"\\\\", "<br>"),
        (r"\\([&%#$_{}])", "$1"),
        (r"~", "&nbsp;"),
    ])
});

/// Title block and `% key: value` comments from the top of the file.
#[must_use]
pub fn front_metadata(content: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for line in content.lines().take(FRONT_LINES) {
        let line = line.trim();
        if let Some(caps) = FRONT_COMMAND.captures(line) {
            metadata.insert(caps[1].to_owned(), caps[2].trim().to_owned());
        } else if let Some(comment) = line.strip_prefix('%')
            && let Some((key, value)) = comment.split_once(':')
            && !key.trim().is_empty()
        {
            metadata.insert(key.trim().to_owned(), value.trim().to_owned());
        }
    }
    metadata
}

/// Drop an unescaped `%` comment from a line.
fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '%' if !escaped => return &line[..i],
            _ => escaped = false,
        }
    }
    line
}

fn inline(text: &str) -> String {
    let text = Stash::scrub(text);
    let mut stash = Stash::default();
    let text = INLINE_MATH.replace_all(&text, |caps: &Captures<'_>| {
        stash.put(format!(
            "<span class='latex-math math-inline'>{}</span>",
            escape_html(&caps[1])
        ))
    });
    stash.restore(&rewrite(&COMMANDS, &escape_html(&text)))
}

#[derive(PartialEq, Eq)]
enum Block {
    Text,
    Math,
    Verbatim,
}

fn body_html(content: &str) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut environments: Vec<String> = Vec::new();
    let mut block = Block::Text;
    let mut captured: Vec<String> = Vec::new();

    let flush = |out: &mut String, paragraph: &mut Vec<String>| {
        if !paragraph.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for raw in content.lines() {
        if block == Block::Verbatim {
            if raw.trim_start().starts_with("\\end{verbatim}") {
                out.push_str(&format!("<pre>{}</pre>\n", escape_html(&captured.join("\n"))));
                captured.clear();
                block = Block::Text;
            } else {
                captured.push(raw.to_owned());
            }
            continue;
        }

        let line = strip_comment(raw).trim();
        if block == Block::Math {
            let closes = line.starts_with("\\]")
                || END
                    .captures(line)
                    .is_some_and(|caps| MATH_ENVIRONMENTS.contains(&&caps[1]));
            if closes {
                out.push_str(&format!(
                    "<div class='latex-math math-display'>{}</div>\n",
                    escape_html(&captured.join("\n"))
                ));
                captured.clear();
                block = Block::Text;
            } else {
                captured.push(line.to_owned());
            }
            continue;
        }

        if line.is_empty() {
            flush(&mut out, &mut paragraph);
            continue;
        }

        if let Some(caps) = FRONT_COMMAND.captures(line) {
            let field = &caps[1];
            if field != "documentclass" {
                flush(&mut out, &mut paragraph);
                out.push_str(&format!(
                    "<div class='latex-{field}'>{}</div>\n",
                    inline(caps[2].trim())
                ));
            }
        } else if let Some(caps) = SECTION.captures(line) {
            flush(&mut out, &mut paragraph);
            let level = match &caps[1] {
                "part" | "chapter" => 1,
                "section" => 2,
                "subsection" => 3,
                "subsubsection" => 4,
                _ => 5,
            };
            out.push_str(&format!(
                "<h{level} class='latex-{}'>{}</h{level}>\n",
                &caps[1],
                inline(&caps[2])
            ));
        } else if line.starts_with("\\[") {
            flush(&mut out, &mut paragraph);
            let rest = line.trim_start_matches("\\[");
            if let Some(formula) = rest.strip_suffix("\\]") {
                out.push_str(&format!(
                    "<div class='latex-math math-display'>{}</div>\n",
                    escape_html(formula.trim())
                ));
            } else {
                block = Block::Math;
                if !rest.trim().is_empty() {
                    captured.push(rest.trim().to_owned());
                }
            }
        } else if let Some(caps) = BEGIN.captures(line)
            && line.starts_with("\\begin")
        {
            flush(&mut out, &mut paragraph);
            let name = caps[1].to_owned();
            match name.as_str() {
                "document" => {}
                "itemize" => out.push_str("<ul class='itemize'>\n"),
                "enumerate" => out.push_str("<ol class='enumerate'>\n"),
                "verbatim" => block = Block::Verbatim,
                env if MATH_ENVIRONMENTS.contains(&env) => block = Block::Math,
                env => out.push_str(&format!(
                    "<div class='environment'><div class='environment-title'>{}</div>\n",
                    escape_html(env)
                )),
            }
            if block == Block::Text {
                environments.push(name);
            }
        } else if let Some(caps) = END.captures(line)
            && line.starts_with("\\end")
        {
            flush(&mut out, &mut paragraph);
            let name = &caps[1];
            if environments.last().is_some_and(|open| open == name) {
                environments.pop();
            }
            match name {
                "document" => {}
                "itemize" => out.push_str("</ul>\n"),
                "enumerate" => out.push_str("</ol>\n"),
                _ => out.push_str("</div>\n"),
            }
        } else if let Some(item) = line.strip_prefix("\\item") {
            flush(&mut out, &mut paragraph);
            out.push_str(&format!("<li class='item'>{}</li>\n", inline(item.trim())));
        } else if SKIPPED.is_match(line) {
            continue;
        } else {
            paragraph.push(inline(line));
        }
    }

    flush(&mut out, &mut paragraph);
    if !captured.is_empty() {
        out.push_str(&format!("<pre>{}</pre>\n", escape_html(&captured.join("\n"))));
    }
    out
}

/// Scan state for validation.
#[derive(Default)]
struct MathState {
    inline: bool,
    display: bool,
}

impl MathState {
    fn active(&self) -> bool {
        self.inline || self.display
    }
}

/// Parser for LaTeX sources.
pub struct LatexParser {
    format: &'static TextFormat,
}

impl LatexParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: builtin(ids::LATEX),
        }
    }

    fn themed(content: &str, light_mode: bool) -> String {
        format!(
            "<div class='latex-document {}'>{}{}</div>",
            theme_class(light_mode),
            stylesheet(ids::LATEX, light_mode),
            body_html(content)
        )
    }
}

impl Default for LatexParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TextParser for LatexParser {
    fn supported_format(&self) -> &TextFormat {
        self.format
    }

    fn parse(&self, content: &str, options: &ParseOptions) -> ParsedDocument {
        let mut metadata = front_metadata(content);
        metadata.extend(base_metadata(content, options));
        ParsedDocument::new(self.format.clone(), content, Self::themed(content, true))
            .with_metadata(metadata)
            .with_errors(self.validate(content))
    }

    fn validate(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let mut environments: Vec<String> = Vec::new();
        let mut math = MathState::default();

        for (index, raw) in content.lines().enumerate() {
            let line = strip_comment(raw);

            for caps in BEGIN.captures_iter(line) {
                environments.push(caps[1].to_owned());
            }
            for caps in END.captures_iter(line) {
                let name = &caps[1];
                match environments.last() {
                    Some(open) if open == name => {
                        environments.pop();
                    }
                    open => errors.push(line_error(
                        index,
                        format!(
                            "Mismatched environment end: {name} (expected: {})",
                            open.map_or("none", String::as_str)
                        ),
                    )),
                }
            }

            let in_math_env = environments
                .iter()
                .any(|env| MATH_ENVIRONMENTS.contains(&env.as_str()));
            let in_alignment = environments
                .iter()
                .any(|env| ALIGNMENT_ENVIRONMENTS.contains(&env.as_str()));
            let defines_macro = line.contains("\\newcommand")
                || line.contains("\\renewcommand")
                || line.contains("\\def");

            let (mut ampersand, mut hash) = (false, false);
            let mut chars = line.chars().peekable();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some('[') => math.display = true,
                        Some(']') => math.display = false,
                        _ => {}
                    },
                    '$' if chars.peek() == Some(&'$') => {
                        chars.next();
                        math.display = !math.display;
                    }
                    '$' => math.inline = !math.inline,
                    '&' if !math.active() && !in_math_env && !in_alignment => ampersand = true,
                    '#' if !math.active() && !in_math_env && !defines_macro => hash = true,
                    _ => {}
                }
            }
            if ampersand {
                errors.push(line_error(index, "Unescaped ampersand (&)"));
            }
            if hash {
                errors.push(line_error(index, "Unescaped hash (#)"));
            }
        }

        if math.active() {
            errors.push("Unclosed math mode".to_owned());
        }
        for env in environments {
            errors.push(format!("Unclosed environment: {env}"));
        }
        errors
    }

    fn to_html(&self, document: &ParsedDocument, light_mode: bool) -> String {
        Self::themed(document.raw_content(), light_mode)
    }
}
