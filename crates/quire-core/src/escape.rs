//! HTML escaping.

/// Escape the five HTML-significant characters.
///
/// Every character is replaced at most once, so `&` in the input never
/// double-escapes entities produced by this call. Escaping already-escaped
/// text escapes it again: the function is not idempotent.
///
/// ```
/// use quire_core::escape_html;
///
/// assert_eq!(escape_html("<a href='x'>A&B</a>"), "&lt;a href=&#39;x&#39;&gt;A&amp;B&lt;/a&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_specials() {
        assert_eq!(escape_html("<>&\"'"), "&lt;&gt;&amp;&quot;&#39;");
    }

    #[test]
    fn test_ampersand_once() {
        assert_eq!(escape_html("A&B"), "A&amp;B");
    }

    #[test]
    fn test_not_idempotent() {
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_html("hello world"), "hello world");
        assert_eq!(escape_html(""), "");
        assert_eq!(escape_html("ünïcödé"), "ünïcödé");
    }
}
