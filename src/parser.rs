//! Plain-text report parsing.
//!
//! Pulls the title, author, synopsis, and full text out of a line-oriented
//! document. Matching is literal: a document without `Title:` or `Author:`
//! lines parses fine and simply leaves those fields empty.

/// Number of leading lines copied into the synopsis by default.
pub const DEFAULT_SYNOPSIS_LINES: usize = 5;

/// Marker suffixed to a non-empty synopsis.
pub const ELLIPSIS: &str = "...";

pub const TITLE_KEY: &str = "Title:";
pub const AUTHOR_KEY: &str = "Author:";

/// Fields extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub name: String,
    pub author: String,
    pub synopsis: String,
    pub text: String,
}

/// Parse a document, copying its first `synopsis_lines` lines into the synopsis.
///
/// Every line is kept in `text` with a trailing newline. `name` and `author`
/// come from the first line containing the respective key marker that yields
/// a non-empty value; the two searches are independent.
pub fn parse_document(content: &str, synopsis_lines: usize) -> ParsedDocument {
    let mut doc = ParsedDocument::default();

    for (index, line) in content.lines().enumerate() {
        if index < synopsis_lines {
            doc.synopsis.push_str(line);
            doc.synopsis.push('\n');
        }

        if doc.name.is_empty() {
            doc.name = extract_value(line, TITLE_KEY).unwrap_or_default();
        }
        if doc.author.is_empty() {
            doc.author = extract_value(line, AUTHOR_KEY).unwrap_or_default();
        }

        doc.text.push_str(line);
        doc.text.push('\n');
    }

    if !doc.synopsis.is_empty() {
        doc.synopsis.push_str(ELLIPSIS);
    }

    doc
}

/// If `line` contains `key`, return everything after the line's first colon, trimmed.
pub fn extract_value(line: &str, key: &str) -> Option<String> {
    if !line.contains(key) {
        return None;
    }
    line.split_once(':').map(|(_, rest)| rest.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_and_author_anywhere() {
        let content = "Some preamble\nAuthor: Bar\nmore text\nTitle: Foo\n";
        let doc = parse_document(content, DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.name, "Foo");
        assert_eq!(doc.author, "Bar");
    }

    #[test]
    fn test_first_matching_line_wins() {
        let content = "Title: First\nTitle: Second\nAuthor: One\nAuthor: Two";
        let doc = parse_document(content, DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.name, "First");
        assert_eq!(doc.author, "One");
    }

    #[test]
    fn test_blank_value_keeps_searching() {
        let content = "Title:   \nTitle: Real Title";
        let doc = parse_document(content, DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.name, "Real Title");
    }

    #[test]
    fn test_missing_markers_leave_fields_empty() {
        let doc = parse_document("just some text\nno markers here", DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.name, "");
        assert_eq!(doc.author, "");
        assert_eq!(doc.text, "just some text\nno markers here\n");
    }

    #[test]
    fn test_value_after_first_colon() {
        assert_eq!(
            extract_value("Title: Ratio 3:1 study", TITLE_KEY).as_deref(),
            Some("Ratio 3:1 study")
        );
        assert_eq!(extract_value("Author Smith", AUTHOR_KEY), None);
    }

    #[test]
    fn test_synopsis_first_five_lines_with_ellipsis() {
        let content = "1\n2\n3\n4\n5\n6\n7";
        let doc = parse_document(content, DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.synopsis, "1\n2\n3\n4\n5\n...");
        assert_eq!(doc.text, "1\n2\n3\n4\n5\n6\n7\n");
    }

    #[test]
    fn test_short_document_synopsis() {
        let doc = parse_document("only line", DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.synopsis, "only line\n...");
    }

    #[test]
    fn test_empty_document() {
        let doc = parse_document("", DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc, ParsedDocument::default());
    }

    #[test]
    fn test_crlf_lines() {
        let doc = parse_document("Title: Foo\r\nAuthor: Bar\r\n", DEFAULT_SYNOPSIS_LINES);
        assert_eq!(doc.name, "Foo");
        assert_eq!(doc.author, "Bar");
        assert_eq!(doc.text, "Title: Foo\nAuthor: Bar\n");
    }

    #[test]
    fn test_configurable_synopsis_length() {
        let doc = parse_document("a\nb\nc", 2);
        assert_eq!(doc.synopsis, "a\nb\n...");
    }
}
