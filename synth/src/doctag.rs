//! Splitting of free-text documentation tag lines into a key and a
//! description.
//!
//! Every doc-tag channel (`@HTTP 404 not found`, `@ResponseHeader X-Id the id`,
//! `@param id the id`, ...) shares one line shape: a key token, a whitespace
//! run, and a free-text remainder.

use apisurface_model::DocTags;

/// How the key token of a line is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The key is a name.
    Text,
    /// The key is a numeric status code; lines whose key does not parse are
    /// skipped.
    Numeric,
}

/// The key of a parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKey<'a> {
    /// A name key.
    Name(&'a str),
    /// A numeric key.
    Code(u16),
}

/// One parsed documentation tag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocEntry<'a> {
    /// The key token.
    pub key: DocKey<'a>,
    /// The remainder of the line; empty if there is none.
    pub description: &'a str,
}

/// Splits a line on its first whitespace run. Surrounding whitespace is
/// ignored.
#[must_use]
pub fn split_line(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(at) => (&line[..at], line[at..].trim_start()),
        None => (line, ""),
    }
}

/// Parses every line of doc tag `tag`. An absent tag yields nothing.
pub fn doc_entries<'a>(
    docs: &'a DocTags,
    tag: &str,
    kind: KeyKind,
) -> impl Iterator<Item = DocEntry<'a>> + 'a {
    docs.get(tag)
        .unwrap_or_default()
        .iter()
        .filter_map(move |line| {
            let (key, description) = split_line(line);
            let key = match kind {
                KeyKind::Text if key.is_empty() => return None,
                KeyKind::Text => DocKey::Name(key),
                KeyKind::Numeric => DocKey::Code(key.parse().ok()?),
            };
            Some(DocEntry { key, description })
        })
}

/// `(name, description)` pairs of a name-keyed doc tag.
pub fn named_entries<'a>(
    docs: &'a DocTags,
    tag: &str,
) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    doc_entries(docs, tag, KeyKind::Text).filter_map(|entry| match entry.key {
        DocKey::Name(name) => Some((name, entry.description)),
        DocKey::Code(_) => None,
    })
}

/// `(code, description)` pairs of a code-keyed doc tag.
pub fn coded_entries<'a>(
    docs: &'a DocTags,
    tag: &str,
) -> impl Iterator<Item = (u16, &'a str)> + 'a {
    doc_entries(docs, tag, KeyKind::Numeric).filter_map(|entry| match entry.key {
        DocKey::Code(code) => Some((code, entry.description)),
        DocKey::Name(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn docs(tag: &str, lines: &[&str]) -> DocTags {
        let mut docs = DocTags::default();
        for line in lines {
            docs.push(tag, *line);
        }
        docs
    }

    #[test]
    fn splits_on_first_whitespace_run() {
        assert_eq!(split_line("404 not   found"), ("404", "not   found"));
        assert_eq!(split_line("X-Id\t \tthe id"), ("X-Id", "the id"));
        assert_eq!(split_line("  id  "), ("id", ""));
        assert_eq!(split_line(""), ("", ""));
    }

    #[test]
    fn numeric_keys_skip_malformed_lines() {
        let d = docs("HTTP", &["404 not found", "oops broken", "500", "4o4 typo"]);
        let codes: Vec<_> = coded_entries(&d, "HTTP").collect();
        assert_eq!(codes, vec![(404, "not found"), (500, "")]);
    }

    #[test]
    fn absent_tag_yields_nothing() {
        let d = docs("HTTP", &["404 not found"]);
        assert_eq!(coded_entries(&d, "HTTPWarning").count(), 0);
    }

    #[test]
    fn text_keys_keep_blank_descriptions() {
        let d = docs("ResponseHeader", &["X-Rate-Limit limit info", "ETag", "   "]);
        let headers: Vec<_> = named_entries(&d, "ResponseHeader").collect();
        assert_eq!(headers, vec![("X-Rate-Limit", "limit info"), ("ETag", "")]);
    }

    proptest! {
        #[test]
        fn key_never_contains_whitespace(line in "[ a-zA-Z0-9\t-]{0,40}") {
            let (key, description) = split_line(&line);
            prop_assert!(!key.contains(char::is_whitespace));
            prop_assert_eq!(description, description.trim());
        }

        #[test]
        fn numeric_round_trip(code in 100u16..600, text in "[a-z ]{0,20}") {
            let line = format!("{code} {text}");
            let d = docs("HTTP", &[line.as_str()]);
            let parsed: Vec<_> = coded_entries(&d, "HTTP").collect();
            prop_assert_eq!(parsed, vec![(code, text.trim())]);
        }
    }
}
