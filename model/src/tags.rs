//! Structured metadata tags and free-text documentation tags.
//!
//! Both maps are precomputed when the declaration model is built, so the
//! engine reads tag payloads by name and never scans for them.

use std::collections::BTreeMap;

use crate::types::TypeRef;

/// A value of one element of a structured tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum TagValue {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A string literal.
    Str(String),
    /// A type literal.
    Type(TypeRef),
    /// A nested tag.
    Tag(Tag),
    /// An array of values.
    List(Vec<TagValue>),
}

/// One occurrence of a structured tag: its elements by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Tag {
    elements: BTreeMap<String, TagValue>,
}

impl Tag {
    /// A tag with no elements (a marker).
    #[must_use]
    pub fn marker() -> Self {
        Self::default()
    }

    /// Adds an element.
    #[must_use]
    pub fn with(mut self, element: impl Into<String>, value: TagValue) -> Self {
        self.elements.insert(element.into(), value);
        self
    }

    /// Adds a string element.
    #[must_use]
    pub fn with_str(self, element: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(element, TagValue::Str(value.into()))
    }

    /// Adds an integer element.
    #[must_use]
    pub fn with_int(self, element: impl Into<String>, value: i64) -> Self {
        self.with(element, TagValue::Int(value))
    }

    /// Adds a list of nested tags.
    #[must_use]
    pub fn with_tags(self, element: impl Into<String>, tags: Vec<Tag>) -> Self {
        self.with(element, TagValue::List(tags.into_iter().map(TagValue::Tag).collect()))
    }

    /// Returns the raw value of an element.
    #[must_use]
    pub fn get(&self, element: &str) -> Option<&TagValue> {
        self.elements.get(element)
    }

    /// Returns a string element.
    #[must_use]
    pub fn str(&self, element: &str) -> Option<&str> {
        match self.elements.get(element) {
            Some(TagValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns an integer element.
    #[must_use]
    pub fn int(&self, element: &str) -> Option<i64> {
        match self.elements.get(element) {
            Some(TagValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Returns a type element.
    #[must_use]
    pub fn type_ref(&self, element: &str) -> Option<&TypeRef> {
        match self.elements.get(element) {
            Some(TagValue::Type(ty)) => Some(ty),
            _ => None,
        }
    }

    /// Returns the nested tags of an element.
    ///
    /// A single nested tag is treated as a one-element array, the way a
    /// single value may stand in for an array in tag syntax.
    pub fn tags<'a>(&'a self, element: &str) -> impl Iterator<Item = &'a Tag> + 'a {
        let values: &'a [TagValue] = match self.elements.get(element) {
            Some(TagValue::List(values)) => values,
            Some(value @ TagValue::Tag(_)) => std::slice::from_ref(value),
            _ => &[],
        };
        values.iter().filter_map(|v| match v {
            TagValue::Tag(tag) => Some(tag),
            _ => None,
        })
    }

    /// Returns the strings of a string-or-array element.
    pub fn strings<'a>(&'a self, element: &str) -> impl Iterator<Item = &'a str> + 'a {
        let values: &'a [TagValue] = match self.elements.get(element) {
            Some(TagValue::List(values)) => values,
            Some(value @ TagValue::Str(_)) => std::slice::from_ref(value),
            _ => &[],
        };
        values.iter().filter_map(|v| match v {
            TagValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

/// Structured tags attached to a declaration, by qualified tag name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TagMap {
    entries: BTreeMap<String, Vec<Tag>>,
}

impl TagMap {
    /// Appends an occurrence of tag `name`.
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) {
        self.entries.entry(name.into()).or_default().push(tag);
    }

    /// Every occurrence of tag `name`, in declaration order.
    #[must_use]
    pub fn get(&self, name: &str) -> &[Tag] {
        self.entries.get(name).map_or(&[], Vec::as_slice)
    }

    /// The first occurrence of tag `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&Tag> {
        self.get(name).first()
    }

    /// Returns true if tag `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        !self.get(name).is_empty()
    }

    /// All tag names present.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Returns true if no tag is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names().next().is_none()
    }
}

/// Free-text documentation tag lines, by tag name (without the leading `@`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct DocTags {
    entries: BTreeMap<String, Vec<String>>,
}

impl DocTags {
    /// Appends a line to tag `name`.
    pub fn push(&mut self, name: impl Into<String>, line: impl Into<String>) {
        self.entries.entry(name.into()).or_default().push(line.into());
    }

    /// The lines of tag `name`, or `None` if the tag never appears.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// The lines of tag `name` joined by a newline.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|lines| lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_nested_tag_reads_as_list() {
        let inner = Tag::marker().with_int("code", 404);
        let outer = Tag::marker().with("value", TagValue::Tag(inner.clone()));
        let tags: Vec<_> = outer.tags("value").collect();
        assert_eq!(tags, vec![&inner]);
    }

    #[test]
    fn strings_accepts_scalar_or_array() {
        let scalar = Tag::marker().with_str("value", "/a");
        let array = Tag::marker().with(
            "value",
            TagValue::List(vec![TagValue::Str("/a".into()), TagValue::Str("/b".into())]),
        );
        assert_eq!(scalar.strings("value").collect::<Vec<_>>(), vec!["/a"]);
        assert_eq!(array.strings("value").collect::<Vec<_>>(), vec!["/a", "/b"]);
        assert_eq!(scalar.strings("path").count(), 0);
    }

    #[test]
    fn tag_map_keeps_occurrence_order() {
        let mut map = TagMap::default();
        map.insert("a.Repeat", Tag::marker().with_int("n", 1));
        map.insert("a.Repeat", Tag::marker().with_int("n", 2));
        let ns: Vec<_> = map.get("a.Repeat").iter().filter_map(|t| t.int("n")).collect();
        assert_eq!(ns, vec![1, 2]);
        assert!(map.get("a.Missing").is_empty());
    }

    #[test]
    fn absent_doc_tag_differs_from_empty() {
        let mut docs = DocTags::default();
        assert!(docs.get("HTTP").is_none());
        docs.push("HTTP", "404 gone");
        assert_eq!(docs.text("HTTP").as_deref(), Some("404 gone"));
    }
}
