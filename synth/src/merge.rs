//! Metadata merging across the four contribution channels.
//!
//! A piece of handler metadata (status codes, warnings, response headers,
//! request headers) may be declared by a structured tag on the handler, by
//! structured tags on its ancestor scopes, by the handler's documentation
//! tags, or by the ancestors' documentation tags. Each channel is optional;
//! contributions are concatenated in that fixed order.

use std::collections::BTreeMap;

use apisurface_model::{Declaration, DeclarationModel, Tag, TypeRef};

use crate::config::Vocabulary;
use crate::descriptor::ResponseCode;
use crate::doctag::{coded_entries, named_entries};

/// Contributions of one kind of metadata, per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributions<T> {
    /// From structured tags on the declaration itself.
    pub own_structured: Vec<T>,
    /// From structured tags on the ancestor scopes, in ancestor order.
    pub inherited_structured: Vec<T>,
    /// From the declaration's documentation tags.
    pub own_documented: Vec<T>,
    /// From the ancestors' documentation tags, in ancestor order.
    pub inherited_documented: Vec<T>,
}

impl<T> Default for Contributions<T> {
    fn default() -> Self {
        Self {
            own_structured: Vec::new(),
            inherited_structured: Vec::new(),
            own_documented: Vec::new(),
            inherited_documented: Vec::new(),
        }
    }
}

impl<T> Contributions<T> {
    /// Collects contributions from `own` and `ancestors` with one extractor
    /// per channel family.
    pub fn collect<S, D>(
        own: &Declaration,
        ancestors: &[&Declaration],
        structured: S,
        documented: D,
    ) -> Self
    where
        S: Fn(&Declaration) -> Vec<T>,
        D: Fn(&Declaration) -> Vec<T>,
    {
        Self {
            own_structured: structured(own),
            inherited_structured: ancestors.iter().flat_map(|&a| structured(a)).collect(),
            own_documented: documented(own),
            inherited_documented: ancestors.iter().flat_map(|&a| documented(a)).collect(),
        }
    }

    /// All contributions in channel order. Nothing is de-duplicated.
    #[must_use]
    pub fn into_ordered(self) -> Vec<T> {
        let mut all = self.own_structured;
        all.extend(self.inherited_structured);
        all.extend(self.own_documented);
        all.extend(self.inherited_documented);
        all
    }

    /// All contributions with the documentation channels ahead of the
    /// structured ones: own doc, inherited doc, own structured, inherited
    /// structured.
    #[must_use]
    pub fn into_documented_first(self) -> Vec<T> {
        let mut all = self.own_documented;
        all.extend(self.inherited_documented);
        all.extend(self.own_structured);
        all.extend(self.inherited_structured);
        all
    }
}

/// Folds name/description pairs into a mapping in channel order; a later
/// contribution for the same name replaces the earlier description.
#[must_use]
pub fn merge_headers(contributions: Contributions<(String, String)>) -> BTreeMap<String, String> {
    contributions.into_ordered().into_iter().collect()
}

/// Reads the metadata channels of declarations with one vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct MetadataMerger<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> MetadataMerger<'a> {
    /// Creates a merger for `vocabulary`.
    #[must_use]
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Possible status codes.
    #[must_use]
    pub fn status_codes(
        &self,
        model: &DeclarationModel,
        own: &Declaration,
        ancestors: &[&Declaration],
    ) -> Contributions<ResponseCode> {
        let tag = &self.vocabulary.metadata.status_codes;
        let doc = &self.vocabulary.docs.status;
        Contributions::collect(
            own,
            ancestors,
            |d| {
                d.tags
                    .get(tag)
                    .iter()
                    .flat_map(|t| t.tags("value"))
                    .filter_map(|code| self.structured_code(model, code, true))
                    .collect()
            },
            |d| documented_codes(d, doc),
        )
    }

    /// Possible warning codes. Structured warnings carry only a code and a
    /// condition.
    #[must_use]
    pub fn warnings(
        &self,
        model: &DeclarationModel,
        own: &Declaration,
        ancestors: &[&Declaration],
    ) -> Contributions<ResponseCode> {
        let tag = &self.vocabulary.metadata.warnings;
        let doc = &self.vocabulary.docs.warning;
        Contributions::collect(
            own,
            ancestors,
            |d| {
                d.tags
                    .get(tag)
                    .iter()
                    .flat_map(|t| t.tags("value"))
                    .filter_map(|code| self.structured_code(model, code, false))
                    .collect()
            },
            |d| documented_codes(d, doc),
        )
    }

    /// Expected response headers as name/description pairs.
    #[must_use]
    pub fn response_headers(
        &self,
        own: &Declaration,
        ancestors: &[&Declaration],
    ) -> Contributions<(String, String)> {
        self.header_pairs(
            own,
            ancestors,
            &self.vocabulary.metadata.response_headers,
            &self.vocabulary.docs.response_header,
        )
    }

    /// Explicitly documented request headers as name/description pairs.
    /// Callers read these with [`Contributions::into_documented_first`].
    #[must_use]
    pub fn request_headers(
        &self,
        own: &Declaration,
        ancestors: &[&Declaration],
    ) -> Contributions<(String, String)> {
        self.header_pairs(
            own,
            ancestors,
            &self.vocabulary.metadata.request_headers,
            &self.vocabulary.docs.request_header,
        )
    }

    fn header_pairs(
        &self,
        own: &Declaration,
        ancestors: &[&Declaration],
        tag: &str,
        doc: &str,
    ) -> Contributions<(String, String)> {
        Contributions::collect(
            own,
            ancestors,
            |d| {
                d.tags
                    .get(tag)
                    .iter()
                    .flat_map(|t| header_tags(t, "value"))
                    .collect()
            },
            |d| {
                named_entries(&d.docs, doc)
                    .map(|(name, description)| (name.to_owned(), description.to_owned()))
                    .collect()
            },
        )
    }

    /// Converts one nested response-code tag. Codes outside the `u16` range
    /// are dropped.
    fn structured_code(
        &self,
        model: &DeclarationModel,
        tag: &Tag,
        with_extras: bool,
    ) -> Option<ResponseCode> {
        let code = u16::try_from(tag.int("code")?).ok()?;
        let mut rc = ResponseCode::new(code, tag.str("condition").unwrap_or_default());
        if with_extras {
            rc.additional_headers = header_tags(tag, "additionalHeaders").collect();
            rc.type_ref = tag
                .type_ref("type")
                .filter(|ty| !self.is_hint_none(ty))
                .map(|ty| resolve_declared(model, ty));
        }
        Some(rc)
    }

    fn is_hint_none(&self, ty: &TypeRef) -> bool {
        ty.qualified_name() == Some(self.vocabulary.types.type_hint_none.as_str())
    }
}

/// Codes from a code-keyed documentation tag.
fn documented_codes(decl: &Declaration, tag: &str) -> Vec<ResponseCode> {
    coded_entries(&decl.docs, tag)
        .map(|(code, condition)| ResponseCode::new(code, condition))
        .collect()
}

/// `(name, description)` pairs of the nested header tags under `element`.
fn header_tags<'t>(tag: &'t Tag, element: &str) -> impl Iterator<Item = (String, String)> + 't {
    tag.tags(element).filter_map(|header| {
        let name = header.str("name").filter(|n| !n.is_empty())?;
        Some((
            name.to_owned(),
            header.str("description").unwrap_or_default().to_owned(),
        ))
    })
}

/// A type literal from a tag payload, re-pointed at the model's declaration
/// when the model knows it so generic arity is preserved.
fn resolve_declared(model: &DeclarationModel, ty: &TypeRef) -> TypeRef {
    match ty {
        TypeRef::Declared { name, args } if args.is_empty() => model
            .find_type(name)
            .map_or_else(|| ty.clone(), |(_, decl)| decl.declared_type.clone()),
        _ => ty.clone(),
    }
}
