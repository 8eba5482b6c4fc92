//! Classification of handler parameters into logical request parameters.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use apisurface_model::{DeclId, Declaration, DeclarationModel, TypeRef, TypeVariableContext};
use regex::Regex;

use crate::accessor::AccessorFilter;
use crate::config::{DocTagNames, Vocabulary, WebTags};
use crate::descriptor::{ParameterKind, RequestParameter};
use crate::doctag::named_entries;

/// Matches one `{placeholder}` of a route template.
fn placeholder_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{([^}/]+)\}").ok())
        .as_ref()
}

/// The placeholder names of a handler's route templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    placeholders: BTreeSet<String>,
}

impl Route {
    /// Scans templates for `{name}` and `{name:pattern}` placeholders.
    pub fn from_templates<'t>(templates: impl IntoIterator<Item = &'t str>) -> Self {
        let mut placeholders = BTreeSet::new();
        if let Some(pattern) = placeholder_pattern() {
            for template in templates {
                for capture in pattern.captures_iter(template) {
                    let inner = capture.get(1).map_or("", |m| m.as_str());
                    let name = inner.split(':').next().unwrap_or_default().trim();
                    if !name.is_empty() {
                        placeholders.insert(name.to_owned());
                    }
                }
            }
        }
        Self { placeholders }
    }

    /// The route of a handler: the `value` and `path` elements of every
    /// route mapping tag on the handler and its ancestors.
    #[must_use]
    pub fn of(handler: &Declaration, ancestors: &[&Declaration], web: &WebTags) -> Self {
        let mappings = std::iter::once(handler)
            .chain(ancestors.iter().copied())
            .flat_map(|d| d.tags.get(&web.request_mapping));
        Self::from_templates(
            mappings.flat_map(|tag| tag.strings("value").chain(tag.strings("path"))),
        )
    }

    /// Returns true if the route has a placeholder called `name`.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders.contains(name)
    }

    /// Every placeholder name, sorted.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.placeholders.iter().map(String::as_str)
    }
}

/// What a parameter's classification may read from its enclosing handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerMetadata {
    /// The handler's route.
    pub route: Route,
    /// Parameter descriptions by declared parameter name.
    pub descriptions: BTreeMap<String, String>,
}

impl HandlerMetadata {
    /// Collects the route and parameter descriptions of `handler`.
    #[must_use]
    pub fn of(handler: &Declaration, ancestors: &[&Declaration], vocabulary: &Vocabulary) -> Self {
        Self {
            route: Route::of(handler, ancestors, &vocabulary.web),
            descriptions: parameter_docs(handler, &vocabulary.docs),
        }
    }

    /// The description of the parameter declared as `name`; empty when
    /// undocumented.
    #[must_use]
    pub fn description(&self, name: &str) -> String {
        self.descriptions.get(name).cloned().unwrap_or_default()
    }
}

/// Parameter descriptions from the `param` doc tag, overridden per name by
/// the `RSParam` doc tag.
#[must_use]
pub fn parameter_docs(handler: &Declaration, names: &DocTagNames) -> BTreeMap<String, String> {
    named_entries(&handler.docs, &names.param)
        .chain(named_entries(&handler.docs, &names.rs_param))
        .map(|(name, description)| (name.to_owned(), description.to_owned()))
        .collect()
}

/// Maps handler parameters to request parameters.
#[derive(Debug, Clone, Copy)]
pub struct ParameterClassifier<'a> {
    model: &'a DeclarationModel,
    vocabulary: &'a Vocabulary,
    filter: &'a AccessorFilter,
    context: &'a TypeVariableContext,
}

impl<'a> ParameterClassifier<'a> {
    /// Creates a classifier. `filter` selects the accessors a model
    /// attribute expands to; parameter types are resolved against
    /// `context`.
    #[must_use]
    pub fn new(
        model: &'a DeclarationModel,
        vocabulary: &'a Vocabulary,
        filter: &'a AccessorFilter,
        context: &'a TypeVariableContext,
    ) -> Self {
        Self {
            model,
            vocabulary,
            filter,
            context,
        }
    }

    /// Classifies one handler parameter. The entity parameter is not passed
    /// here.
    #[must_use]
    pub fn classify(
        &self,
        id: DeclId,
        parameter: &Declaration,
        handler: &HandlerMetadata,
    ) -> Vec<RequestParameter> {
        let web = &self.vocabulary.web;
        let description = handler.description(&parameter.name);
        let ty = self.context.resolve(&parameter.declared_type);
        let declared = |name: &str, kind| RequestParameter {
            name: name.to_owned(),
            kind,
            description: description.clone(),
            declaration: Some(id),
            type_ref: Some(ty.clone()),
        };

        let tagged = [
            (&web.request_param, ParameterKind::Query),
            (&web.path_variable, ParameterKind::Path),
            (&web.request_header, ParameterKind::Header),
            (&web.cookie_value, ParameterKind::Cookie),
            (&web.matrix_variable, ParameterKind::Matrix),
            (&web.request_part, ParameterKind::Form),
        ];
        for (tag_name, kind) in tagged {
            if let Some(tag) = parameter.tags.first(tag_name) {
                let name = ["value", "name"]
                    .into_iter()
                    .filter_map(|element| tag.str(element))
                    .find(|n| !n.is_empty())
                    .unwrap_or(&parameter.name);
                return vec![declared(name, kind)];
            }
        }

        if parameter.tags.contains(&web.model_attribute) {
            return self.expand_model_attribute(parameter, &ty, &description, id);
        }

        let is_context = self
            .vocabulary
            .types
            .context_types
            .iter()
            .any(|name| self.model.is_instance_of(&ty, name));
        let kind = if is_context {
            ParameterKind::Context
        } else if handler.route.has_placeholder(&parameter.name) {
            ParameterKind::Path
        } else {
            ParameterKind::Query
        };
        vec![declared(&parameter.name, kind)]
    }

    /// One query parameter per accepted accessor of the attribute's type, or
    /// the attribute itself when its type is not modelled.
    fn expand_model_attribute(
        &self,
        parameter: &Declaration,
        ty: &TypeRef,
        description: &str,
        id: DeclId,
    ) -> Vec<RequestParameter> {
        let Some((type_id, _)) = ty.qualified_name().and_then(|name| self.model.find_type(name))
        else {
            return vec![RequestParameter {
                name: parameter.name.clone(),
                kind: ParameterKind::Query,
                description: description.to_owned(),
                declaration: Some(id),
                type_ref: Some(ty.clone()),
            }];
        };
        self.model
            .members(type_id)
            .filter(|(_, member)| self.filter.accept(self.model, member))
            .map(|(member_id, member)| RequestParameter {
                name: member.name.clone(),
                kind: ParameterKind::Query,
                description: String::new(),
                declaration: Some(member_id),
                type_ref: Some(self.context.resolve(&member.declared_type)),
            })
            .collect()
    }
}
