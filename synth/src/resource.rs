//! Resource method synthesis: one immutable descriptor per handler method.
//!
//! The synthesizer reads a handler, its caller-supplied ancestor chain and
//! its type-variable context, and runs the parameter classifier, the type
//! unwrapper and the metadata merger over them. It fails only when the
//! model cannot answer a lookup it needs.

use apisurface_model::{
    DeclId, DeclarationModel, HandlerEntry, ModelError, Tag, TypeVariableContext,
};
use tracing::{debug, warn};

use crate::accessor::AccessorFilter;
use crate::config::{SynthesisConfig, Vocabulary};
use crate::descriptor::{
    ParameterKind, RequestParameter, ResourceMethodBuilder, ResourceMethodDescriptor,
    ResponseCode,
};
use crate::error::{ConfigError, SynthesisError};
use crate::merge::{merge_headers, MetadataMerger};
use crate::params::{HandlerMetadata, ParameterClassifier};
use crate::report::SynthesisReport;
use crate::unwrap::{TypeUnwrapper, UnwrapRequest};

/// Status a response-status tag stands for when it names none.
const DEFAULT_STATUS: i64 = 500;

/// A handler method to synthesize, with the scopes it inherits metadata
/// from and the bindings of its generic scope.
#[derive(Debug, Clone, Copy)]
pub struct HandlerScope<'s> {
    /// The handler method.
    pub handler: DeclId,
    /// Enclosing advice/ancestor scopes, in ancestor order.
    pub ancestors: &'s [DeclId],
    /// Type-variable bindings in force for the handler.
    pub context: &'s TypeVariableContext,
}

impl<'s> HandlerScope<'s> {
    /// The scope described by a model document's handler entry.
    #[must_use]
    pub fn from_entry(entry: &'s HandlerEntry) -> Self {
        Self {
            handler: entry.method,
            ancestors: &entry.ancestors,
            context: &entry.type_variables,
        }
    }
}

/// Builds resource method descriptors over one frozen model and
/// configuration.
#[derive(Debug, Clone)]
pub struct ResourceMethodSynthesizer<'a> {
    model: &'a DeclarationModel,
    vocabulary: &'a Vocabulary,
    filter: AccessorFilter,
}

impl<'a> ResourceMethodSynthesizer<'a> {
    /// Creates a synthesizer for a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAccessPolicy`] if `config` carries no
    /// access policy.
    pub fn new(
        model: &'a DeclarationModel,
        config: &'a SynthesisConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            model,
            vocabulary: &config.vocabulary,
            filter: AccessorFilter::from_config(config)?,
        })
    }

    /// The accessor filter of the run.
    #[must_use]
    pub fn filter(&self) -> &AccessorFilter {
        &self.filter
    }

    /// Synthesizes the descriptor of one handler.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Model`] if the handler, an ancestor or a
    /// parameter id is not in the model, and
    /// [`SynthesisError::NotAHandler`] if the handler is not a method.
    pub fn synthesize(
        &self,
        scope: &HandlerScope<'_>,
    ) -> Result<ResourceMethodDescriptor, SynthesisError> {
        let handler = self
            .model
            .decl(scope.handler)
            .map_err(|source| model_error(format!("declaration {}", scope.handler), source))?;
        let label = handler.label();
        let method = handler
            .as_method()
            .ok_or_else(|| SynthesisError::NotAHandler {
                handler: label.clone(),
            })?;
        let ancestors = scope
            .ancestors
            .iter()
            .map(|id| self.model.decl(*id))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| model_error(label.clone(), source))?;

        let web = &self.vocabulary.web;
        let metadata = HandlerMetadata::of(handler, &ancestors, self.vocabulary);
        let classifier =
            ParameterClassifier::new(self.model, self.vocabulary, &self.filter, scope.context);
        let mut builder = ResourceMethodBuilder::new(scope.handler, handler.name.as_str());

        for &id in &method.parameters {
            let parameter = self
                .model
                .decl(id)
                .map_err(|source| model_error(label.clone(), source))?;
            if !parameter.tags.contains(&web.request_body) {
                for classified in classifier.classify(id, parameter, &metadata) {
                    builder.parameter(classified);
                }
            } else if builder.has_entity() {
                debug!(
                    handler = %label,
                    parameter = %parameter.name,
                    "ignoring second body parameter"
                );
            } else {
                builder.entity(RequestParameter {
                    name: parameter.name.clone(),
                    kind: ParameterKind::Entity,
                    description: metadata.description(&parameter.name),
                    declaration: Some(id),
                    type_ref: Some(scope.context.resolve(&parameter.declared_type)),
                });
            }
        }

        let returns_body = handler.tags.contains(&web.response_body)
            || ancestors.iter().any(|a| {
                a.tags.contains(&web.response_body) || a.tags.contains(&web.rest_controller)
            });
        let docs = &self.vocabulary.docs;
        let return_doc = handler.docs.text(&docs.return_doc);
        let unwrapped = TypeUnwrapper::new(&self.vocabulary.types).resolve(
            self.model,
            &UnwrapRequest {
                owner: &label,
                declared: &handler.declared_type,
                type_hint: handler.tags.first(&self.vocabulary.metadata.type_hint),
                returns_body,
                wrapped: handler
                    .docs
                    .get(&docs.return_wrapped)
                    .and_then(<[String]>::first)
                    .map(String::as_str),
                context: scope.context,
                doc: return_doc.as_deref(),
            },
        );
        builder.representation(unwrapped.representation);
        builder.diagnostics(unwrapped.diagnostics);

        let merger = MetadataMerger::new(self.vocabulary);
        for (name, description) in merger
            .request_headers(handler, &ancestors)
            .into_documented_first()
        {
            builder.parameter(RequestParameter::explicit(
                name,
                ParameterKind::Header,
                description,
            ));
        }

        let mut status_codes = merger.status_codes(self.model, handler, &ancestors);
        if let Some(explicit) = handler
            .tags
            .first(&web.response_status)
            .and_then(explicit_status)
        {
            status_codes.own_structured.push(explicit);
        }
        builder.status_codes(status_codes.into_ordered());
        builder.warnings(merger.warnings(self.model, handler, &ancestors).into_ordered());
        builder.response_headers(merge_headers(merger.response_headers(handler, &ancestors)));

        let descriptor = builder.finish();
        debug!(
            handler = %label,
            parameters = descriptor.request_parameters().len(),
            status_codes = descriptor.status_codes().len(),
            void = descriptor.representation().is_void(),
            "synthesized resource method"
        );
        Ok(descriptor)
    }

    /// Synthesizes every scope. A failing handler is recorded and does not
    /// stop the others.
    pub fn synthesize_all<'s, I>(&self, scopes: I) -> SynthesisReport
    where
        I: IntoIterator<Item = HandlerScope<'s>>,
    {
        let mut report = SynthesisReport::new();
        for scope in scopes {
            match self.synthesize(&scope) {
                Ok(descriptor) => report.push(descriptor),
                Err(e) => {
                    warn!(handler = e.handler(), error = %e, "handler skipped");
                    report.push_failure(e);
                }
            }
        }
        report
    }
}

fn model_error(handler: String, source: ModelError) -> SynthesisError {
    SynthesisError::Model { handler, source }
}

/// The response code of a response-status tag. `value` wins unless it is
/// absent or the server-error default, in which case `code` is read.
fn explicit_status(tag: &Tag) -> Option<ResponseCode> {
    let code = match tag.int("value") {
        Some(value) if value != DEFAULT_STATUS => value,
        _ => tag.int("code").unwrap_or(DEFAULT_STATUS),
    };
    let code = u16::try_from(code).ok()?;
    Some(ResponseCode::new(code, tag.str("reason").unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::AccessPolicy;
    use crate::descriptor::Representation;
    use apisurface_model::{Declaration, ModelBuilder, TypeRef};

    struct Fixture {
        model: DeclarationModel,
        controller: DeclId,
        handler: DeclId,
    }

    fn fixture(
        config: &SynthesisConfig,
        handler: Declaration,
        params: Vec<Declaration>,
    ) -> Fixture {
        let web = &config.vocabulary.web;
        let mut b = ModelBuilder::new();
        b.add(Declaration::type_decl("demo.Widget"));
        let controller = b.add(
            Declaration::type_decl("demo.WidgetController")
                .with_tag(&web.rest_controller, Tag::marker())
                .with_tag(
                    &web.request_mapping,
                    Tag::marker().with_str("value", "/widgets/{id}"),
                ),
        );
        let handler = b.add_member(controller, handler);
        for param in params {
            b.add_parameter(handler, param);
        }
        Fixture {
            model: b.finish().unwrap(),
            controller,
            handler,
        }
    }

    fn synthesize(config: &SynthesisConfig, f: &Fixture) -> ResourceMethodDescriptor {
        let ancestors = [f.controller];
        let context = TypeVariableContext::new();
        let scope = HandlerScope {
            handler: f.handler,
            ancestors: &ancestors,
            context: &context,
        };
        ResourceMethodSynthesizer::new(&f.model, config)
            .unwrap()
            .synthesize(&scope)
            .unwrap()
    }

    #[test]
    fn first_body_parameter_is_the_entity() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let body = &config.vocabulary.web.request_body;
        let f = fixture(
            &config,
            Declaration::method("update", TypeRef::Void),
            vec![
                Declaration::parameter("id", TypeRef::primitive("long")),
                Declaration::parameter("widget", TypeRef::named("demo.Widget"))
                    .with_tag(body, Tag::marker()),
                Declaration::parameter("other", TypeRef::named("demo.Widget"))
                    .with_tag(body, Tag::marker()),
            ],
        );
        let d = synthesize(&config, &f);
        let entity = d.entity_parameter().unwrap();
        assert_eq!(entity.name, "widget");
        assert_eq!(entity.kind, ParameterKind::Entity);
        let names: Vec<_> = d
            .request_parameters()
            .iter()
            .map(|p| (p.name.as_str(), p.kind))
            .collect();
        assert_eq!(names, vec![("id", ParameterKind::Path)]);
        assert_eq!(d.representation(), &Representation::Void);
    }

    #[test]
    fn rest_controller_ancestor_exposes_the_body() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let f = fixture(
            &config,
            Declaration::method("find", TypeRef::named("demo.Widget"))
                .with_doc("return", "the widget"),
            vec![],
        );
        let d = synthesize(&config, &f);
        let ty = d.representation().effective_type().unwrap();
        assert_eq!(ty.ty(), &TypeRef::named("demo.Widget"));
        assert_eq!(ty.doc(), Some("the widget"));
    }

    #[test]
    fn explicit_status_follows_own_structured_codes() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let v = &config.vocabulary;
        let handler = Declaration::method("create", TypeRef::Void)
            .with_tag(
                &v.metadata.status_codes,
                Tag::marker().with_tags("value", vec![Tag::marker().with_int("code", 409)]),
            )
            .with_tag(
                &v.web.response_status,
                Tag::marker()
                    .with_int("value", 500)
                    .with_int("code", 201)
                    .with_str("reason", "created"),
            )
            .with_doc("HTTP", "400 bad input");
        let f = fixture(&config, handler, vec![]);
        let d = synthesize(&config, &f);
        let codes: Vec<_> = d.status_codes().iter().map(|c| c.code).collect();
        assert_eq!(codes, vec![409, 201, 400]);
        assert_eq!(d.status_codes()[1].condition.as_deref(), Some("created"));
    }

    #[test]
    fn response_status_defaults() {
        let bare = Tag::marker();
        assert_eq!(explicit_status(&bare).map(|c| c.code), Some(500));
        let value = Tag::marker().with_int("value", 404);
        assert_eq!(explicit_status(&value).map(|c| c.code), Some(404));
        let out_of_range = Tag::marker().with_int("value", 70_000);
        assert_eq!(explicit_status(&out_of_range), None);
    }

    #[test]
    fn request_headers_become_header_parameters() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let handler = Declaration::method("find", TypeRef::Void)
            .with_doc("RequestHeader", "X-Trace trace id")
            .with_doc("RequestHeader", "X-Trace duplicate");
        let f = fixture(&config, handler, vec![]);
        let d = synthesize(&config, &f);
        let headers: Vec<_> = d
            .request_parameters()
            .iter()
            .map(|p| (p.name.as_str(), p.kind, p.description.as_str(), p.declaration))
            .collect();
        assert_eq!(headers, vec![("X-Trace", ParameterKind::Header, "trace id", None)]);
    }

    #[test]
    fn documented_request_header_wins_over_structured() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let handler = Declaration::method("find", TypeRef::Void)
            .with_tag(
                &config.vocabulary.metadata.request_headers,
                Tag::marker().with_tags(
                    "value",
                    vec![Tag::marker()
                        .with_str("name", "X-Trace")
                        .with_str("description", "structured")],
                ),
            )
            .with_doc("RequestHeader", "X-Trace documented");
        let f = fixture(&config, handler, vec![]);
        let d = synthesize(&config, &f);
        assert_eq!(d.request_parameters().len(), 1);
        assert_eq!(d.request_parameters()[0].description, "documented");
    }

    #[test]
    fn parameter_types_resolve_against_the_handler_context() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let body = &config.vocabulary.web.request_body;
        let f = fixture(
            &config,
            Declaration::method("update", TypeRef::Void),
            vec![
                Declaration::parameter("id", TypeRef::variable("K")),
                Declaration::parameter("widget", TypeRef::variable("T"))
                    .with_tag(body, Tag::marker()),
            ],
        );
        let ancestors = [f.controller];
        let context = TypeVariableContext::new()
            .bind("K", TypeRef::primitive("long"))
            .bind("T", TypeRef::named("demo.Widget"));
        let scope = HandlerScope {
            handler: f.handler,
            ancestors: &ancestors,
            context: &context,
        };
        let d = ResourceMethodSynthesizer::new(&f.model, &config)
            .unwrap()
            .synthesize(&scope)
            .unwrap();
        assert_eq!(
            d.request_parameters()[0].type_ref,
            Some(TypeRef::primitive("long"))
        );
        assert_eq!(
            d.entity_parameter().unwrap().type_ref,
            Some(TypeRef::named("demo.Widget"))
        );
    }

    #[test]
    fn synthesis_is_idempotent() {
        let config = SynthesisConfig::with_policy(AccessPolicy::PublicMember);
        let handler = Declaration::method("find", TypeRef::named("demo.Widget"))
            .with_doc("HTTP", "404 missing")
            .with_doc("ResponseHeader", "ETag version");
        let f = fixture(
            &config,
            handler,
            vec![Declaration::parameter("id", TypeRef::primitive("long"))],
        );
        assert_eq!(synthesize(&config, &f), synthesize(&config, &f));
    }

    #[test]
    fn failures_name_the_handler_and_do_not_stop_the_batch() {
        let config = SynthesisConfig::with_policy(AccessPolicy::Field);
        let f = fixture(&config, Declaration::method("find", TypeRef::Void), vec![]);
        let context = TypeVariableContext::new();
        let dangling = [DeclId(99)];
        let scopes = [
            HandlerScope {
                handler: DeclId(0),
                ancestors: &[],
                context: &context,
            },
            HandlerScope {
                handler: f.handler,
                ancestors: &dangling,
                context: &context,
            },
            HandlerScope {
                handler: f.handler,
                ancestors: &[],
                context: &context,
            },
        ];
        let report = ResourceMethodSynthesizer::new(&f.model, &config)
            .unwrap()
            .synthesize_all(scopes);
        assert_eq!(report.descriptors.len(), 1);
        assert_eq!(report.failure_count(), 2);
        assert!(matches!(report.failures[0], SynthesisError::NotAHandler { .. }));
        assert_eq!(report.failures[1].handler(), "method find");
    }

    #[test]
    fn missing_policy_is_a_config_error() {
        let model = DeclarationModel::default();
        let config = SynthesisConfig::default();
        assert!(matches!(
            ResourceMethodSynthesizer::new(&model, &config),
            Err(ConfigError::MissingAccessPolicy)
        ));
    }
}
