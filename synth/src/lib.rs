//! The apisurface engine.
//!
//! `apisurface-synth` reads a frozen [`DeclarationModel`] and produces the
//! normalized description of an API surface: one
//! [`ResourceMethodDescriptor`] per request handler, and the schema types
//! grouped into [`NamespaceDescriptor`]s.
//!
//! # Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`accessor`] | Which members of a structural type are serialized |
//! | [`unwrap`] | Effective type of a handler's return value |
//! | [`doctag`] | `key description` splitting of documentation tag lines |
//! | [`merge`] | Four-channel merging of status codes, warnings and headers |
//! | [`params`] | Classification of handler parameters |
//! | [`resource`] | Descriptor synthesis per handler |
//! | [`namespace`] | Schema types grouped by namespace URI |
//!
//! # Entry Point
//!
//! ```
//! use apisurface_model::{Declaration, ModelBuilder, Tag, TypeRef};
//! use apisurface_synth::{AccessPolicy, HandlerScope, ResourceMethodSynthesizer, SynthesisConfig};
//! use apisurface_model::TypeVariableContext;
//!
//! let config = SynthesisConfig::with_policy(AccessPolicy::PublicMember);
//! let mut builder = ModelBuilder::new();
//! let find = builder.add(
//!     Declaration::method("find", TypeRef::named("demo.Widget"))
//!         .with_tag(&config.vocabulary.web.response_body, Tag::marker())
//!         .with_doc("HTTP", "404 no such widget"),
//! );
//! let model = builder.finish().expect("consistent model");
//!
//! let synthesizer = ResourceMethodSynthesizer::new(&model, &config).expect("policy is set");
//! let context = TypeVariableContext::new();
//! let scope = HandlerScope { handler: find, ancestors: &[], context: &context };
//! let descriptor = synthesizer.synthesize(&scope).expect("handler is a method");
//! assert_eq!(descriptor.status_codes()[0].code, 404);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod accessor;
pub mod config;
pub mod descriptor;
pub mod doctag;
pub mod error;
pub mod merge;
pub mod namespace;
pub mod params;
pub mod report;
pub mod resource;
pub mod unwrap;

pub use accessor::{AccessPolicy, AccessorFilter};
pub use config::{SynthesisConfig, Vocabulary};
pub use descriptor::{
    EffectiveType, ParameterKind, Representation, RequestParameter, ResourceMethodDescriptor,
    ResponseCode,
};
pub use error::{ConfigError, RunError, SynthesisError};
pub use namespace::{
    AcceptAll, DataType, FacetFilter, NamespaceAssembler, NamespaceDescriptor,
};
pub use report::{Diagnostic, SynthesisReport};
pub use resource::{HandlerScope, ResourceMethodSynthesizer};

use apisurface_model::{DeclarationModel, HandlerEntry};

/// Everything one run produces.
#[derive(Debug)]
pub struct ApiSurface {
    /// Descriptors and per-handler failures, in handler order.
    pub report: SynthesisReport,
    /// Schema types by namespace, ordered by URI.
    pub namespaces: Vec<NamespaceDescriptor>,
}

/// Synthesizes every handler and assembles every schema type of `model`.
///
/// A handler that fails is recorded in the report; the rest still run.
///
/// # Errors
///
/// Returns [`RunError::Config`] if `config` has no access policy and
/// [`RunError::Model`] if a schema type cannot be read back from the model.
pub fn run(
    model: &DeclarationModel,
    handlers: &[HandlerEntry],
    config: &SynthesisConfig,
) -> Result<ApiSurface, RunError> {
    let synthesizer = ResourceMethodSynthesizer::new(model, config)?;
    let report = synthesizer.synthesize_all(handlers.iter().map(HandlerScope::from_entry));
    let namespaces = NamespaceAssembler::new(model, synthesizer.filter()).assemble_schema()?;
    tracing::info!(
        handlers = handlers.len(),
        failures = report.failure_count(),
        namespaces = namespaces.len(),
        "synthesis finished"
    );
    Ok(ApiSurface { report, namespaces })
}
