//! The normalized output model: resource method descriptors and the values
//! they are made of.
//!
//! Descriptors are immutable once built. [`ResourceMethodBuilder`] is the
//! per-handler accumulator the synthesizer fills and then finalizes.

use std::collections::BTreeMap;
use std::fmt;

use apisurface_model::{DeclId, TypeRef};
use serde::Serialize;

use crate::report::Diagnostic;

/// The transported type after unwrapping, with the documentation captured
/// for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveType {
    ty: TypeRef,
    doc: Option<String>,
}

impl EffectiveType {
    /// Creates an effective type.
    #[must_use]
    pub fn new(ty: TypeRef, doc: Option<String>) -> Self {
        Self { ty, doc }
    }

    /// The transported type.
    #[must_use]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// The preserved documentation.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// The output of a handler: nothing, or a body of an effective type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Representation {
    /// The handler produces no value.
    Void,
    /// The handler produces a body.
    Body(EffectiveType),
}

impl Representation {
    /// The effective type of a body.
    #[must_use]
    pub fn effective_type(&self) -> Option<&EffectiveType> {
        match self {
            Representation::Void => None,
            Representation::Body(ty) => Some(ty),
        }
    }

    /// Returns true for [`Representation::Void`].
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Representation::Void)
    }
}

/// Where a request parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterKind {
    /// A request header.
    Header,
    /// A query string parameter.
    Query,
    /// A path segment.
    Path,
    /// The request entity (body).
    Entity,
    /// A matrix parameter.
    Matrix,
    /// A cookie.
    Cookie,
    /// A form field or multipart part.
    Form,
    /// Supplied by the framework, not by the client.
    Context,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::Header => "header",
            ParameterKind::Query => "query",
            ParameterKind::Path => "path",
            ParameterKind::Entity => "entity",
            ParameterKind::Matrix => "matrix",
            ParameterKind::Cookie => "cookie",
            ParameterKind::Form => "form",
            ParameterKind::Context => "context",
        };
        f.write_str(name)
    }
}

/// One logical request parameter of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestParameter {
    /// Name on the wire.
    pub name: String,
    /// Where it is carried.
    pub kind: ParameterKind,
    /// Description; empty when undocumented.
    pub description: String,
    /// The declaration it comes from; `None` for parameters documented
    /// explicitly rather than declared.
    pub declaration: Option<DeclId>,
    /// Declared type, when backed by a declaration.
    pub type_ref: Option<TypeRef>,
}

impl RequestParameter {
    /// A parameter synthesized from documentation or metadata tags.
    pub fn explicit(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            declaration: None,
            type_ref: None,
        }
    }
}

/// A possible response status or warning code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseCode {
    /// Numeric code.
    pub code: u16,
    /// Condition under which the code is returned.
    pub condition: Option<String>,
    /// Type of the body returned with the code.
    pub type_ref: Option<TypeRef>,
    /// Headers returned with the code, by name.
    pub additional_headers: BTreeMap<String, String>,
}

impl ResponseCode {
    /// A code with an optional condition; an empty condition is absent.
    pub fn new(code: u16, condition: impl Into<String>) -> Self {
        let condition = condition.into();
        Self {
            code,
            condition: (!condition.is_empty()).then_some(condition),
            type_ref: None,
            additional_headers: BTreeMap::new(),
        }
    }
}

/// The synthesized description of one handler method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceMethodDescriptor {
    handler: DeclId,
    name: String,
    entity_parameter: Option<RequestParameter>,
    request_parameters: Vec<RequestParameter>,
    status_codes: Vec<ResponseCode>,
    warnings: Vec<ResponseCode>,
    response_headers: BTreeMap<String, String>,
    representation: Representation,
    diagnostics: Vec<Diagnostic>,
}

impl ResourceMethodDescriptor {
    /// The handler method.
    #[must_use]
    pub fn handler(&self) -> DeclId {
        self.handler
    }

    /// The handler's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entity (body) parameter.
    #[must_use]
    pub fn entity_parameter(&self) -> Option<&RequestParameter> {
        self.entity_parameter.as_ref()
    }

    /// Request parameters, ordered by kind then name.
    #[must_use]
    pub fn request_parameters(&self) -> &[RequestParameter] {
        &self.request_parameters
    }

    /// Possible status codes, in contribution order.
    #[must_use]
    pub fn status_codes(&self) -> &[ResponseCode] {
        &self.status_codes
    }

    /// Possible warnings, in contribution order.
    #[must_use]
    pub fn warnings(&self) -> &[ResponseCode] {
        &self.warnings
    }

    /// Expected response headers, by name.
    #[must_use]
    pub fn response_headers(&self) -> &BTreeMap<String, String> {
        &self.response_headers
    }

    /// The output representation.
    #[must_use]
    pub fn representation(&self) -> &Representation {
        &self.representation
    }

    /// Warning-level notes recorded while synthesizing.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Accumulates the parts of one descriptor.
#[derive(Debug)]
pub struct ResourceMethodBuilder {
    handler: DeclId,
    name: String,
    entity_parameter: Option<RequestParameter>,
    request_parameters: BTreeMap<(ParameterKind, String), RequestParameter>,
    status_codes: Vec<ResponseCode>,
    warnings: Vec<ResponseCode>,
    response_headers: BTreeMap<String, String>,
    representation: Representation,
    diagnostics: Vec<Diagnostic>,
}

impl ResourceMethodBuilder {
    /// Starts a descriptor for `handler`.
    pub fn new(handler: DeclId, name: impl Into<String>) -> Self {
        Self {
            handler,
            name: name.into(),
            entity_parameter: None,
            request_parameters: BTreeMap::new(),
            status_codes: Vec::new(),
            warnings: Vec::new(),
            response_headers: BTreeMap::new(),
            representation: Representation::Void,
            diagnostics: Vec::new(),
        }
    }

    /// Returns true once an entity parameter is set.
    #[must_use]
    pub fn has_entity(&self) -> bool {
        self.entity_parameter.is_some()
    }

    /// Sets the entity parameter.
    pub fn entity(&mut self, parameter: RequestParameter) {
        self.entity_parameter = Some(parameter);
    }

    /// Adds a request parameter unless one with the same identity exists.
    pub fn parameter(&mut self, parameter: RequestParameter) {
        self.request_parameters
            .entry((parameter.kind, parameter.name.clone()))
            .or_insert(parameter);
    }

    /// Sets the status codes.
    pub fn status_codes(&mut self, codes: Vec<ResponseCode>) {
        self.status_codes = codes;
    }

    /// Sets the warnings.
    pub fn warnings(&mut self, codes: Vec<ResponseCode>) {
        self.warnings = codes;
    }

    /// Sets the response headers.
    pub fn response_headers(&mut self, headers: BTreeMap<String, String>) {
        self.response_headers = headers;
    }

    /// Sets the representation.
    pub fn representation(&mut self, representation: Representation) {
        self.representation = representation;
    }

    /// Records diagnostics.
    pub fn diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Finalizes the descriptor.
    #[must_use]
    pub fn finish(self) -> ResourceMethodDescriptor {
        ResourceMethodDescriptor {
            handler: self.handler,
            name: self.name,
            entity_parameter: self.entity_parameter,
            request_parameters: self.request_parameters.into_values().collect(),
            status_codes: self.status_codes,
            warnings: self.warnings,
            response_headers: self.response_headers,
            representation: self.representation,
            diagnostics: self.diagnostics,
        }
    }
}
