//! Resolution of a handler's declared return type to the type it actually
//! transports.
//!
//! Asynchronous wrappers and typed response envelopes are peeled off,
//! explicit overrides (a type hint tag, a `returnWrapped` doc tag) are
//! applied, and type variables are resolved against the handler's context.
//! Every irregularity degrades to [`TypeRef::Opaque`]; nothing here fails.

use apisurface_model::{DeclarationModel, Tag, TypeRef, TypeVariableContext};
use tracing::warn;

use crate::config::WellKnownTypes;
use crate::descriptor::{EffectiveType, Representation};
use crate::report::Diagnostic;

/// Inputs for resolving one return type.
#[derive(Debug, Clone, Copy)]
pub struct UnwrapRequest<'a> {
    /// Label of the declaration the type belongs to, for diagnostics.
    pub owner: &'a str,
    /// The declared return type.
    pub declared: &'a TypeRef,
    /// The type hint tag, if the declaration carries one.
    pub type_hint: Option<&'a Tag>,
    /// Whether the declaration produces a raw response body.
    pub returns_body: bool,
    /// Qualified name from a `returnWrapped` doc tag.
    pub wrapped: Option<&'a str>,
    /// Type-variable bindings in force for the declaration.
    pub context: &'a TypeVariableContext,
    /// Documentation carried by the effective type.
    pub doc: Option<&'a str>,
}

/// A resolved representation plus the notes recorded on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    /// The resolved output.
    pub representation: Representation,
    /// Fallbacks taken while resolving.
    pub diagnostics: Vec<Diagnostic>,
}

/// Unwraps return types against a set of well-known type names.
#[derive(Debug, Clone, Copy)]
pub struct TypeUnwrapper<'a> {
    types: &'a WellKnownTypes,
}

impl<'a> TypeUnwrapper<'a> {
    /// Creates an unwrapper recognizing `types`.
    #[must_use]
    pub fn new(types: &'a WellKnownTypes) -> Self {
        Self { types }
    }

    /// Resolves the representation of `request`.
    #[must_use]
    pub fn resolve(&self, model: &DeclarationModel, request: &UnwrapRequest<'_>) -> Unwrapped {
        let mut diagnostics = Vec::new();

        let ty = match self.hinted_type(model, request, &mut diagnostics) {
            Some(hinted) => hinted,
            None => self.unwrapped_type(model, request),
        };

        let representation = if self.denotes_void(&ty) {
            Representation::Void
        } else {
            Representation::Body(EffectiveType::new(ty, request.doc.map(str::to_owned)))
        };
        Unwrapped {
            representation,
            diagnostics,
        }
    }

    /// The explicit override of a type hint tag. A hint naming the "none"
    /// literal, or an empty qualified name, is no hint.
    fn hinted_type(
        &self,
        model: &DeclarationModel,
        request: &UnwrapRequest<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<TypeRef> {
        let hint = request.type_hint?;
        if let Some(ty) = hint.type_ref("value") {
            if ty.qualified_name() != Some(self.types.type_hint_none.as_str()) {
                return Some(ty.clone());
            }
        }
        let name = hint.str("qualifiedName").filter(|n| !n.is_empty())?;
        if let Some((_, decl)) = model.find_type(name) {
            return Some(decl.declared_type.clone());
        }
        warn!(
            owner = request.owner,
            hint = name,
            "type hint does not resolve; using opaque object"
        );
        diagnostics.push(Diagnostic::new(
            request.owner,
            format!("type hint `{name}` does not resolve to a known type"),
        ));
        Some(TypeRef::Opaque)
    }

    fn unwrapped_type(&self, model: &DeclarationModel, request: &UnwrapRequest<'_>) -> TypeRef {
        let mut ty = request.declared.clone();

        if self.is_any_of(model, &ty, &self.types.async_wrappers) {
            ty = single_argument(&ty);
        }

        if request.returns_body {
            if self.is_any_of(model, &ty, &self.types.response_envelopes) {
                ty = single_argument(&ty);
            }
        } else {
            ty = TypeRef::Opaque;
        }

        if let Some(wrapped) = request.wrapped.map(str::trim).filter(|w| !w.is_empty()) {
            if let Some((_, decl)) = model.find_type(wrapped) {
                ty = decl.declared_type.clone();
            }
        }

        request.context.resolve(&ty)
    }

    fn is_any_of(&self, model: &DeclarationModel, ty: &TypeRef, names: &[String]) -> bool {
        names.iter().any(|name| model.is_instance_of(ty, name))
    }

    fn denotes_void(&self, ty: &TypeRef) -> bool {
        ty.is_void()
            || ty
                .qualified_name()
                .is_some_and(|name| self.types.void_types.iter().any(|v| v == name))
    }
}

/// The only type argument of a wrapper, or the opaque object when the
/// wrapper's arity is not one.
fn single_argument(ty: &TypeRef) -> TypeRef {
    match ty.type_arguments() {
        [only] => only.clone(),
        _ => TypeRef::Opaque,
    }
}
