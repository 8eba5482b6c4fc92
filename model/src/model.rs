//! The declaration model: an arena of declarations with name lookups.
//!
//! The model is built once (outside the engine) and is read-only afterwards.
//! Construction validates every cross-reference, so lookups by a [`DeclId`]
//! obtained from the model itself never fail.

use std::collections::{BTreeMap, BTreeSet};

use crate::decl::{DeclId, DeclKind, Declaration};
use crate::types::{TypeRef, TypeVariableContext};

/// Errors raised when a declaration model is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A declaration references an id outside the model.
    #[error("{owner} references unknown declaration {target}")]
    DanglingReference {
        /// Label of the referencing declaration.
        owner: String,
        /// The missing id.
        target: DeclId,
    },
    /// Two type declarations share a qualified name.
    #[error("duplicate type declaration {0}")]
    DuplicateType(String),
    /// An id that is not part of the model was looked up.
    #[error("unknown declaration {0}")]
    UnknownDeclaration(DeclId),
    /// A reference points at a declaration of the wrong kind.
    #[error("{owner} expects {expected} at {target}")]
    WrongKind {
        /// Label of the referencing declaration.
        owner: String,
        /// Expected declaration kind.
        expected: &'static str,
        /// The offending id.
        target: DeclId,
    },
}

/// A validated, read-only arena of declarations.
#[derive(Debug, Clone, Default)]
pub struct DeclarationModel {
    decls: Vec<Declaration>,
    types_by_name: BTreeMap<String, DeclId>,
}

impl DeclarationModel {
    /// Builds a model from declarations indexed by position.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DanglingReference`] if a member, parameter or
    /// accessor id is out of range, [`ModelError::WrongKind`] if a method
    /// parameter is not a parameter declaration, and
    /// [`ModelError::DuplicateType`] if two types share a qualified name.
    pub fn from_declarations(decls: Vec<Declaration>) -> Result<Self, ModelError> {
        let mut types_by_name = BTreeMap::new();
        for (index, decl) in decls.iter().enumerate() {
            let check = |target: DeclId| -> Result<&Declaration, ModelError> {
                decls.get(target.0).ok_or_else(|| ModelError::DanglingReference {
                    owner: decl.label(),
                    target,
                })
            };
            match &decl.kind {
                DeclKind::Type(info) => {
                    for member in &info.members {
                        check(*member)?;
                    }
                    if types_by_name
                        .insert(info.qualified_name.clone(), DeclId(index))
                        .is_some()
                    {
                        return Err(ModelError::DuplicateType(info.qualified_name.clone()));
                    }
                }
                DeclKind::Method(info) => {
                    for param in &info.parameters {
                        if !matches!(check(*param)?.kind, DeclKind::Parameter) {
                            return Err(ModelError::WrongKind {
                                owner: decl.label(),
                                expected: "parameter",
                                target: *param,
                            });
                        }
                    }
                }
                DeclKind::Property(info) => {
                    for accessor in info.getter.iter().chain(info.setter.iter()) {
                        check(*accessor)?;
                    }
                }
                DeclKind::Field(_) | DeclKind::Parameter => {}
            }
        }
        Ok(Self {
            decls,
            types_by_name,
        })
    }

    /// Returns the declaration with the given id.
    #[must_use]
    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.0)
    }

    /// Returns the declaration with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownDeclaration`] if the id is not in the model.
    pub fn decl(&self, id: DeclId) -> Result<&Declaration, ModelError> {
        self.get(id).ok_or(ModelError::UnknownDeclaration(id))
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Returns true if the model holds no declarations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Every declaration with its id, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls.iter().enumerate().map(|(i, d)| (DeclId(i), d))
    }

    /// Every type declaration with its id.
    pub fn types(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.iter().filter(|(_, d)| d.as_type().is_some())
    }

    /// Looks up a type declaration by qualified name.
    #[must_use]
    pub fn find_type(&self, qualified_name: &str) -> Option<(DeclId, &Declaration)> {
        let id = *self.types_by_name.get(qualified_name)?;
        self.get(id).map(|decl| (id, decl))
    }

    /// The member declarations of a type, in declaration order. Empty for
    /// any other kind of declaration.
    pub fn members(&self, type_id: DeclId) -> impl Iterator<Item = (DeclId, &Declaration)> {
        let members: &[DeclId] = self
            .get(type_id)
            .and_then(Declaration::as_type)
            .map_or(&[], |info| info.members.as_slice());
        members
            .iter()
            .filter_map(move |id| self.get(*id).map(|decl| (*id, decl)))
    }

    /// Returns true if `ty` is, or transitively extends, the type named
    /// `qualified_name`.
    ///
    /// Names not declared in the model are compared directly, so a
    /// well-known library type need not be modelled to be recognized.
    #[must_use]
    pub fn is_instance_of(&self, ty: &TypeRef, qualified_name: &str) -> bool {
        let Some(start) = ty.qualified_name() else {
            return false;
        };
        let mut seen = BTreeSet::new();
        let mut pending = vec![start];
        while let Some(name) = pending.pop() {
            if name == qualified_name {
                return true;
            }
            if !seen.insert(name) {
                continue;
            }
            if let Some(info) = self.find_type(name).and_then(|(_, d)| d.as_type()) {
                pending.extend(info.supertypes.iter().filter_map(TypeRef::qualified_name));
            }
        }
        false
    }
}

/// Incremental construction of a [`DeclarationModel`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    decls: Vec<Declaration>,
}

impl ModelBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration and returns its id.
    pub fn add(&mut self, decl: Declaration) -> DeclId {
        self.decls.push(decl);
        DeclId(self.decls.len() - 1)
    }

    /// Adds `member` to the members of `owner`. Ignored unless `owner` is a type.
    pub fn add_member(&mut self, owner: DeclId, member: Declaration) -> DeclId {
        let id = self.add(member);
        if let Some(info) = self.decls.get_mut(owner.0).and_then(Declaration::as_type_mut) {
            info.members.push(id);
        }
        id
    }

    /// Adds `param` to the parameters of `method`. Ignored unless `method` is a method.
    pub fn add_parameter(&mut self, method: DeclId, param: Declaration) -> DeclId {
        let id = self.add(param);
        if let Some(info) = self.decls.get_mut(method.0).and_then(Declaration::as_method_mut) {
            info.parameters.push(id);
        }
        id
    }

    /// Mutable access to a declaration added earlier.
    pub fn decl_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.decls.get_mut(id.0)
    }

    /// Validates and freezes the model.
    ///
    /// # Errors
    ///
    /// See [`DeclarationModel::from_declarations`].
    pub fn finish(self) -> Result<DeclarationModel, ModelError> {
        DeclarationModel::from_declarations(self.decls)
    }
}

/// A handler method named for synthesis, with its ordered advice/ancestor
/// chain and the substitution context in force for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandlerEntry {
    /// The handler method.
    pub method: DeclId,
    /// Enclosing scopes whose tags the handler inherits, nearest first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ancestors: Vec<DeclId>,
    /// Type-variable bindings for the handler's generic scope.
    #[cfg_attr(feature = "serde", serde(default))]
    pub type_variables: TypeVariableContext,
}

/// The on-disk form of a declaration model as produced by a front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelDocument {
    /// Declarations, indexed by position.
    pub declarations: Vec<Declaration>,
    /// Handler methods to synthesize.
    #[cfg_attr(feature = "serde", serde(default))]
    pub handlers: Vec<HandlerEntry>,
}

impl ModelDocument {
    /// Validates the declarations into a model, returning it with the
    /// handler list.
    ///
    /// # Errors
    ///
    /// See [`DeclarationModel::from_declarations`].
    pub fn into_model(self) -> Result<(DeclarationModel, Vec<HandlerEntry>), ModelError> {
        Ok((
            DeclarationModel::from_declarations(self.declarations)?,
            self.handlers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Visibility;

    fn widget_model() -> DeclarationModel {
        let mut b = ModelBuilder::new();
        let base = b.add(Declaration::type_decl("demo.Base"));
        let widget = b.add(Declaration::type_decl("demo.Widget"));
        if let Some(info) = b.decl_mut(widget).and_then(Declaration::as_type_mut) {
            info.supertypes.push(TypeRef::named("demo.Base"));
        }
        b.add_member(
            widget,
            Declaration::field("id", TypeRef::primitive("long"))
                .with_visibility(Visibility::Private),
        );
        let _ = base;
        match b.finish() {
            Ok(model) => model,
            Err(e) => panic!("fixture model is valid: {e}"),
        }
    }

    #[test]
    fn find_type_by_qualified_name() {
        let model = widget_model();
        let (_, decl) = model.find_type("demo.Widget").unwrap();
        assert_eq!(decl.name, "Widget");
        assert!(model.find_type("demo.Missing").is_none());
    }

    #[test]
    fn members_in_declaration_order() {
        let model = widget_model();
        let (id, _) = model.find_type("demo.Widget").unwrap();
        let names: Vec<_> = model.members(id).map(|(_, d)| d.name.as_str()).collect();
        assert_eq!(names, vec!["id"]);
    }

    #[test]
    fn instance_of_walks_supertypes() {
        let model = widget_model();
        let widget = TypeRef::named("demo.Widget");
        assert!(model.is_instance_of(&widget, "demo.Widget"));
        assert!(model.is_instance_of(&widget, "demo.Base"));
        assert!(!model.is_instance_of(&widget, "demo.Other"));
        assert!(!model.is_instance_of(&TypeRef::Void, "demo.Base"));
    }

    #[test]
    fn instance_of_survives_supertype_cycles() {
        let mut a = Declaration::type_decl("demo.A");
        let mut b = Declaration::type_decl("demo.B");
        a.as_type_mut().unwrap().supertypes.push(TypeRef::named("demo.B"));
        b.as_type_mut().unwrap().supertypes.push(TypeRef::named("demo.A"));
        let model = DeclarationModel::from_declarations(vec![a, b]).unwrap();
        assert!(!model.is_instance_of(&TypeRef::named("demo.A"), "demo.C"));
    }

    #[test]
    fn dangling_member_is_rejected() {
        let mut ty = Declaration::type_decl("demo.Broken");
        ty.as_type_mut().unwrap().members.push(DeclId(7));
        let err = DeclarationModel::from_declarations(vec![ty]).unwrap_err();
        assert!(matches!(err, ModelError::DanglingReference { target: DeclId(7), .. }));
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let err = DeclarationModel::from_declarations(vec![
            Declaration::type_decl("demo.Twice"),
            Declaration::type_decl("demo.Twice"),
        ])
        .unwrap_err();
        assert_eq!(err, ModelError::DuplicateType("demo.Twice".into()));
    }

    #[test]
    fn method_parameters_must_be_parameters() {
        let mut method = Declaration::method("get", TypeRef::Void);
        method.as_method_mut().unwrap().parameters.push(DeclId(1));
        let field = Declaration::field("x", TypeRef::primitive("int"));
        let err = DeclarationModel::from_declarations(vec![method, field]).unwrap_err();
        assert!(matches!(err, ModelError::WrongKind { expected: "parameter", .. }));
    }

    #[test]
    fn default_handler_entry_points_at_the_first_declaration() {
        let entry = HandlerEntry {
            ancestors: vec![DeclId(3)],
            ..HandlerEntry::default()
        };
        assert_eq!(entry.method, DeclId(0));
        assert!(entry.type_variables.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn document_round_trips_through_json() {
        let json = r#"{
            "declarations": [
                { "name": "Widget", "declared_type": { "kind": "declared", "name": "demo.Widget" },
                  "kind": "type", "qualified_name": "demo.Widget", "namespace": "urn:demo" },
                { "name": "find", "declared_type": { "kind": "declared", "name": "demo.Widget" },
                  "kind": "method", "parameters": [2],
                  "tags": { "web.ResponseBody": [{}] },
                  "docs": { "HTTP": ["404 not found"] } },
                { "name": "id", "declared_type": { "kind": "primitive", "name": "long" },
                  "kind": "parameter" }
            ],
            "handlers": [ { "method": 1 } ]
        }"#;
        let doc: ModelDocument = serde_json::from_str(json).unwrap();
        let (model, handlers) = doc.into_model().unwrap();
        assert_eq!(handlers.len(), 1);
        let find = model.decl(handlers[0].method).unwrap();
        assert!(find.tags.contains("web.ResponseBody"));
        assert_eq!(find.as_method().unwrap().parameters, vec![DeclId(2)]);
        let (_, widget) = model.find_type("demo.Widget").unwrap();
        assert_eq!(widget.as_type().unwrap().namespace.as_deref(), Some("urn:demo"));
    }
}
