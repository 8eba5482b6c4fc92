//! Schema types grouped by namespace.
//!
//! A schema type becomes a [`DataType`]: a complex type listing the
//! accessors the [`AccessorFilter`] accepts, or an enum type listing its
//! constants. Types are grouped into one [`NamespaceDescriptor`] per
//! namespace URI. The facet predicate is applied when a descriptor's types
//! are read, never when they are grouped.

use std::collections::BTreeMap;

use apisurface_model::{
    DeclId, DeclKind, Declaration, DeclarationModel, ModelError, TypeCategory, TypeRef,
};
use serde::Serialize;

use crate::accessor::AccessorFilter;

/// Binding-tag `name` value meaning "derive the name from the declaration".
const DEFAULT_NAME: &str = "##default";

/// How an accessor reaches its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorKind {
    /// Through a field.
    Field,
    /// Through a getter/setter pair or an explicitly tagged accessor method.
    Property,
}

/// One member of a complex type that takes part in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accessor {
    /// Schema name.
    pub name: String,
    /// The member declaration.
    pub declaration: DeclId,
    /// Declared type of the member.
    pub type_ref: TypeRef,
    /// Field or property.
    pub kind: AccessorKind,
}

/// A structural type with its accepted accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexType {
    /// The type declaration.
    pub declaration: DeclId,
    /// Qualified name.
    pub qualified_name: String,
    /// Accessors in member order.
    pub accessors: Vec<Accessor>,
}

/// An enumerated type with its constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    /// The type declaration.
    pub declaration: DeclId,
    /// Qualified name.
    pub qualified_name: String,
    /// Known values in declaration order.
    pub values: Vec<String>,
    /// The constant standing for unrecognized values, excluded from
    /// [`EnumType::values`].
    pub unknown_value: Option<String>,
}

/// A schema type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataType {
    /// A structural type.
    Complex(ComplexType),
    /// An enumerated type.
    Enum(EnumType),
}

impl DataType {
    /// The type declaration.
    #[must_use]
    pub fn declaration(&self) -> DeclId {
        match self {
            DataType::Complex(ty) => ty.declaration,
            DataType::Enum(ty) => ty.declaration,
        }
    }

    /// Qualified name.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        match self {
            DataType::Complex(ty) => &ty.qualified_name,
            DataType::Enum(ty) => &ty.qualified_name,
        }
    }
}

/// Visibility predicate over schema types.
pub trait FacetFilter {
    /// Whether `ty` is visible.
    fn accept(&self, ty: &DataType) -> bool;
}

impl<F> FacetFilter for F
where
    F: Fn(&DataType) -> bool,
{
    fn accept(&self, ty: &DataType) -> bool {
        self(ty)
    }
}

/// A facet filter that hides nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl FacetFilter for AcceptAll {
    fn accept(&self, _: &DataType) -> bool {
        true
    }
}

/// The schema types of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceDescriptor {
    uri: String,
    types: Vec<DataType>,
}

impl NamespaceDescriptor {
    /// The namespace URI; empty for the default namespace.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The types `facet` accepts, evaluated on every call.
    #[must_use]
    pub fn types(&self, facet: &dyn FacetFilter) -> Vec<&DataType> {
        self.types.iter().filter(|ty| facet.accept(ty)).collect()
    }
}

/// Builds data types and namespace groupings from the model.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceAssembler<'a> {
    model: &'a DeclarationModel,
    filter: &'a AccessorFilter,
}

impl<'a> NamespaceAssembler<'a> {
    /// Creates an assembler selecting accessors with `filter`.
    #[must_use]
    pub fn new(model: &'a DeclarationModel, filter: &'a AccessorFilter) -> Self {
        Self { model, filter }
    }

    /// Types carrying a schema-binding tag other than the transient marker.
    #[must_use]
    pub fn schema_types(&self) -> Vec<DeclId> {
        self.model
            .types()
            .filter(|(_, decl)| {
                !self.filter.is_transient(decl)
                    && decl.tags.names().any(|name| self.filter.is_binding_tag(name))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// The data type of type declaration `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownDeclaration`] if `id` is not in the
    /// model and [`ModelError::WrongKind`] if it is not a type.
    pub fn data_type(&self, id: DeclId) -> Result<DataType, ModelError> {
        let decl = self.model.decl(id)?;
        let info = decl.as_type().ok_or_else(|| ModelError::WrongKind {
            owner: "namespace assembly".into(),
            expected: "type",
            target: id,
        })?;
        let qualified_name = info.qualified_name.clone();

        if info.category == TypeCategory::Enum {
            let unknown_tag = &self.filter.binding().unknown_enum_value;
            let mut values = Vec::new();
            let mut unknown_value = None;
            for (_, constant) in self.model.members(id) {
                if !matches!(constant.kind, DeclKind::Field(ref f) if f.enum_constant) {
                    continue;
                }
                let value = self.schema_name(constant, "value");
                if constant.tags.contains(unknown_tag) {
                    unknown_value = Some(value);
                } else {
                    values.push(value);
                }
            }
            return Ok(DataType::Enum(EnumType {
                declaration: id,
                qualified_name,
                values,
                unknown_value,
            }));
        }

        let accessors = self
            .model
            .members(id)
            .filter(|(_, member)| self.filter.accept(self.model, member))
            .filter_map(|(member_id, member)| {
                let kind = match member.kind {
                    DeclKind::Field(_) => AccessorKind::Field,
                    DeclKind::Property(_) | DeclKind::Method(_) => AccessorKind::Property,
                    DeclKind::Type(_) | DeclKind::Parameter => return None,
                };
                Some(Accessor {
                    name: self.schema_name(member, "name"),
                    declaration: member_id,
                    type_ref: member.declared_type.clone(),
                    kind,
                })
            })
            .collect();
        Ok(DataType::Complex(ComplexType {
            declaration: id,
            qualified_name,
            accessors,
        }))
    }

    /// Groups the data types of `ids` by namespace URI. Types keep their
    /// relative order inside a namespace; namespaces are ordered by URI.
    ///
    /// # Errors
    ///
    /// See [`NamespaceAssembler::data_type`].
    pub fn assemble(&self, ids: &[DeclId]) -> Result<Vec<NamespaceDescriptor>, ModelError> {
        let mut grouped: BTreeMap<String, Vec<DataType>> = BTreeMap::new();
        for &id in ids {
            let ty = self.data_type(id)?;
            let uri = self
                .model
                .decl(id)?
                .as_type()
                .and_then(|info| info.namespace.clone())
                .unwrap_or_default();
            grouped.entry(uri).or_default().push(ty);
        }
        Ok(grouped
            .into_iter()
            .map(|(uri, types)| NamespaceDescriptor { uri, types })
            .collect())
    }

    /// Groups every schema type of the model.
    ///
    /// # Errors
    ///
    /// See [`NamespaceAssembler::data_type`].
    pub fn assemble_schema(&self) -> Result<Vec<NamespaceDescriptor>, ModelError> {
        self.assemble(&self.schema_types())
    }

    /// The name a binding tag's `element` assigns, or the declared name.
    fn schema_name(&self, member: &Declaration, element: &str) -> String {
        member
            .tags
            .names()
            .filter(|name| self.filter.is_binding_tag(name))
            .flat_map(|name| member.tags.get(name))
            .filter_map(|tag| tag.str(element))
            .find(|name| !name.is_empty() && *name != DEFAULT_NAME)
            .map_or_else(|| member.name.clone(), str::to_owned)
    }
}
