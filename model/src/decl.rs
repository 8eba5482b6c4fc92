//! Declarations: the named elements of the analyzed program.
//!
//! A [`Declaration`] carries the attributes every element shares and a
//! closed [`DeclKind`] for what is specific to types, methods, fields,
//! properties and parameters. Declarations refer to each other by
//! [`DeclId`] inside a [`DeclarationModel`](crate::DeclarationModel).

use std::collections::BTreeSet;
use std::fmt;

use crate::tags::{DocTags, Tag, TagMap};
use crate::types::TypeRef;

/// Index of a declaration inside its model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct DeclId(pub usize);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Access level of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Visibility {
    /// Visible everywhere.
    Public,
    /// Visible to subtypes.
    Protected,
    /// Visible inside the declaring package (no access keyword).
    Package,
    /// Visible inside the declaring type.
    Private,
    /// Not recorded by the model.
    #[default]
    Unknown,
}

/// A declaration modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Modifier {
    /// `static`
    Static,
    /// Language-level transience, distinct from any transient tag.
    Transient,
    /// `final`
    Final,
    /// `abstract`
    Abstract,
    /// `volatile`
    Volatile,
    /// `synchronized`
    Synchronized,
}

/// Whether a type declaration is a class, an interface or an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TypeCategory {
    /// A class.
    #[default]
    Class,
    /// An interface.
    Interface,
    /// An enumeration; its constants are enum-constant fields.
    Enum,
}

/// Attributes specific to a type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeInfo {
    /// Fully-qualified name, unique within the model.
    pub qualified_name: String,
    /// Schema namespace URI; `None` for the default namespace.
    #[cfg_attr(feature = "serde", serde(default))]
    pub namespace: Option<String>,
    /// Class, interface or enum.
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: TypeCategory,
    /// Names of the type's own type parameters.
    #[cfg_attr(feature = "serde", serde(default))]
    pub type_parameters: Vec<String>,
    /// Direct supertypes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub supertypes: Vec<TypeRef>,
    /// Member declarations (fields, properties, methods).
    #[cfg_attr(feature = "serde", serde(default))]
    pub members: Vec<DeclId>,
}

/// Attributes specific to a method; its declared type is the return type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodInfo {
    /// Parameters in declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parameters: Vec<DeclId>,
}

/// Attributes specific to a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldInfo {
    /// The field is a constant of an enum type.
    #[cfg_attr(feature = "serde", serde(default))]
    pub enum_constant: bool,
}

/// A property: a getter/setter pair. Both are required for a complete
/// property; the ids are references only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyInfo {
    /// Getter method.
    #[cfg_attr(feature = "serde", serde(default))]
    pub getter: Option<DeclId>,
    /// Setter method.
    #[cfg_attr(feature = "serde", serde(default))]
    pub setter: Option<DeclId>,
}

/// What kind of declaration this is.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum DeclKind {
    /// A type.
    Type(TypeInfo),
    /// A method.
    Method(MethodInfo),
    /// A field.
    Field(FieldInfo),
    /// A synthetic getter/setter property.
    Property(PropertyInfo),
    /// A method parameter.
    Parameter,
}

/// A named element of the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    /// Simple name.
    pub name: String,
    /// Access level.
    #[cfg_attr(feature = "serde", serde(default))]
    pub visibility: Visibility,
    /// Modifiers, ordered.
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: BTreeSet<Modifier>,
    /// Structured tags by qualified name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: TagMap,
    /// Documentation tag lines by tag name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub docs: DocTags,
    /// Declared type: the type itself, a field/parameter/property type, or
    /// a method's return type.
    pub declared_type: TypeRef,
    /// Kind-specific attributes.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: DeclKind,
}

impl Declaration {
    fn new(name: impl Into<String>, declared_type: TypeRef, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Unknown,
            modifiers: BTreeSet::new(),
            tags: TagMap::default(),
            docs: DocTags::default(),
            declared_type,
            kind,
        }
    }

    /// A type declaration named by its qualified name; the simple name is
    /// the last dotted segment.
    pub fn type_decl(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let simple = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name.as_str())
            .to_owned();
        let declared_type = TypeRef::named(qualified_name.clone());
        Self::new(
            simple,
            declared_type,
            DeclKind::Type(TypeInfo {
                qualified_name,
                ..TypeInfo::default()
            }),
        )
    }

    /// A method returning `return_type`.
    pub fn method(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self::new(name, return_type, DeclKind::Method(MethodInfo::default()))
    }

    /// A field of type `ty`.
    pub fn field(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, DeclKind::Field(FieldInfo::default()))
    }

    /// A constant of an enum type.
    pub fn enum_constant(name: impl Into<String>, enum_type: TypeRef) -> Self {
        let mut decl = Self::new(
            name,
            enum_type,
            DeclKind::Field(FieldInfo {
                enum_constant: true,
            }),
        );
        decl.visibility = Visibility::Public;
        decl.modifiers.insert(Modifier::Static);
        decl.modifiers.insert(Modifier::Final);
        decl
    }

    /// A property of type `ty` backed by the given accessors.
    pub fn property(
        name: impl Into<String>,
        ty: TypeRef,
        getter: Option<DeclId>,
        setter: Option<DeclId>,
    ) -> Self {
        Self::new(name, ty, DeclKind::Property(PropertyInfo { getter, setter }))
    }

    /// A parameter of type `ty`.
    pub fn parameter(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, ty, DeclKind::Parameter)
    }

    /// Sets the visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds a modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.insert(modifier);
        self
    }

    /// Adds one occurrence of structured tag `name`.
    #[must_use]
    pub fn with_tag(mut self, name: impl Into<String>, tag: Tag) -> Self {
        self.tags.insert(name, tag);
        self
    }

    /// Adds a documentation tag line.
    #[must_use]
    pub fn with_doc(mut self, name: impl Into<String>, line: impl Into<String>) -> Self {
        self.docs.push(name, line);
        self
    }

    /// Returns true for [`Visibility::Public`].
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Returns true if the modifier is present.
    #[must_use]
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Type attributes, when this is a type.
    #[must_use]
    pub fn as_type(&self) -> Option<&TypeInfo> {
        match &self.kind {
            DeclKind::Type(info) => Some(info),
            _ => None,
        }
    }

    /// Mutable type attributes, when this is a type.
    pub fn as_type_mut(&mut self) -> Option<&mut TypeInfo> {
        match &mut self.kind {
            DeclKind::Type(info) => Some(info),
            _ => None,
        }
    }

    /// Method attributes, when this is a method.
    #[must_use]
    pub fn as_method(&self) -> Option<&MethodInfo> {
        match &self.kind {
            DeclKind::Method(info) => Some(info),
            _ => None,
        }
    }

    /// Mutable method attributes, when this is a method.
    pub fn as_method_mut(&mut self) -> Option<&mut MethodInfo> {
        match &mut self.kind {
            DeclKind::Method(info) => Some(info),
            _ => None,
        }
    }

    /// Short label used in diagnostics: kind and name.
    #[must_use]
    pub fn label(&self) -> String {
        let kind = match &self.kind {
            DeclKind::Type(info) => return format!("type {}", info.qualified_name),
            DeclKind::Method(_) => "method",
            DeclKind::Field(_) => "field",
            DeclKind::Property(_) => "property",
            DeclKind::Parameter => "parameter",
        };
        format!("{kind} {}", self.name)
    }
}
