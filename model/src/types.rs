//! Type references and type-variable substitution.
//!
//! A [`TypeRef`] is the declaration model's view of a type expression as it
//! appears on a return type, field, parameter or tag payload. Generic scopes
//! supply a [`TypeVariableContext`] that binds open variables to concrete
//! references.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A reference to a type as written in the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum TypeRef {
    /// The "no value" type.
    Void,
    /// A primitive such as `int` or `boolean`.
    Primitive {
        /// Primitive keyword.
        name: String,
    },
    /// A declared (class, interface or enum) type with its type arguments.
    Declared {
        /// Fully-qualified name.
        name: String,
        /// Type arguments, in declaration order.
        #[cfg_attr(feature = "serde", serde(default))]
        args: Vec<TypeRef>,
    },
    /// An array of the element type.
    Array {
        /// Element type.
        element: Box<TypeRef>,
    },
    /// An open type variable such as `T`.
    Variable {
        /// Variable name.
        name: String,
    },
    /// The generic opaque-object marker: a value whose shape is unknown.
    Opaque,
}

impl TypeRef {
    /// A declared type without type arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Declared {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A declared type with the given type arguments.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Declared {
            name: name.into(),
            args,
        }
    }

    /// A primitive type.
    pub fn primitive(name: impl Into<String>) -> Self {
        TypeRef::Primitive { name: name.into() }
    }

    /// An open type variable.
    pub fn variable(name: impl Into<String>) -> Self {
        TypeRef::Variable { name: name.into() }
    }

    /// An array of `element`.
    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array {
            element: Box::new(element),
        }
    }

    /// Returns true for [`TypeRef::Void`].
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Returns the qualified name of a declared type.
    #[must_use]
    pub fn qualified_name(&self) -> Option<&str> {
        match self {
            TypeRef::Declared { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the type arguments of a declared type; empty for every other kind.
    #[must_use]
    pub fn type_arguments(&self) -> &[TypeRef] {
        match self {
            TypeRef::Declared { args, .. } => args,
            _ => &[],
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Primitive { name } | TypeRef::Variable { name } => f.write_str(name),
            TypeRef::Declared { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array { element } => write!(f, "{element}[]"),
            TypeRef::Opaque => f.write_str("?object"),
        }
    }
}

/// Bindings of type variables to type references for one generic scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TypeVariableContext {
    bindings: BTreeMap<String, TypeRef>,
}

impl TypeVariableContext {
    /// Creates an empty context; resolving against it is the identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `ty`, replacing any previous binding.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.bindings.insert(name.into(), ty);
        self
    }

    /// Returns the binding for `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.bindings.get(name)
    }

    /// Returns true when no variable is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Replaces every bound variable in `ty`, recursively.
    ///
    /// Bindings are followed transitively. A variable whose chain of bindings
    /// leads back to itself is left as written.
    #[must_use]
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        self.resolve_guarded(ty, &mut BTreeSet::new())
    }

    fn resolve_guarded<'a>(&'a self, ty: &'a TypeRef, active: &mut BTreeSet<&'a str>) -> TypeRef {
        match ty {
            TypeRef::Variable { name } => match self.bindings.get(name.as_str()) {
                Some(bound) if active.insert(name.as_str()) => {
                    let resolved = self.resolve_guarded(bound, active);
                    active.remove(name.as_str());
                    resolved
                }
                _ => ty.clone(),
            },
            TypeRef::Declared { name, args } => TypeRef::Declared {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|arg| self.resolve_guarded(arg, active))
                    .collect(),
            },
            TypeRef::Array { element } => TypeRef::Array {
                element: Box::new(self.resolve_guarded(element, active)),
            },
            TypeRef::Void | TypeRef::Primitive { .. } | TypeRef::Opaque => ty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_generic_arguments() {
        let ty = TypeRef::generic(
            "java.util.Map",
            vec![TypeRef::named("String"), TypeRef::array(TypeRef::primitive("int"))],
        );
        assert_eq!(ty.to_string(), "java.util.Map<String, int[]>");
    }

    #[test]
    fn resolve_substitutes_nested_variables() {
        let ctx = TypeVariableContext::new().bind("T", TypeRef::named("Widget"));
        let ty = TypeRef::generic("java.util.List", vec![TypeRef::variable("T")]);
        assert_eq!(
            ctx.resolve(&ty),
            TypeRef::generic("java.util.List", vec![TypeRef::named("Widget")])
        );
    }

    #[test]
    fn resolve_follows_chains() {
        let ctx = TypeVariableContext::new()
            .bind("T", TypeRef::variable("U"))
            .bind("U", TypeRef::named("Widget"));
        assert_eq!(ctx.resolve(&TypeRef::variable("T")), TypeRef::named("Widget"));
    }

    #[test]
    fn resolve_leaves_cycles_open() {
        let ctx = TypeVariableContext::new()
            .bind("T", TypeRef::variable("U"))
            .bind("U", TypeRef::variable("T"));
        assert_eq!(ctx.resolve(&TypeRef::variable("T")), TypeRef::variable("T"));
    }

    #[test]
    fn unbound_variables_survive() {
        let ctx = TypeVariableContext::new();
        assert_eq!(ctx.resolve(&TypeRef::variable("E")), TypeRef::variable("E"));
    }
}
