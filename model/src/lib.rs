//! Declaration model consumed by the apisurface engine.
//!
//! The `apisurface-model` crate describes an analyzed program as a read-only
//! arena of [`Declaration`]s (types, methods, fields, properties and
//! parameters), each carrying a map of structured metadata tags and a map of
//! free-text documentation tags. Front ends build the model once; the
//! engine in `apisurface-synth` only reads it.
//!
//! # Entry Point
//!
//! ```
//! use apisurface_model::{Declaration, ModelBuilder, Tag, TypeRef, Visibility};
//!
//! let mut builder = ModelBuilder::new();
//! let widget = builder.add(Declaration::type_decl("demo.Widget"));
//! builder.add_member(
//!     widget,
//!     Declaration::field("name", TypeRef::named("java.lang.String"))
//!         .with_visibility(Visibility::Public)
//!         .with_tag("javax.xml.bind.annotation.XmlElement", Tag::marker()),
//! );
//! let model = builder.finish().expect("consistent model");
//! assert_eq!(model.members(widget).count(), 1);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod decl;
pub mod model;
pub mod tags;
pub mod types;

pub use decl::{
    DeclId, DeclKind, Declaration, FieldInfo, MethodInfo, Modifier, PropertyInfo, TypeCategory,
    TypeInfo, Visibility,
};
pub use model::{DeclarationModel, HandlerEntry, ModelBuilder, ModelDocument, ModelError};
pub use tags::{DocTags, Tag, TagMap, TagValue};
pub use types::{TypeRef, TypeVariableContext};
