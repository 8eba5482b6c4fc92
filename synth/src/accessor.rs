//! Accessor selection: which members of a structural type take part in
//! serialization.
//!
//! Explicit per-member tags always win over the run's [`AccessPolicy`]; the
//! policy only governs the default inclusion of plain fields and properties.

use std::fmt;
use std::str::FromStr;

use apisurface_model::{DeclKind, Declaration, DeclarationModel, Modifier};
use serde::{Deserialize, Serialize};

use crate::config::{BindingTags, SynthesisConfig};
use crate::error::ConfigError;

/// Default inclusion policy for plain (untagged) members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessPolicy {
    /// Only explicitly tagged members.
    None,
    /// Complete public getter/setter pairs.
    Property,
    /// Every non-static, non-transient field.
    Field,
    /// Public fields and complete public getter/setter pairs.
    PublicMember,
}

impl AccessPolicy {
    /// All policies.
    pub const ALL: [AccessPolicy; 4] = [
        AccessPolicy::None,
        AccessPolicy::Property,
        AccessPolicy::Field,
        AccessPolicy::PublicMember,
    ];

    /// Returns the configuration spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessPolicy::None => "NONE",
            AccessPolicy::Property => "PROPERTY",
            AccessPolicy::Field => "FIELD",
            AccessPolicy::PublicMember => "PUBLIC_MEMBER",
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        AccessPolicy::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownAccessPolicy(s.to_owned()))
    }
}

/// Filter for potential accessors under one policy.
#[derive(Debug, Clone)]
pub struct AccessorFilter {
    policy: AccessPolicy,
    binding: BindingTags,
}

impl AccessorFilter {
    /// Creates a filter for `policy` recognizing the given binding tags.
    #[must_use]
    pub fn new(policy: AccessPolicy, binding: &BindingTags) -> Self {
        Self {
            policy,
            binding: binding.clone(),
        }
    }

    /// Creates the filter of a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAccessPolicy`] if the configuration has
    /// no policy.
    pub fn from_config(config: &SynthesisConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.access_policy()?, &config.vocabulary.binding))
    }

    /// The policy this filter applies.
    #[must_use]
    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// The binding tags this filter recognizes.
    #[must_use]
    pub fn binding(&self) -> &BindingTags {
        &self.binding
    }

    /// Whether to accept `member` as an accessor.
    ///
    /// Accessor ids of a property are looked up in `model`; an id that does
    /// not resolve counts as a missing accessor.
    #[must_use]
    pub fn accept(&self, model: &DeclarationModel, member: &Declaration) -> bool {
        if self.is_transient(member) {
            return false;
        }

        if self.explicitly_declared(member) {
            return true;
        }

        match &member.kind {
            DeclKind::Property(property) => {
                let getter = property.getter.and_then(|id| model.get(id));
                let setter = property.setter.and_then(|id| model.get(id));
                let (Some(getter), Some(setter)) = (getter, setter) else {
                    return false;
                };

                // Properties are only defined by public accessor methods.
                if !getter.is_public() || !setter.is_public() {
                    return false;
                }

                !matches!(self.policy, AccessPolicy::None | AccessPolicy::Field)
            }
            DeclKind::Field(_) => {
                if member.has_modifier(Modifier::Static) || member.has_modifier(Modifier::Transient)
                {
                    return false;
                }

                match self.policy {
                    AccessPolicy::None | AccessPolicy::Property => false,
                    AccessPolicy::PublicMember => member.is_public(),
                    AccessPolicy::Field => true,
                }
            }
            DeclKind::Type(_) | DeclKind::Method(_) | DeclKind::Parameter => false,
        }
    }

    /// Returns true if `tag_name` belongs to the schema-binding tag namespace.
    #[must_use]
    pub fn is_binding_tag(&self, tag_name: &str) -> bool {
        tag_name
            .strip_prefix(self.binding.namespace.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Returns true if `member` carries the transient marker tag.
    #[must_use]
    pub fn is_transient(&self, member: &Declaration) -> bool {
        member.tags.contains(&self.binding.transient)
    }

    /// Whether the member carries any schema-binding tag other than the
    /// transient marker.
    fn explicitly_declared(&self, member: &Declaration) -> bool {
        member
            .tags
            .names()
            .any(|name| name != self.binding.transient && self.is_binding_tag(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apisurface_model::{DeclId, ModelBuilder, Tag, TypeRef, Visibility};
    use proptest::prelude::*;

    const XML_ELEMENT: &str = "javax.xml.bind.annotation.XmlElement";
    const XML_TRANSIENT: &str = "javax.xml.bind.annotation.XmlTransient";

    fn filter(policy: AccessPolicy) -> AccessorFilter {
        AccessorFilter::new(policy, &BindingTags::default())
    }

    fn field(visibility: Visibility) -> Declaration {
        Declaration::field("name", TypeRef::named("java.lang.String"))
            .with_visibility(visibility)
    }

    /// A model holding a property whose getter and setter have the given
    /// visibilities. Returns the model and the property id.
    fn property_model(
        getter: Option<Visibility>,
        setter: Option<Visibility>,
    ) -> (DeclarationModel, DeclId) {
        let mut b = ModelBuilder::new();
        let string = TypeRef::named("java.lang.String");
        let getter = getter
            .map(|v| b.add(Declaration::method("getName", string.clone()).with_visibility(v)));
        let setter = setter
            .map(|v| b.add(Declaration::method("setName", TypeRef::Void).with_visibility(v)));
        let property = b.add(Declaration::property("name", string, getter, setter));
        (b.finish().unwrap(), property)
    }

    fn accept_property(
        policy: AccessPolicy,
        getter: Option<Visibility>,
        setter: Option<Visibility>,
    ) -> bool {
        let (model, id) = property_model(getter, setter);
        filter(policy).accept(&model, model.get(id).unwrap())
    }

    #[test]
    fn transient_tag_beats_explicit_binding_tag() {
        let model = DeclarationModel::default();
        let member = field(Visibility::Public)
            .with_tag(XML_TRANSIENT, Tag::marker())
            .with_tag(XML_ELEMENT, Tag::marker());
        for policy in AccessPolicy::ALL {
            assert!(!filter(policy).accept(&model, &member), "{policy}");
        }
    }

    #[test]
    fn explicit_binding_tag_beats_policy() {
        let model = DeclarationModel::default();
        let member = field(Visibility::Private).with_tag(XML_ELEMENT, Tag::marker());
        for policy in AccessPolicy::ALL {
            assert!(filter(policy).accept(&model, &member), "{policy}");
        }
    }

    #[test]
    fn tags_outside_the_binding_namespace_do_not_count() {
        let model = DeclarationModel::default();
        let member = field(Visibility::Private)
            .with_tag("javax.xml.bind.annotationx.Other", Tag::marker())
            .with_tag("demo.Audit", Tag::marker());
        assert!(!filter(AccessPolicy::PublicMember).accept(&model, &member));
    }

    #[test]
    fn binding_subpackages_count_as_explicit() {
        let model = DeclarationModel::default();
        let member = field(Visibility::Private).with_tag(
            "javax.xml.bind.annotation.adapters.XmlJavaTypeAdapter",
            Tag::marker(),
        );
        assert!(filter(AccessPolicy::None).accept(&model, &member));
    }

    #[test]
    fn policy_none_accepts_no_plain_members() {
        let model = DeclarationModel::default();
        assert!(!filter(AccessPolicy::None).accept(&model, &field(Visibility::Public)));
        let public = Some(Visibility::Public);
        assert!(!accept_property(AccessPolicy::None, public, public));
    }

    #[test]
    fn public_member_requires_public_fields() {
        let model = DeclarationModel::default();
        let f = filter(AccessPolicy::PublicMember);
        assert!(f.accept(&model, &field(Visibility::Public)));
        assert!(!f.accept(&model, &field(Visibility::Private)));
        assert!(!f.accept(&model, &field(Visibility::Package)));
    }

    #[test]
    fn field_policy_accepts_private_fields() {
        let model = DeclarationModel::default();
        assert!(filter(AccessPolicy::Field).accept(&model, &field(Visibility::Private)));
        assert!(!filter(AccessPolicy::Property).accept(&model, &field(Visibility::Public)));
    }

    #[test]
    fn static_and_transient_fields_are_rejected() {
        let model = DeclarationModel::default();
        let f = filter(AccessPolicy::Field);
        assert!(!f.accept(&model, &field(Visibility::Public).with_modifier(Modifier::Static)));
        let transient = field(Visibility::Public).with_modifier(Modifier::Transient);
        assert!(!f.accept(&model, &transient));
    }

    #[test]
    fn properties_need_both_public_accessors() {
        let public = Some(Visibility::Public);
        assert!(accept_property(AccessPolicy::Property, public, public));
        assert!(accept_property(AccessPolicy::PublicMember, public, public));
        assert!(!accept_property(AccessPolicy::Field, public, public));
        assert!(!accept_property(AccessPolicy::Property, public, None));
        assert!(!accept_property(AccessPolicy::Property, None, public));
    }

    #[test]
    fn package_private_setter_is_rejected_under_every_policy() {
        for policy in AccessPolicy::ALL {
            assert!(
                !accept_property(policy, Some(Visibility::Public), Some(Visibility::Package)),
                "{policy}"
            );
        }
    }

    #[test]
    fn methods_types_and_parameters_are_rejected() {
        let model = DeclarationModel::default();
        let f = filter(AccessPolicy::Field);
        let method =
            Declaration::method("get", TypeRef::Void).with_visibility(Visibility::Public);
        assert!(!f.accept(&model, &method));
        assert!(!f.accept(&model, &Declaration::type_decl("demo.Widget")));
        assert!(!f.accept(&model, &Declaration::parameter("id", TypeRef::primitive("long"))));
    }

    #[test]
    fn policy_names_parse_leniently() {
        assert_eq!(
            "public-member".parse::<AccessPolicy>().unwrap(),
            AccessPolicy::PublicMember
        );
        assert_eq!("FIELD".parse::<AccessPolicy>().unwrap(), AccessPolicy::Field);
        assert!(matches!(
            "everything".parse::<AccessPolicy>(),
            Err(ConfigError::UnknownAccessPolicy(_))
        ));
    }

    #[test]
    fn missing_policy_fails_fast() {
        let config = SynthesisConfig::default();
        assert!(matches!(
            AccessorFilter::from_config(&config),
            Err(ConfigError::MissingAccessPolicy)
        ));
    }

    fn any_policy() -> impl Strategy<Value = AccessPolicy> {
        prop::sample::select(AccessPolicy::ALL.to_vec())
    }

    fn any_visibility() -> impl Strategy<Value = Visibility> {
        prop::sample::select(vec![
            Visibility::Public,
            Visibility::Protected,
            Visibility::Package,
            Visibility::Private,
            Visibility::Unknown,
        ])
    }

    proptest! {
        #[test]
        fn accept_is_deterministic(
            policy in any_policy(),
            visibility in any_visibility(),
            is_static in any::<bool>(),
            transient in any::<bool>(),
            tagged in any::<bool>(),
        ) {
            let model = DeclarationModel::default();
            let mut member = field(visibility);
            if is_static {
                member = member.with_modifier(Modifier::Static);
            }
            if transient {
                member = member.with_modifier(Modifier::Transient);
            }
            if tagged {
                member = member.with_tag(XML_ELEMENT, Tag::marker());
            }
            let f = filter(policy);
            prop_assert_eq!(f.accept(&model, &member), f.accept(&model, &member));
            if tagged {
                prop_assert!(f.accept(&model, &member));
            }
        }

        #[test]
        fn property_acceptance_follows_policy(
            policy in any_policy(),
            getter in proptest::option::of(any_visibility()),
            setter in proptest::option::of(any_visibility()),
        ) {
            let complete = getter == Some(Visibility::Public) && setter == Some(Visibility::Public);
            let expected = complete
                && matches!(policy, AccessPolicy::Property | AccessPolicy::PublicMember);
            prop_assert_eq!(accept_property(policy, getter, setter), expected);
        }
    }
}
