//! Fixture builders for apisurface tests.
//!
//! Tag names here are the conventional defaults of the engine's vocabulary,
//! so fixtures line up with `SynthesisConfig::with_policy`.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    missing_docs,
    clippy::missing_errors_doc
)]

use apisurface_model::{
    DeclId, Declaration, HandlerEntry, ModelBuilder, ModelDocument, ModelError, Tag,
    TypeCategory, TypeRef, TypeVariableContext, Visibility,
};

/// Schema type tag.
pub const XML_TYPE: &str = "javax.xml.bind.annotation.XmlType";
/// Schema element tag.
pub const XML_ELEMENT: &str = "javax.xml.bind.annotation.XmlElement";
/// Transient marker tag.
pub const XML_TRANSIENT: &str = "javax.xml.bind.annotation.XmlTransient";
/// Unknown enum value marker tag.
pub const UNKNOWN_ENUM_VALUE: &str = "apisurface.qname.XmlUnknownQNameEnumValue";

/// Request-handling framework tags.
pub mod web {
    /// Entity parameter marker.
    pub const REQUEST_BODY: &str = "org.springframework.web.bind.annotation.RequestBody";
    /// Raw response body marker.
    pub const RESPONSE_BODY: &str = "org.springframework.web.bind.annotation.ResponseBody";
    /// Controller whose handlers all return raw bodies.
    pub const REST_CONTROLLER: &str = "org.springframework.web.bind.annotation.RestController";
    /// Single explicit response status.
    pub const RESPONSE_STATUS: &str = "org.springframework.web.bind.annotation.ResponseStatus";
    /// Route mapping.
    pub const REQUEST_MAPPING: &str = "org.springframework.web.bind.annotation.RequestMapping";
    /// Query parameter.
    pub const REQUEST_PARAM: &str = "org.springframework.web.bind.annotation.RequestParam";
}

/// Documentation-metadata tags.
pub mod rs {
    /// Return type override.
    pub const TYPE_HINT: &str = "apisurface.rs.TypeHint";
    /// Status code list.
    pub const STATUS_CODES: &str = "apisurface.rs.StatusCodes";
    /// Warning list.
    pub const WARNINGS: &str = "apisurface.rs.Warnings";
    /// Response header list.
    pub const RESPONSE_HEADERS: &str = "apisurface.rs.ResponseHeaders";
    /// Request header list.
    pub const REQUEST_HEADERS: &str = "apisurface.rs.RequestHeaders";
}

/// Asynchronous wrapper recognized by default.
pub const CALLABLE: &str = "java.util.concurrent.Callable";
/// Response envelope recognized by default.
pub const RESPONSE_ENTITY: &str = "org.springframework.http.ResponseEntity";
/// Framework-supplied request type.
pub const SERVLET_REQUEST: &str = "javax.servlet.http.HttpServletRequest";

/// A status-code list tag (`StatusCodes`/`Warnings` shape).
#[must_use]
pub fn codes_tag(codes: &[(i64, &str)]) -> Tag {
    Tag::marker().with_tags(
        "value",
        codes
            .iter()
            .map(|(code, condition)| {
                Tag::marker()
                    .with_int("code", *code)
                    .with_str("condition", *condition)
            })
            .collect(),
    )
}

/// A header list tag (`ResponseHeaders`/`RequestHeaders` shape).
#[must_use]
pub fn headers_tag(headers: &[(&str, &str)]) -> Tag {
    Tag::marker().with_tags(
        "value",
        headers
            .iter()
            .map(|(name, description)| {
                Tag::marker()
                    .with_str("name", *name)
                    .with_str("description", *description)
            })
            .collect(),
    )
}

/// A route mapping tag with one template.
#[must_use]
pub fn mapping(template: &str) -> Tag {
    Tag::marker().with_str("value", template)
}

/// A schema type in `namespace`.
#[must_use]
pub fn schema_type(qualified_name: &str, namespace: Option<&str>) -> Declaration {
    let mut decl = Declaration::type_decl(qualified_name)
        .with_visibility(Visibility::Public)
        .with_tag(XML_TYPE, Tag::marker());
    if let Some(info) = decl.as_type_mut() {
        info.namespace = namespace.map(str::to_owned);
    }
    decl
}

/// A public method.
#[must_use]
pub fn public_method(name: &str, returns: TypeRef) -> Declaration {
    Declaration::method(name, returns).with_visibility(Visibility::Public)
}

/// A small widget service: one advice scope, one controller, a handful of
/// handlers and the schema types they exchange.
#[derive(Debug)]
pub struct WidgetApi {
    /// The model document.
    pub document: ModelDocument,
    /// `demo.WidgetAdvice`.
    pub advice: DeclId,
    /// `demo.WidgetController`.
    pub controller: DeclId,
    /// `demo.Widget`.
    pub widget: DeclId,
    /// `demo.Color`.
    pub color: DeclId,
    /// `GET /widgets/{id}`, returning `Callable<Widget>`.
    pub find: DeclId,
    /// `POST /widgets`, taking a widget body and returning
    /// `ResponseEntity<Widget>`.
    pub create: DeclId,
    /// `GET /widgets`, with a type hint naming an unmodelled type.
    pub search: DeclId,
    /// `GET /widgets/latest`, returning the type variable `T`.
    pub latest: DeclId,
}

impl WidgetApi {
    /// The handler entry of `handler`.
    #[must_use]
    pub fn entry(&self, handler: DeclId) -> Option<&HandlerEntry> {
        self.document.handlers.iter().find(|h| h.method == handler)
    }
}

/// Builds the [`WidgetApi`] fixture.
///
/// # Errors
///
/// Returns the model error if the fixture is inconsistent.
pub fn widget_api() -> Result<WidgetApi, ModelError> {
    let mut b = ModelBuilder::new();
    let string = TypeRef::named("java.lang.String");
    let widget_ty = TypeRef::named("demo.Widget");

    let widget = b.add(schema_type("demo.Widget", Some("urn:widgets")));
    b.add_member(
        widget,
        Declaration::field("id", TypeRef::primitive("long"))
            .with_visibility(Visibility::Public),
    );
    b.add_member(
        widget,
        Declaration::field("label", string.clone())
            .with_visibility(Visibility::Private)
            .with_tag(XML_ELEMENT, Tag::marker().with_str("name", "title")),
    );
    b.add_member(
        widget,
        Declaration::field("cache", string.clone())
            .with_visibility(Visibility::Public)
            .with_tag(XML_TRANSIENT, Tag::marker())
            .with_tag(XML_ELEMENT, Tag::marker()),
    );
    let get_color = b.add_member(
        widget,
        public_method("getColor", TypeRef::named("demo.Color")),
    );
    let set_color = b.add_member(widget, public_method("setColor", TypeRef::Void));
    b.add_member(
        widget,
        Declaration::property(
            "color",
            TypeRef::named("demo.Color"),
            Some(get_color),
            Some(set_color),
        ),
    );

    let mut color_decl = schema_type("demo.Color", Some("urn:widgets"));
    if let Some(info) = color_decl.as_type_mut() {
        info.category = TypeCategory::Enum;
    }
    let color = b.add(color_decl);
    let color_ty = TypeRef::named("demo.Color");
    b.add_member(color, Declaration::enum_constant("RED", color_ty.clone()));
    b.add_member(color, Declaration::enum_constant("GREEN", color_ty.clone()));
    b.add_member(
        color,
        Declaration::enum_constant("UNRECOGNIZED", color_ty)
            .with_tag(UNKNOWN_ENUM_VALUE, Tag::marker()),
    );

    b.add(schema_type("demo.Audit", None));

    let advice = b.add(
        Declaration::type_decl("demo.WidgetAdvice")
            .with_tag(rs::STATUS_CODES, codes_tag(&[(500, "server fault")]))
            .with_tag(rs::WARNINGS, codes_tag(&[(199, "stale")]))
            .with_tag(rs::RESPONSE_HEADERS, headers_tag(&[("X-Rate-Limit", "old")]))
            .with_doc("HTTP", "503 maintenance")
            .with_doc("RequestHeader", "X-Tenant tenant id"),
    );
    let controller = b.add(
        Declaration::type_decl("demo.WidgetController")
            .with_tag(web::REST_CONTROLLER, Tag::marker())
            .with_tag(web::REQUEST_MAPPING, mapping("/widgets"))
            .with_tag(rs::STATUS_CODES, codes_tag(&[(401, "unauthorized")]))
            .with_tag(
                rs::REQUEST_HEADERS,
                headers_tag(&[("X-Tenant", "structured tenant")]),
            ),
    );

    let find = b.add_member(
        controller,
        public_method(
            "find",
            TypeRef::generic(CALLABLE, vec![widget_ty.clone()]),
        )
            .with_tag(web::REQUEST_MAPPING, mapping("/{id}"))
            .with_tag(rs::STATUS_CODES, codes_tag(&[(404, "missing")]))
            .with_doc("HTTP", "403 forbidden")
            .with_doc("HTTP", "not-a-code ignored")
            .with_doc("ResponseHeader", "X-Rate-Limit limit info")
            .with_doc("param", "id the widget id")
            .with_doc("return", "the widget"),
    );
    b.add_parameter(find, Declaration::parameter("id", TypeRef::primitive("long")));
    b.add_parameter(
        find,
        Declaration::parameter("request", TypeRef::named(SERVLET_REQUEST)),
    );

    let create = b.add_member(
        controller,
        public_method(
            "create",
            TypeRef::generic(RESPONSE_ENTITY, vec![widget_ty.clone()]),
        )
        .with_tag(
            web::RESPONSE_STATUS,
            Tag::marker()
                .with_int("value", 201)
                .with_str("reason", "created"),
        ),
    );
    b.add_parameter(
        create,
        Declaration::parameter("widget", widget_ty.clone())
            .with_tag(web::REQUEST_BODY, Tag::marker()),
    );
    b.add_parameter(
        create,
        Declaration::parameter("dryRun", TypeRef::primitive("boolean"))
            .with_tag(web::REQUEST_PARAM, Tag::marker().with_str("value", "dry-run")),
    );

    let search = b.add_member(
        controller,
        public_method("search", TypeRef::named("java.util.List"))
            .with_tag(
                rs::TYPE_HINT,
                Tag::marker().with_str("qualifiedName", "demo.SearchPage"),
            )
            .with_doc("RSParam", "q the query text"),
    );
    b.add_parameter(search, Declaration::parameter("q", string));

    let latest = b.add_member(
        controller,
        public_method("latest", TypeRef::variable("T"))
            .with_tag(web::REQUEST_MAPPING, mapping("/latest")),
    );

    let model_decls: Vec<Declaration> = {
        let model = b.finish()?;
        model.iter().map(|(_, d)| d.clone()).collect()
    };

    let chain = vec![controller, advice];
    let entry = |method: DeclId, type_variables: TypeVariableContext| HandlerEntry {
        method,
        ancestors: chain.clone(),
        type_variables,
    };
    let handlers = vec![
        entry(find, TypeVariableContext::new()),
        entry(create, TypeVariableContext::new()),
        entry(search, TypeVariableContext::new()),
        entry(latest, TypeVariableContext::new().bind("T", widget_ty.clone())),
    ];

    Ok(WidgetApi {
        document: ModelDocument {
            declarations: model_decls,
            handlers,
        },
        advice,
        controller,
        widget,
        color,
        find,
        create,
        search,
        latest,
    })
}
