//! Synthesis configuration: the access policy and the tag vocabulary.
//!
//! The vocabulary names the structured tags, documentation tags and
//! well-known types the engine recognizes. Every name has a conventional
//! default, so a configuration file only lists what differs:
//!
//! ```toml
//! access_policy = "PUBLIC_MEMBER"
//!
//! [vocabulary.types]
//! async_wrappers = ["java.util.concurrent.Callable", "demo.Promise"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::accessor::AccessPolicy;
use crate::error::ConfigError;

/// Tags from the schema-binding tag namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingTags {
    /// Package prefix of every schema-binding tag.
    pub namespace: String,
    /// The transient marker: excludes a member from the schema.
    pub transient: String,
    /// Marks the enum constant that stands for unrecognized values.
    pub unknown_enum_value: String,
}

impl Default for BindingTags {
    fn default() -> Self {
        Self {
            namespace: "javax.xml.bind.annotation".into(),
            transient: "javax.xml.bind.annotation.XmlTransient".into(),
            unknown_enum_value: "apisurface.qname.XmlUnknownQNameEnumValue".into(),
        }
    }
}

/// Tags of the request-handling framework.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebTags {
    /// Marks the entity (body) parameter.
    pub request_body: String,
    /// Marks a handler or scope whose return value is the raw response body.
    pub response_body: String,
    /// Marks a scope whose handlers all return raw response bodies.
    pub rest_controller: String,
    /// The single explicit response status of a handler.
    pub response_status: String,
    /// Route mapping; its `value`/`path` elements hold route templates.
    pub request_mapping: String,
    /// Query parameter.
    pub request_param: String,
    /// Path variable.
    pub path_variable: String,
    /// Header parameter.
    pub request_header: String,
    /// Cookie parameter.
    pub cookie_value: String,
    /// Matrix parameter.
    pub matrix_variable: String,
    /// Multipart form parameter.
    pub request_part: String,
    /// Composite parameter bound from individual request parameters.
    pub model_attribute: String,
}

impl Default for WebTags {
    fn default() -> Self {
        let tag = |name: &str| format!("org.springframework.web.bind.annotation.{name}");
        Self {
            request_body: tag("RequestBody"),
            response_body: tag("ResponseBody"),
            rest_controller: tag("RestController"),
            response_status: tag("ResponseStatus"),
            request_mapping: tag("RequestMapping"),
            request_param: tag("RequestParam"),
            path_variable: tag("PathVariable"),
            request_header: tag("RequestHeader"),
            cookie_value: tag("CookieValue"),
            matrix_variable: tag("MatrixVariable"),
            request_part: tag("RequestPart"),
            model_attribute: tag("ModelAttribute"),
        }
    }
}

/// Documentation-metadata tags: structured alternatives to doc tags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataTags {
    /// Explicit return type override.
    pub type_hint: String,
    /// List of possible response status codes.
    pub status_codes: String,
    /// List of possible warning codes.
    pub warnings: String,
    /// List of response headers.
    pub response_headers: String,
    /// List of request headers.
    pub request_headers: String,
}

impl Default for MetadataTags {
    fn default() -> Self {
        let tag = |name: &str| format!("apisurface.rs.{name}");
        Self {
            type_hint: tag("TypeHint"),
            status_codes: tag("StatusCodes"),
            warnings: tag("Warnings"),
            response_headers: tag("ResponseHeaders"),
            request_headers: tag("RequestHeaders"),
        }
    }
}

/// Documentation tag names (without the leading `@`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocTagNames {
    /// Return value description.
    pub return_doc: String,
    /// Qualified name of the type actually returned.
    pub return_wrapped: String,
    /// `name description` of a request header.
    pub request_header: String,
    /// `code condition` of a response status.
    pub status: String,
    /// `code condition` of a warning.
    pub warning: String,
    /// `name description` of a response header.
    pub response_header: String,
    /// `name description` of a parameter.
    pub param: String,
    /// `name description` of a request parameter; overrides `param`.
    pub rs_param: String,
}

impl Default for DocTagNames {
    fn default() -> Self {
        Self {
            return_doc: "return".into(),
            return_wrapped: "returnWrapped".into(),
            request_header: "RequestHeader".into(),
            status: "HTTP".into(),
            warning: "HTTPWarning".into(),
            response_header: "ResponseHeader".into(),
            param: "param".into(),
            rs_param: "RSParam".into(),
        }
    }
}

/// Qualified names of types with special meaning to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WellKnownTypes {
    /// Asynchronous or deferred wrappers unwrapped to their single argument.
    pub async_wrappers: Vec<String>,
    /// Typed response envelopes unwrapped when the handler returns a raw body.
    pub response_envelopes: Vec<String>,
    /// Types that denote "no value" besides `void`.
    pub void_types: Vec<String>,
    /// Parameter types supplied by the framework rather than the request.
    pub context_types: Vec<String>,
    /// The type literal a type hint uses to mean "no hint".
    pub type_hint_none: String,
}

impl Default for WellKnownTypes {
    fn default() -> Self {
        let names = |names: &[&str]| names.iter().map(|n| (*n).to_owned()).collect();
        Self {
            async_wrappers: names(&[
                "java.util.concurrent.Callable",
                "org.springframework.web.context.request.async.DeferredResult",
                "org.springframework.util.concurrent.ListenableFuture",
            ]),
            response_envelopes: names(&[
                "org.springframework.http.HttpEntity",
                "org.springframework.http.ResponseEntity",
            ]),
            void_types: names(&["java.lang.Void"]),
            context_types: names(&[
                "javax.servlet.ServletRequest",
                "javax.servlet.ServletResponse",
                "javax.servlet.http.HttpServletRequest",
                "javax.servlet.http.HttpServletResponse",
                "javax.servlet.http.HttpSession",
                "org.springframework.web.context.request.WebRequest",
                "org.springframework.ui.Model",
                "org.springframework.validation.BindingResult",
                "java.security.Principal",
                "java.util.Locale",
            ]),
            type_hint_none: "apisurface.rs.TypeHint.NONE".into(),
        }
    }
}

/// Every name the engine recognizes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Vocabulary {
    /// Schema-binding tags.
    pub binding: BindingTags,
    /// Request-handling framework tags.
    pub web: WebTags,
    /// Documentation-metadata tags.
    pub metadata: MetadataTags,
    /// Documentation tag names.
    pub docs: DocTagNames,
    /// Well-known type names.
    pub types: WellKnownTypes,
}

/// Configuration of one synthesis run. Immutable once the run starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthesisConfig {
    /// Default accessor inclusion policy. Required before a run starts.
    pub access_policy: Option<AccessPolicy>,
    /// Recognized tag and type names.
    pub vocabulary: Vocabulary,
}

impl SynthesisConfig {
    /// A configuration with the given policy and the default vocabulary.
    #[must_use]
    pub fn with_policy(policy: AccessPolicy) -> Self {
        Self {
            access_policy: Some(policy),
            vocabulary: Vocabulary::default(),
        }
    }

    /// Parses a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or names
    /// an unknown key.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The access policy of the run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAccessPolicy`] when none was configured.
    pub fn access_policy(&self) -> Result<AccessPolicy, ConfigError> {
        self.access_policy.ok_or(ConfigError::MissingAccessPolicy)
    }
}
