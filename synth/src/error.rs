//! Error types.
//!
//! Only [`ConfigError`] aborts a run. A [`SynthesisError`] is scoped to one
//! handler method and is collected alongside the descriptors of its
//! siblings. [`RunError`] wraps what can stop [`crate::run`].

use std::path::PathBuf;

use apisurface_model::ModelError;

/// A caller-side configuration mistake. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No access policy was supplied.
    #[error("an access policy must be specified")]
    MissingAccessPolicy,
    /// A policy name that is not one of the four policies.
    #[error("unknown access policy `{0}` (expected NONE, PROPERTY, FIELD or PUBLIC_MEMBER)")]
    UnknownAccessPolicy(String),
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// The configuration file is not valid.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Synthesis of one handler method failed because the model is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// The handler, an ancestor or a parameter could not be resolved.
    #[error("{handler}: {source}")]
    Model {
        /// Identity of the handler being synthesized.
        handler: String,
        /// The model inconsistency.
        source: ModelError,
    },
    /// The declaration named as a handler is not a method.
    #[error("{handler} is not a method")]
    NotAHandler {
        /// Identity of the declaration.
        handler: String,
    },
}

impl SynthesisError {
    /// Identity of the handler the error belongs to.
    #[must_use]
    pub fn handler(&self) -> &str {
        match self {
            SynthesisError::Model { handler, .. } | SynthesisError::NotAHandler { handler } => {
                handler
            }
        }
    }
}

/// A whole run could not complete.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Namespace assembly met an inconsistent model.
    #[error("namespace assembly failed: {0}")]
    Model(#[from] ModelError),
}
