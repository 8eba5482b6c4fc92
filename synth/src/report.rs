//! Synthesis report types: diagnostics, failures and batch aggregation.

use serde::Serialize;

use crate::descriptor::ResourceMethodDescriptor;
use crate::error::SynthesisError;

/// A warning-level note about a declaration that degraded to a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Label of the declaration the note is about.
    pub declaration: String,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(declaration: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            declaration: declaration.into(),
            message: message.into(),
        }
    }
}

/// Aggregated result of synthesizing a batch of handler methods.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    /// One descriptor per handler that synthesized, in input order.
    pub descriptors: Vec<ResourceMethodDescriptor>,
    /// One error per handler that could not be synthesized, in input order.
    pub failures: Vec<SynthesisError>,
}

impl SynthesisReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a synthesized descriptor.
    pub fn push(&mut self, descriptor: ResourceMethodDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Appends a failure.
    pub fn push_failure(&mut self, failure: SynthesisError) {
        self.failures.push(failure);
    }

    /// Returns the count of handlers that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if every handler synthesized.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every diagnostic recorded by the synthesized descriptors.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.descriptors.iter().flat_map(|d| d.diagnostics().iter())
    }
}
