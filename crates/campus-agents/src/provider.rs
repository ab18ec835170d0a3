//! Capability-provider contract
//!
//! A provider wraps one external capability (calendar, IoT, speech,
//! attendance) behind a uniform describe/invoke contract. Factories run the
//! construct → validate → initialize lifecycle once at registry build; the
//! resulting provider lives for the process lifetime and is never mutated.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// One advertised operation of a provider.
///
/// Informational only: operations are described to the orchestrating model
/// but not separately invocable; the provider interprets the free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    /// Operation name
    pub name: String,
    /// What the operation does, as shown to the model
    pub description: String,
}

/// Name, description and operations of a provider.
///
/// The name is the dispatch key: case-sensitive and stable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Unique provider name
    pub name: String,
    /// Free text injected into the orchestrator's instructions
    pub description: String,
    /// Ordered operation descriptions
    pub operations: Vec<OperationSpec>,
}

impl ProviderDescriptor {
    /// Create a new descriptor
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            operations: Vec::new(),
        }
    }

    /// Add an operation description
    #[must_use]
    pub fn with_operation(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.operations.push(OperationSpec {
            name: name.into(),
            description: description.into(),
        });
        self
    }
}

/// Named settings resolved from the process environment at registry build.
/// Immutable after provider construction.
pub type ProviderSettings = HashMap<String, String>;

/// Read a required environment entry; fails closed when absent or empty.
///
/// # Errors
/// Returns `Error::Configuration` naming the missing variable.
pub fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Configuration(format!("{} is not set", key)))
}

/// Read an optional environment entry with a default.
#[must_use]
pub fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// An initialized capability provider.
#[async_trait::async_trait]
pub trait AgentProvider: Send + Sync {
    /// The provider's descriptor; pure, no side effects
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Handle a free-text query and return a synthesized text result
    async fn invoke(&self, query: &str) -> Result<String>;
}

/// A candidate provider awaiting the validate → initialize lifecycle.
#[async_trait::async_trait]
pub trait ProviderFactory: Send + Sync {
    /// The descriptor; callable before and after initialization
    fn descriptor(&self) -> ProviderDescriptor;

    /// Inspect named environment entries. Fails closed on a missing required
    /// entry; optional tuning parameters may default.
    ///
    /// # Errors
    /// Returns `Error::Configuration` on a missing required entry.
    fn validate_configuration(&self) -> Result<ProviderSettings>;

    /// Establish the model-service connection and collaborator handle.
    /// Called at most once per provider name per process.
    ///
    /// # Errors
    /// Returns `Error::Initialization` when a collaborator cannot be built.
    async fn initialize(&self, settings: ProviderSettings) -> Result<Arc<dyn AgentProvider>>;
}
