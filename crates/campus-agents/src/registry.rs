//! Provider registry - built once at startup, read-only afterwards
//!
//! Each candidate factory runs construct → validate → initialize in list
//! order. A failure at any step excludes that provider and is recorded; it
//! never aborts the build. Successful entries keep insertion order so prompt
//! composition is deterministic.

use crate::provider::{AgentProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{info, warn};

/// A provider that failed registry build, with the error that excluded it
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    /// Provider name
    pub name: String,
    /// The configuration or initialization error, rendered
    pub error: String,
}

/// The set of successfully initialized providers, keyed by name
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<Arc<dyn AgentProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a provider by exact name. No fuzzy matching, no case folding.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn AgentProvider>> {
        self.entries
            .iter()
            .find(|p| p.descriptor().name == name)
            .cloned()
    }

    /// Registered provider names, in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|p| p.descriptor().name.clone())
            .collect()
    }

    /// Iterate providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn AgentProvider>> {
        self.entries.iter()
    }

    /// Provider count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, provider: Arc<dyn AgentProvider>) {
        self.entries.push(provider);
    }
}

/// Build the registry from candidate factories, in list order.
///
/// Never fails: candidates that error during validation or initialization
/// are excluded, logged, and reported in the returned failure list.
pub async fn build_registry(
    factories: &[Arc<dyn ProviderFactory>],
) -> (ProviderRegistry, Vec<ProviderFailure>) {
    let mut registry = ProviderRegistry::new();
    let mut failures = Vec::new();

    for factory in factories {
        let name = factory.descriptor().name;
        info!(provider = %name, "Initializing provider");

        let settings = match factory.validate_configuration() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(provider = %name, error = %e, "Provider excluded: configuration invalid");
                failures.push(ProviderFailure {
                    name,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match factory.initialize(settings).await {
            Ok(provider) => {
                info!(provider = %name, "Provider initialized");
                registry.insert(provider);
            }
            Err(e) => {
                warn!(provider = %name, error = %e, "Provider excluded: initialization failed");
                failures.push(ProviderFailure {
                    name,
                    error: e.to_string(),
                });
            }
        }
    }

    (registry, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::provider::{ProviderDescriptor, ProviderSettings};

    pub(crate) struct StaticProvider {
        descriptor: ProviderDescriptor,
        response: String,
    }

    impl StaticProvider {
        pub(crate) fn new(name: &str, response: &str) -> Self {
            Self {
                descriptor: ProviderDescriptor::new(name, format!("{} test provider", name))
                    .with_operation("noop", "Does nothing"),
                response: response.to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl AgentProvider for StaticProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, _query: &str) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    enum Behavior {
        Succeed,
        FailValidation,
        FailInitialization,
    }

    struct TestFactory {
        name: &'static str,
        behavior: Behavior,
    }

    #[async_trait::async_trait]
    impl ProviderFactory for TestFactory {
        fn descriptor(&self) -> ProviderDescriptor {
            ProviderDescriptor::new(self.name, "test")
        }

        fn validate_configuration(&self) -> Result<ProviderSettings> {
            match self.behavior {
                Behavior::FailValidation => {
                    Err(Error::Configuration("TEST_KEY is not set".to_string()))
                }
                _ => Ok(ProviderSettings::new()),
            }
        }

        async fn initialize(
            &self,
            _settings: ProviderSettings,
        ) -> Result<Arc<dyn AgentProvider>> {
            match self.behavior {
                Behavior::FailInitialization => {
                    Err(Error::Initialization("service unreachable".to_string()))
                }
                _ => Ok(Arc::new(StaticProvider::new(self.name, "ok"))),
            }
        }
    }

    fn factory(name: &'static str, behavior: Behavior) -> Arc<dyn ProviderFactory> {
        Arc::new(TestFactory { name, behavior })
    }

    #[tokio::test]
    async fn test_build_excludes_failing_candidates() {
        let factories = vec![
            factory("Calendar", Behavior::Succeed),
            factory("Speech", Behavior::FailValidation),
            factory("IoT", Behavior::Succeed),
            factory("Attendance", Behavior::FailInitialization),
        ];

        let (registry, failures) = build_registry(&factories).await;

        assert_eq!(registry.names(), vec!["Calendar", "IoT"]);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].name, "Speech");
        assert!(failures[0].error.contains("TEST_KEY"));
        assert_eq!(failures[1].name, "Attendance");
    }

    #[tokio::test]
    async fn test_lookup_exact_match_only() {
        let factories = vec![factory("Calendar", Behavior::Succeed)];
        let (registry, _) = build_registry(&factories).await;

        assert!(registry.lookup("Calendar").is_some());
        assert!(registry.lookup("calendar").is_none());
        assert!(registry.lookup("Cal").is_none());
    }

    #[tokio::test]
    async fn test_empty_build() {
        let (registry, failures) = build_registry(&[]).await;
        assert!(registry.is_empty());
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn test_order_is_insertion_order() {
        let factories = vec![
            factory("B", Behavior::Succeed),
            factory("A", Behavior::Succeed),
            factory("C", Behavior::Succeed),
        ];
        let (registry, _) = build_registry(&factories).await;
        assert_eq!(registry.names(), vec!["B", "A", "C"]);
    }
}
