//! Capability-prompt composition
//!
//! Renders each registered provider's descriptor into a fixed template and
//! joins the blocks. Deterministic for an unchanged registry, which keeps
//! orchestrator behavior reproducible under test.

use crate::provider::ProviderDescriptor;
use crate::registry::ProviderRegistry;

fn render(descriptor: &ProviderDescriptor) -> String {
    let functions = descriptor
        .operations
        .iter()
        .map(|op| format!("    *   `{}`: {}", op.name, op.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "The {} agent:\n{}\n\nAvailable functions:\n{}",
        descriptor.name, descriptor.description, functions
    )
}

/// Compose the capability block consumed by the orchestrating model
#[must_use]
pub fn compose(registry: &ProviderRegistry) -> String {
    registry
        .iter()
        .map(|provider| render(provider.descriptor()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AgentProvider, ProviderDescriptor, ProviderFactory, ProviderSettings};
    use crate::registry::build_registry;
    use std::sync::Arc;

    struct FixedProvider {
        descriptor: ProviderDescriptor,
    }

    #[async_trait::async_trait]
    impl AgentProvider for FixedProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, _query: &str) -> crate::error::Result<String> {
            Ok(String::new())
        }
    }

    struct FixedFactory {
        descriptor: ProviderDescriptor,
    }

    #[async_trait::async_trait]
    impl ProviderFactory for FixedFactory {
        fn descriptor(&self) -> ProviderDescriptor {
            self.descriptor.clone()
        }

        fn validate_configuration(&self) -> crate::error::Result<ProviderSettings> {
            Ok(ProviderSettings::new())
        }

        async fn initialize(
            &self,
            _settings: ProviderSettings,
        ) -> crate::error::Result<Arc<dyn AgentProvider>> {
            Ok(Arc::new(FixedProvider {
                descriptor: self.descriptor.clone(),
            }))
        }
    }

    async fn two_provider_registry() -> ProviderRegistry {
        let factories: Vec<Arc<dyn ProviderFactory>> = vec![
            Arc::new(FixedFactory {
                descriptor: ProviderDescriptor::new("Calendar", "Handles calendar operations.")
                    .with_operation("create_event", "Create a calendar event")
                    .with_operation("report_schedule", "List events in a range"),
            }),
            Arc::new(FixedFactory {
                descriptor: ProviderDescriptor::new("IoT", "Monitors campus sensors.")
                    .with_operation("get_latest_telemetry", "Fetch latest sensor readings"),
            }),
        ];
        build_registry(&factories).await.0
    }

    #[tokio::test]
    async fn test_template_shape() {
        let registry = two_provider_registry().await;
        let prompt = compose(&registry);

        assert!(prompt.starts_with("The Calendar agent:\nHandles calendar operations."));
        assert!(prompt.contains("Available functions:\n    *   `create_event`: Create a calendar event"));
        assert!(prompt.contains("\n\nThe IoT agent:"));
    }

    #[tokio::test]
    async fn test_composition_is_deterministic() {
        let registry = two_provider_registry().await;
        let first = compose(&registry);
        let second = compose(&registry);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_registry_composes_empty() {
        let registry = ProviderRegistry::new();
        assert_eq!(compose(&registry), "");
    }
}
