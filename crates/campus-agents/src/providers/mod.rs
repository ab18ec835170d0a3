//! The capability-provider variants
//!
//! Each variant is a factory that resolves its settings from the process
//! environment, builds its own chat client and collaborator handle, and
//! returns a `ProviderHandle` wrapping a skill-equipped inner agent.

pub mod attendance;
pub mod calendar;
pub mod iot;
pub mod speech;

pub use attendance::AttendanceAgent;
pub use calendar::CalendarAgent;
pub use iot::IoTAgent;
pub use speech::SpeechAgent;

use crate::agent::ChatAgent;
use crate::error::{Error, Result};
use crate::provider::{
    optional_env, required_env, AgentProvider, ProviderDescriptor, ProviderSettings,
};
use campus_llm::{AzureChatClient, AzureOpenAiConfig};
use std::sync::Arc;

pub(crate) const AZURE_ENDPOINT: &str = "azure_endpoint";
pub(crate) const AZURE_API_KEY: &str = "azure_api_key";
pub(crate) const AZURE_DEPLOYMENT: &str = "azure_deployment";
pub(crate) const AZURE_API_VERSION: &str = "azure_api_version";

/// Resolve the model-service settings shared by every provider.
///
/// # Errors
/// Fails closed when a required credential is absent.
pub(crate) fn collect_azure_settings(settings: &mut ProviderSettings) -> Result<()> {
    settings.insert(
        AZURE_ENDPOINT.to_string(),
        required_env("AZURE_OPENAI_API_ENDPOINT")?,
    );
    settings.insert(
        AZURE_API_KEY.to_string(),
        required_env("AZURE_OPENAI_API_KEY")?,
    );
    settings.insert(
        AZURE_DEPLOYMENT.to_string(),
        optional_env(
            "AZURE_OPENAI_CHAT_DEPLOYMENT_NAME",
            campus_llm::azure::DEFAULT_DEPLOYMENT,
        ),
    );
    settings.insert(
        AZURE_API_VERSION.to_string(),
        optional_env(
            "AZURE_OPENAI_API_VERSION",
            campus_llm::azure::DEFAULT_API_VERSION,
        ),
    );
    Ok(())
}

fn setting<'a>(settings: &'a ProviderSettings, key: &str) -> Result<&'a str> {
    settings
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::Initialization(format!("setting '{}' missing", key)))
}

/// Build the provider's own chat client from validated settings.
pub(crate) fn azure_client(settings: &ProviderSettings) -> Result<Arc<AzureChatClient>> {
    let config = AzureOpenAiConfig::new(
        setting(settings, AZURE_ENDPOINT)?,
        setting(settings, AZURE_API_KEY)?,
    )
    .with_deployment(setting(settings, AZURE_DEPLOYMENT)?)
    .with_api_version(setting(settings, AZURE_API_VERSION)?);

    AzureChatClient::new(config)
        .map(Arc::new)
        .map_err(|e| Error::Initialization(e.to_string()))
}

/// An initialized provider: descriptor plus its inner skill-equipped agent
pub(crate) struct ProviderHandle {
    descriptor: ProviderDescriptor,
    agent: ChatAgent,
}

impl ProviderHandle {
    pub(crate) fn new(descriptor: ProviderDescriptor, agent: ChatAgent) -> Self {
        Self { descriptor, agent }
    }
}

#[async_trait::async_trait]
impl AgentProvider for ProviderHandle {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, query: &str) -> Result<String> {
        self.agent.invoke(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_azure_client_requires_settings() {
        let settings = ProviderSettings::new();
        let err = azure_client(&settings).unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[test]
    fn test_azure_client_from_complete_settings() {
        let mut settings = ProviderSettings::new();
        settings.insert(
            AZURE_ENDPOINT.to_string(),
            "https://example.openai.azure.com".to_string(),
        );
        settings.insert(AZURE_API_KEY.to_string(), "key".to_string());
        settings.insert(AZURE_DEPLOYMENT.to_string(), "gpt-4o-mini".to_string());
        settings.insert(
            AZURE_API_VERSION.to_string(),
            "2024-12-01-preview".to_string(),
        );
        let client = azure_client(&settings).unwrap();
        assert_eq!(client.deployment(), "gpt-4o-mini");
    }
}
