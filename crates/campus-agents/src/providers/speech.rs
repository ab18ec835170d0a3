//! Speech provider - microphone recognition behind a single skill

use super::{azure_client, collect_azure_settings, ProviderHandle};
use crate::agent::{ChatAgent, ChatAgentConfig};
use crate::error::{Error, Result};
use crate::provider::{
    required_env, AgentProvider, ProviderDescriptor, ProviderFactory, ProviderSettings,
};
use crate::skill::{Skill, SkillDefinition, SkillSet};
use campus_audio::{SpeechConfig, VoiceGateway};
use chrono::Utc;
use std::sync::Arc;

const SPEECH_KEY: &str = "speech_key";
const SPEECH_REGION: &str = "speech_region";

/// Factory for the Speech provider
#[derive(Debug, Default)]
pub struct SpeechAgent;

impl SpeechAgent {
    /// Create the factory
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ProviderFactory for SpeechAgent {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(
            "Speech",
            "Handles speech recognition tasks, converting spoken words into text using \
             the speech service's speech-to-text capabilities. Can be used for voice \
             commands and dictation.",
        )
        .with_operation(
            "listen_to_speech",
            "Listen to speech input from microphone and convert to text",
        )
    }

    fn validate_configuration(&self) -> Result<ProviderSettings> {
        let mut settings = ProviderSettings::new();
        collect_azure_settings(&mut settings)?;
        settings.insert(SPEECH_KEY.to_string(), required_env("SPEECH_KEY")?);
        settings.insert(SPEECH_REGION.to_string(), required_env("SPEECH_REGION")?);
        Ok(settings)
    }

    async fn initialize(&self, settings: ProviderSettings) -> Result<Arc<dyn AgentProvider>> {
        let client = azure_client(&settings)?;

        let speech_config = SpeechConfig::new(
            settings.get(SPEECH_KEY).cloned().unwrap_or_default(),
            settings.get(SPEECH_REGION).cloned().unwrap_or_default(),
        );
        let voice = Arc::new(
            VoiceGateway::new(speech_config).map_err(|e| Error::Initialization(e.to_string()))?,
        );

        let mut skills = SkillSet::new();
        skills.register(Arc::new(ListenToSpeechSkill::new(voice)));

        let instructions = format!(
            "Current UTC time: {}\n\
             You are a helpful assistant that can convert speech to text using the \
             microphone. Use the 'listen_to_speech' function to capture voice input. \
             Always confirm when you've captured speech and what was recognized. If \
             there are any issues with speech recognition, clearly explain what went \
             wrong.",
            Utc::now().to_rfc3339(),
        );

        let agent = ChatAgent::new(
            client,
            ChatAgentConfig::new("SpeechAgent", instructions),
            skills,
        );
        Ok(Arc::new(ProviderHandle::new(self.descriptor(), agent)))
    }
}

struct ListenToSpeechSkill {
    definition: SkillDefinition,
    voice: Arc<VoiceGateway>,
}

impl ListenToSpeechSkill {
    fn new(voice: Arc<VoiceGateway>) -> Self {
        Self {
            definition: SkillDefinition::new(
                "listen_to_speech",
                "Listen to speech input from microphone and convert to text",
            ),
            voice,
        }
    }
}

#[async_trait::async_trait]
impl Skill for ListenToSpeechSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, _input: serde_json::Value) -> Result<String> {
        let text = self.voice.recognize_once().await?;
        if text.is_empty() {
            return Ok("No speech was recognized.".to_string());
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor() {
        let descriptor = SpeechAgent::new().descriptor();
        assert_eq!(descriptor.name, "Speech");
        assert_eq!(descriptor.operations[0].name, "listen_to_speech");
    }
}
