//! Skills - the callable operations behind a provider's inner agent
//!
//! Each provider exposes its collaborator through a small set of skills that
//! its own chat agent can call. A skill carries a tool schema and an async
//! execute; failures inside the collaborator surface as error text the model
//! can read, not as exceptions.

use crate::error::{Error, Result};
use campus_llm::ToolDefinition;
use std::sync::Arc;
use tracing::debug;

/// Skill metadata and parameter schema
#[derive(Debug, Clone)]
pub struct SkillDefinition {
    /// Unique skill name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for parameters
    pub parameters: serde_json::Value,
}

impl SkillDefinition {
    /// Create a new skill definition with an empty parameter schema
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// Set the parameter schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Trait for skill implementations
#[async_trait::async_trait]
pub trait Skill: Send + Sync {
    /// Get the skill definition
    fn definition(&self) -> &SkillDefinition;

    /// Execute the skill with the given input
    async fn execute(&self, input: serde_json::Value) -> Result<String>;

    /// Validate input before execution
    fn validate_input(&self, input: &serde_json::Value) -> Result<()> {
        if !input.is_object() {
            return Err(Error::Invocation("input must be an object".to_string()));
        }
        Ok(())
    }
}

/// An ordered set of skills belonging to one provider
#[derive(Default)]
pub struct SkillSet {
    skills: Vec<Arc<dyn Skill>>,
}

impl SkillSet {
    /// Create an empty skill set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill, preserving registration order
    pub fn register(&mut self, skill: Arc<dyn Skill>) {
        debug!(skill = %skill.definition().name, "Registering skill");
        self.skills.push(skill);
    }

    /// Get a skill by exact name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills
            .iter()
            .find(|s| s.definition().name == name)
            .cloned()
    }

    /// List skill names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.skills
            .iter()
            .map(|s| s.definition().name.as_str())
            .collect()
    }

    /// Skill count
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Convert definitions to the model's tool format
    #[must_use]
    pub fn to_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.skills
            .iter()
            .map(|s| {
                let def = s.definition();
                ToolDefinition::new(&def.name, &def.description, def.parameters.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoSkill {
        definition: SkillDefinition,
    }

    impl EchoSkill {
        fn new() -> Self {
            Self {
                definition: SkillDefinition::new("echo", "Echo the input back"),
            }
        }
    }

    #[async_trait::async_trait]
    impl Skill for EchoSkill {
        fn definition(&self) -> &SkillDefinition {
            &self.definition
        }

        async fn execute(&self, input: serde_json::Value) -> Result<String> {
            Ok(input.to_string())
        }
    }

    #[test]
    fn test_skill_definition_builder() {
        let def = SkillDefinition::new("create_event", "Create a calendar event").with_parameters(
            serde_json::json!({
                "type": "object",
                "properties": {"subject": {"type": "string"}},
                "required": ["subject"]
            }),
        );
        assert_eq!(def.name, "create_event");
        assert_eq!(def.parameters["required"][0], "subject");
    }

    #[test]
    fn test_skill_set_registration_order() {
        let mut set = SkillSet::new();
        assert!(set.is_empty());
        set.register(Arc::new(EchoSkill::new()));
        assert_eq!(set.len(), 1);
        assert_eq!(set.names(), vec!["echo"]);
        assert!(set.get("echo").is_some());
        assert!(set.get("Echo").is_none()); // exact match only
    }

    #[test]
    fn test_to_tool_definitions() {
        let mut set = SkillSet::new();
        set.register(Arc::new(EchoSkill::new()));
        let tools = set.to_tool_definitions();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
    }

    #[tokio::test]
    async fn test_execute() {
        let skill = EchoSkill::new();
        let out = skill.execute(serde_json::json!({"a": 1})).await.unwrap();
        assert_eq!(out, r#"{"a":1}"#);
    }
}
