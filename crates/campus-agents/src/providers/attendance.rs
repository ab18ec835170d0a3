//! Attendance provider - check-in and attendance queries over the store
//!
//! Store failures surface as error text the model can relay, matching the
//! recoverable-by-design delegation contract.

use super::{azure_client, collect_azure_settings, ProviderHandle};
use crate::agent::{ChatAgent, ChatAgentConfig};
use crate::error::{Error, Result};
use crate::provider::{
    required_env, AgentProvider, ProviderDescriptor, ProviderFactory, ProviderSettings,
};
use crate::skill::{Skill, SkillDefinition, SkillSet};
use crate::store::CampusStore;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

const DATABASE_URL: &str = "database_url";

/// Factory for the Attendance provider
#[derive(Debug, Default)]
pub struct AttendanceAgent;

impl AttendanceAgent {
    /// Create the factory
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ProviderFactory for AttendanceAgent {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(
            "Attendance",
            "Manages student and staff attendance for events, classes, and activities. \
             Can check people in to events and query attendance records.",
        )
        .with_operation("check_in_event", "Store a check-in event in the attendance store.")
        .with_operation("query_attendance", "Query attendance records from the attendance store.")
    }

    fn validate_configuration(&self) -> Result<ProviderSettings> {
        let mut settings = ProviderSettings::new();
        collect_azure_settings(&mut settings)?;
        settings.insert(
            DATABASE_URL.to_string(),
            required_env("CAMPUS_DATABASE_URL")?,
        );
        Ok(settings)
    }

    async fn initialize(&self, settings: ProviderSettings) -> Result<Arc<dyn AgentProvider>> {
        let client = azure_client(&settings)?;

        let url = settings
            .get(DATABASE_URL)
            .ok_or_else(|| Error::Initialization("database url missing".to_string()))?;
        let store = CampusStore::connect(url)
            .await
            .map_err(|e| Error::Initialization(e.to_string()))?;

        let mut skills = SkillSet::new();
        skills.register(Arc::new(CheckInEventSkill::new(store.clone())));
        skills.register(Arc::new(QueryAttendanceSkill::new(store)));

        let instructions = format!(
            "Current UTC time: {}\n\
             You are a helpful assistant that manages check-ins and attendance queries. \
             Use 'check_in_event' to record attendance, or 'query_attendance' to report \
             on it. Always confirm actions taken or information found. If there are any \
             issues with the database operations, clearly explain what went wrong.",
            Utc::now().to_rfc3339(),
        );

        let agent = ChatAgent::new(
            client,
            ChatAgentConfig::new("AttendanceAgent", instructions),
            skills,
        );
        Ok(Arc::new(ProviderHandle::new(self.descriptor(), agent)))
    }
}

// ============================================================================
// Skills
// ============================================================================

struct CheckInEventSkill {
    definition: SkillDefinition,
    store: CampusStore,
}

impl CheckInEventSkill {
    fn new(store: CampusStore) -> Self {
        Self {
            definition: SkillDefinition::new(
                "check_in_event",
                "Store a check-in event in the attendance store.",
            )
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string", "description": "The user checking in"},
                    "event_name": {"type": "string", "description": "The event name"}
                },
                "required": ["user_id", "event_name"]
            })),
            store,
        }
    }
}

#[derive(Deserialize)]
struct CheckInArgs {
    user_id: String,
    event_name: String,
}

#[async_trait::async_trait]
impl Skill for CheckInEventSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String> {
        let args: CheckInArgs =
            serde_json::from_value(input).map_err(|e| Error::Invocation(e.to_string()))?;

        match self.store.check_in(&args.user_id, &args.event_name).await {
            Ok(()) => Ok(format!(
                "Check-in successful for event '{}'.",
                args.event_name
            )),
            Err(e) => {
                warn!(error = %e, "Attendance store error");
                Ok("Error: Could not store the check-in record.".to_string())
            }
        }
    }
}

struct QueryAttendanceSkill {
    definition: SkillDefinition,
    store: CampusStore,
}

impl QueryAttendanceSkill {
    fn new(store: CampusStore) -> Self {
        Self {
            definition: SkillDefinition::new(
                "query_attendance",
                "Query attendance records from the attendance store.",
            )
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "string", "description": "The user to query"},
                    "event_name": {"type": "string", "description": "Optional specific event"}
                },
                "required": ["user_id"]
            })),
            store,
        }
    }
}

#[derive(Deserialize)]
struct QueryArgs {
    user_id: String,
    #[serde(default)]
    event_name: Option<String>,
}

#[async_trait::async_trait]
impl Skill for QueryAttendanceSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String> {
        let args: QueryArgs =
            serde_json::from_value(input).map_err(|e| Error::Invocation(e.to_string()))?;

        let events = match self
            .store
            .attended_events(&args.user_id, args.event_name.as_deref())
            .await
        {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Attendance store error");
                return Ok("Error: Could not query attendance records.".to_string());
            }
        };

        if events.is_empty() {
            let suffix = args
                .event_name
                .as_deref()
                .map(|e| format!(" for {}", e))
                .unwrap_or_default();
            return Ok(format!("No attendance records found{}.", suffix));
        }

        match args.event_name {
            Some(event) => Ok(format!("Yes, you have checked in to {}.", event)),
            None => Ok(format!("You checked in to: {}", events.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn check_in_skill() -> (CheckInEventSkill, QueryAttendanceSkill) {
        let store = CampusStore::connect("sqlite::memory:").await.unwrap();
        (
            CheckInEventSkill::new(store.clone()),
            QueryAttendanceSkill::new(store),
        )
    }

    #[test]
    fn test_descriptor() {
        let descriptor = AttendanceAgent::new().descriptor();
        assert_eq!(descriptor.name, "Attendance");
        assert_eq!(descriptor.operations.len(), 2);
    }

    #[tokio::test]
    async fn test_check_in_then_query_all() {
        let (check_in, query) = check_in_skill().await;

        let out = check_in
            .execute(serde_json::json!({"user_id": "s123", "event_name": "AI Lecture"}))
            .await
            .unwrap();
        assert_eq!(out, "Check-in successful for event 'AI Lecture'.");

        let out = query
            .execute(serde_json::json!({"user_id": "s123"}))
            .await
            .unwrap();
        assert_eq!(out, "You checked in to: AI Lecture");
    }

    #[tokio::test]
    async fn test_query_specific_event_yes_no() {
        let (check_in, query) = check_in_skill().await;
        check_in
            .execute(serde_json::json!({"user_id": "s123", "event_name": "AI Lecture"}))
            .await
            .unwrap();

        let yes = query
            .execute(serde_json::json!({"user_id": "s123", "event_name": "ai lecture"}))
            .await
            .unwrap();
        assert_eq!(yes, "Yes, you have checked in to ai lecture.");

        let no = query
            .execute(serde_json::json!({"user_id": "s123", "event_name": "Chemistry"}))
            .await
            .unwrap();
        assert_eq!(no, "No attendance records found for Chemistry.");
    }

    #[tokio::test]
    async fn test_query_unknown_user_empty() {
        let (_, query) = check_in_skill().await;
        let out = query
            .execute(serde_json::json!({"user_id": "nobody"}))
            .await
            .unwrap();
        assert_eq!(out, "No attendance records found.");
    }
}
