//! Calendar provider - Microsoft Graph behind four skills

use super::{azure_client, collect_azure_settings, ProviderHandle};
use crate::agent::{ChatAgent, ChatAgentConfig};
use crate::error::Result;
use crate::graph::{
    parse_graph_datetime, GraphCalendarClient, GraphCalendarConfig, DEFAULT_SLOT_MINUTES,
};
use crate::provider::{AgentProvider, ProviderDescriptor, ProviderFactory, ProviderSettings};
use crate::skill::{Skill, SkillDefinition, SkillSet};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

const GRAPH_ACCESS_TOKEN: &str = "graph_access_token";
const DISPLAY_OFFSET: &str = "display_offset_minutes";
const DISPLAY_LABEL: &str = "display_label";

/// Factory for the Calendar provider
#[derive(Debug, Default)]
pub struct CalendarAgent;

impl CalendarAgent {
    /// Create the factory
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ProviderFactory for CalendarAgent {
    fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(
            "Calendar",
            "Handles all calendar-related operations including scheduling meetings, \
             finding free slots, canceling events, and reporting on schedules. Works \
             with Microsoft Graph API to manage calendar events.",
        )
        .with_operation("create_event", "Create a calendar event via Microsoft Graph API.")
        .with_operation("find_free_slots", "Find free calendar slots via Microsoft Graph API.")
        .with_operation(
            "cancel_events",
            "Cancel (delete) calendar events by name and/or time range.",
        )
        .with_operation(
            "report_schedule",
            "List all calendar events in the given range with display-time start/end.",
        )
    }

    fn validate_configuration(&self) -> Result<ProviderSettings> {
        let mut settings = ProviderSettings::new();
        collect_azure_settings(&mut settings)?;

        let graph = GraphCalendarConfig::from_env()?;
        settings.insert(GRAPH_ACCESS_TOKEN.to_string(), graph.access_token);
        settings.insert(
            DISPLAY_OFFSET.to_string(),
            graph.display_offset_minutes.to_string(),
        );
        settings.insert(DISPLAY_LABEL.to_string(), graph.display_label);
        Ok(settings)
    }

    async fn initialize(&self, settings: ProviderSettings) -> Result<Arc<dyn AgentProvider>> {
        let client = azure_client(&settings)?;

        let mut graph_config = GraphCalendarConfig::new(
            settings.get(GRAPH_ACCESS_TOKEN).cloned().unwrap_or_default(),
        );
        if let Some(offset) = settings.get(DISPLAY_OFFSET) {
            graph_config.display_offset_minutes = offset.parse().unwrap_or(0);
        }
        if let Some(label) = settings.get(DISPLAY_LABEL) {
            graph_config.display_label = label.clone();
        }
        let graph = Arc::new(GraphCalendarClient::new(graph_config)?);

        let mut skills = SkillSet::new();
        skills.register(Arc::new(CreateEventSkill::new(Arc::clone(&graph))));
        skills.register(Arc::new(FindFreeSlotsSkill::new(Arc::clone(&graph))));
        skills.register(Arc::new(CancelEventsSkill::new(Arc::clone(&graph))));
        skills.register(Arc::new(ReportScheduleSkill::new(Arc::clone(&graph))));

        let instructions = format!(
            "Current UTC time: {}\n\
             You are a helpful assistant that can schedule or cancel calendar events and \
             report the schedule in {} time. Use the function calling capability to invoke \
             create_event, find_free_slots, cancel_events, or report_schedule as needed. \
             Always confirm actions taken or information found.",
            Utc::now().to_rfc3339(),
            graph.display_label(),
        );

        let agent = ChatAgent::new(
            client,
            ChatAgentConfig::new("CalendarAgent", instructions),
            skills,
        );
        Ok(Arc::new(ProviderHandle::new(self.descriptor(), agent)))
    }
}

// ============================================================================
// Skills
// ============================================================================

struct CreateEventSkill {
    definition: SkillDefinition,
    graph: Arc<GraphCalendarClient>,
}

impl CreateEventSkill {
    fn new(graph: Arc<GraphCalendarClient>) -> Self {
        Self {
            definition: SkillDefinition::new(
                "create_event",
                "Create a calendar event via Microsoft Graph API.",
            )
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "Event subject"},
                    "start": {"type": "string", "description": "Start time, UTC ISO 8601"},
                    "end": {"type": "string", "description": "End time, UTC ISO 8601"}
                },
                "required": ["subject", "start", "end"]
            })),
            graph,
        }
    }
}

#[derive(Deserialize)]
struct CreateEventArgs {
    subject: String,
    start: String,
    end: String,
}

#[async_trait::async_trait]
impl Skill for CreateEventSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String> {
        let args: CreateEventArgs = serde_json::from_value(input)
            .map_err(|e| crate::error::Error::Invocation(e.to_string()))?;
        self.graph
            .create_event(&args.subject, &args.start, &args.end)
            .await?;
        Ok(format!(
            "Scheduled '{}' from {} to {}.",
            args.subject, args.start, args.end
        ))
    }
}

struct FindFreeSlotsSkill {
    definition: SkillDefinition,
    graph: Arc<GraphCalendarClient>,
}

impl FindFreeSlotsSkill {
    fn new(graph: Arc<GraphCalendarClient>) -> Self {
        Self {
            definition: SkillDefinition::new(
                "find_free_slots",
                "Find free calendar slots via Microsoft Graph API.",
            )
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "start_range": {"type": "string", "description": "Range start, UTC ISO 8601"},
                    "end_range": {"type": "string", "description": "Range end, UTC ISO 8601"},
                    "duration_minutes": {"type": "integer", "description": "Slot length in minutes (default 30)"}
                },
                "required": ["start_range", "end_range"]
            })),
            graph,
        }
    }
}

fn default_duration() -> i64 {
    DEFAULT_SLOT_MINUTES
}

#[derive(Deserialize)]
struct FindFreeSlotsArgs {
    start_range: String,
    end_range: String,
    #[serde(default = "default_duration")]
    duration_minutes: i64,
}

#[async_trait::async_trait]
impl Skill for FindFreeSlotsSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String> {
        let args: FindFreeSlotsArgs = serde_json::from_value(input)
            .map_err(|e| crate::error::Error::Invocation(e.to_string()))?;
        let slots = self
            .graph
            .free_slots(&args.start_range, &args.end_range, args.duration_minutes)
            .await?;

        if slots.is_empty() {
            return Ok("No free slots found.".to_string());
        }
        let lines: Vec<String> = slots
            .iter()
            .map(|(start, end)| format!("{} to {}", start.to_rfc3339(), end.to_rfc3339()))
            .collect();
        Ok(format!("Free slots:\n{}", lines.join("\n")))
    }
}

struct CancelEventsSkill {
    definition: SkillDefinition,
    graph: Arc<GraphCalendarClient>,
}

impl CancelEventsSkill {
    fn new(graph: Arc<GraphCalendarClient>) -> Self {
        Self {
            definition: SkillDefinition::new(
                "cancel_events",
                "Cancel (delete) calendar events by name and/or time range. Provide a \
                 subject substring (optional) and/or a start/end UTC ISO window.",
            )
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "start_range": {"type": "string", "description": "Range start, UTC ISO 8601"},
                    "end_range": {"type": "string", "description": "Range end, UTC ISO 8601"},
                    "subject": {"type": "string", "description": "Subject substring filter"}
                },
                "required": ["start_range", "end_range"]
            })),
            graph,
        }
    }
}

#[derive(Deserialize)]
struct CancelEventsArgs {
    start_range: String,
    end_range: String,
    #[serde(default)]
    subject: Option<String>,
}

#[async_trait::async_trait]
impl Skill for CancelEventsSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String> {
        let args: CancelEventsArgs = serde_json::from_value(input)
            .map_err(|e| crate::error::Error::Invocation(e.to_string()))?;
        let events = self
            .graph
            .calendar_view(&args.start_range, &args.end_range)
            .await?;

        if events.is_empty() {
            return Ok("No events found in that time range.".to_string());
        }

        let matches: Vec<_> = events
            .into_iter()
            .filter(|ev| match &args.subject {
                Some(filter) => ev
                    .subject_or_placeholder()
                    .to_lowercase()
                    .contains(&filter.to_lowercase()),
                None => true,
            })
            .collect();

        if matches.is_empty() {
            return Ok(format!(
                "No events matching \"{}\" found between {} and {}.",
                args.subject.as_deref().unwrap_or(""),
                args.start_range,
                args.end_range
            ));
        }

        let mut deleted = Vec::with_capacity(matches.len());
        for event in matches {
            let start_utc = parse_graph_datetime(&event.start.date_time)?;
            self.graph.delete_event(&event.id).await?;
            deleted.push(format!(
                "\"{}\" at {}",
                event.subject_or_placeholder(),
                self.graph.display_time(start_utc)
            ));
        }

        let mut lines = vec!["Deleted the following events:".to_string()];
        lines.extend(deleted.into_iter().map(|d| format!("- {}", d)));
        Ok(lines.join("\n"))
    }
}

struct ReportScheduleSkill {
    definition: SkillDefinition,
    graph: Arc<GraphCalendarClient>,
}

impl ReportScheduleSkill {
    fn new(graph: Arc<GraphCalendarClient>) -> Self {
        Self {
            definition: SkillDefinition::new(
                "report_schedule",
                "List all calendar events in the given range, reporting subject and \
                 display-time start/end.",
            )
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "start_range": {"type": "string", "description": "Range start, UTC ISO 8601"},
                    "end_range": {"type": "string", "description": "Range end, UTC ISO 8601"}
                },
                "required": ["start_range", "end_range"]
            })),
            graph,
        }
    }
}

#[derive(Deserialize)]
struct ReportScheduleArgs {
    start_range: String,
    end_range: String,
}

#[async_trait::async_trait]
impl Skill for ReportScheduleSkill {
    fn definition(&self) -> &SkillDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<String> {
        let args: ReportScheduleArgs = serde_json::from_value(input)
            .map_err(|e| crate::error::Error::Invocation(e.to_string()))?;
        let events = self
            .graph
            .calendar_view(&args.start_range, &args.end_range)
            .await?;

        if events.is_empty() {
            return Ok("You have no events in that time range.".to_string());
        }

        let mut lines = vec!["Your events:".to_string()];
        for event in &events {
            let start_utc = parse_graph_datetime(&event.start.date_time)?;
            let end_utc = parse_graph_datetime(&event.end.date_time)?;
            lines.push(format!(
                "- {}: {} to {} ({} time)",
                event.subject_or_placeholder(),
                self.graph.display_time(start_utc),
                self.graph.display_time(end_utc),
                self.graph.display_label(),
            ));
        }
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_operations() {
        let descriptor = CalendarAgent::new().descriptor();
        assert_eq!(descriptor.name, "Calendar");
        let names: Vec<_> = descriptor.operations.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "create_event",
                "find_free_slots",
                "cancel_events",
                "report_schedule"
            ]
        );
    }

    #[test]
    fn test_free_slot_args_default_duration() {
        let args: FindFreeSlotsArgs = serde_json::from_value(serde_json::json!({
            "start_range": "2025-03-03T09:00:00Z",
            "end_range": "2025-03-03T17:00:00Z"
        }))
        .unwrap();
        assert_eq!(args.duration_minutes, 30);
    }
}
