//! Campus Agents - agent registry and delegation protocol
//!
//! The core of the Campus assistant:
//! - Provider contract: describe / validate / initialize / invoke
//! - Registry: built once at startup, failures excluded and reported
//! - Prompt composer: deterministic capability block for the triage model
//! - Delegation dispatcher: the single tool exposed to the triage model
//! - Triage orchestrator: the per-request turn state machine
//! - The four provider variants: Calendar, IoT, Speech, Attendance

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agent;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod history;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod skill;
pub mod store;
pub mod triage;

pub use agent::{ChatAgent, ChatAgentConfig};
pub use dispatch::{DelegationDispatcher, DelegationRequest, DELEGATE_TOOL_NAME};
pub use error::{Error, Result};
pub use graph::{GraphCalendarClient, GraphCalendarConfig, GraphEvent};
pub use history::{
    ConversationHistory, HistoryEntry, SessionStore, DEFAULT_HISTORY_CAP, DEFAULT_SESSION,
};
pub use prompt::compose;
pub use provider::{
    AgentProvider, OperationSpec, ProviderDescriptor, ProviderFactory, ProviderSettings,
};
pub use providers::{AttendanceAgent, CalendarAgent, IoTAgent, SpeechAgent};
pub use registry::{build_registry, ProviderFailure, ProviderRegistry};
pub use skill::{Skill, SkillDefinition, SkillSet};
pub use store::{CampusStore, TelemetryRecord};
pub use triage::{TriageAgent, TriageConfig};
