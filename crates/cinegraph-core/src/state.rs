//! UI-agnostic state types
//!
//! These are shared between the session, the dashboard and whatever front end
//! renders them. Nothing here depends on a UI framework or on the wire format.

use chrono::{DateTime, Utc};

/// Who produced a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    User,
    Assistant,
    Error,
}

/// A capability the reasoning service invoked while answering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub tool_name: String,
    /// Argument the agent passed to the tool, when the service reports it
    pub input: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// A successful answer from the reasoning service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub execution_time_secs: Option<f64>,
    pub reasoning: Vec<String>,
    pub context_used: Option<u32>,
}

impl AssistantReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_execution_time(mut self, secs: f64) -> Self {
        self.execution_time_secs = Some(secs);
        self
    }
}

/// One immutable record in the conversation log.
///
/// Entries are only constructed inside this crate and expose read-only
/// accessors, so once one is appended to a session log it cannot change.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    role: EntryRole,
    content: String,
    tool_calls: Vec<ToolCall>,
    execution_time_secs: Option<f64>,
    reasoning: Vec<String>,
    context_used: Option<u32>,
    timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub(crate) fn user(content: impl Into<String>) -> Self {
        Self::bare(EntryRole::User, content.into())
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self::bare(EntryRole::Error, message.into())
    }

    /// Timestamped with the local clock, never a server-provided time
    pub(crate) fn assistant(reply: AssistantReply) -> Self {
        Self {
            role: EntryRole::Assistant,
            content: reply.content,
            tool_calls: reply.tool_calls,
            execution_time_secs: reply.execution_time_secs,
            reasoning: reply.reasoning,
            context_used: reply.context_used,
            timestamp: Utc::now(),
        }
    }

    fn bare(role: EntryRole, content: String) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            execution_time_secs: None,
            reasoning: Vec::new(),
            context_used: None,
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> EntryRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn execution_time_secs(&self) -> Option<f64> {
        self.execution_time_secs
    }

    pub fn reasoning(&self) -> &[String] {
        &self.reasoning
    }

    pub fn context_used(&self) -> Option<u32> {
        self.context_used
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Whether a session has a query outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Pending,
}

/// Aggregate counts for the movie knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub movie_count: u64,
    pub entity_count: u64,
    pub genre_count: u64,
    pub relationship_count: u64,
}
