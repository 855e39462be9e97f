//! JSON shapes exchanged with the reasoning service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{AssistantReply, DashboardStats, ToolCall};

#[derive(Serialize)]
pub(crate) struct AskRequest<'a> {
    pub query: &'a str,
}

/// Only `answer` is required; everything else degrades to empty
#[derive(Deserialize)]
pub(crate) struct AskResponse {
    answer: String,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
    #[serde(default)]
    execution_time: Option<f64>,
    #[serde(default)]
    reasoning: Vec<String>,
    #[serde(default)]
    context_used: Option<u32>,
}

#[derive(Deserialize)]
struct WireToolCall {
    tool: String,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Deserialize)]
pub(crate) struct GraphInfoResponse {
    total_movies: u64,
    total_people: u64,
    total_genres: u64,
    total_relationships: u64,
}

/// Body of the `GET /` liveness probe
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub neo4j_connected: bool,
    #[serde(default)]
    pub llm_available: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl From<AskResponse> for AssistantReply {
    fn from(response: AskResponse) -> Self {
        let tool_calls = response
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                tool_name: call.tool,
                input: call.input.map(|value| match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                }),
            })
            .collect();

        Self {
            content: response.answer,
            tool_calls,
            execution_time_secs: response.execution_time,
            reasoning: response.reasoning,
            context_used: response.context_used,
        }
    }
}

impl From<GraphInfoResponse> for DashboardStats {
    fn from(response: GraphInfoResponse) -> Self {
        Self {
            movie_count: response.total_movies,
            entity_count: response.total_people,
            genre_count: response.total_genres,
            relationship_count: response.total_relationships,
        }
    }
}
