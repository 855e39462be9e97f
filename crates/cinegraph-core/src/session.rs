//! Conversation session: the append-only log plus single-flight query handling
//!
//! A query runs in two phases. [`Session::submit`] is synchronous: it checks
//! the guard, appends the user's entry and spawns the request. The second
//! transition happens when the owner observes completion, either by polling
//! from its event loop ([`Session::poll`]) or by awaiting ([`Session::settle`]).
//! Exactly one assistant or error entry is appended per accepted submission,
//! and the session is idle again afterwards no matter how the request ended.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::api::{GraphService, TransportError};
use crate::state::{AssistantReply, ConversationEntry, EntryRole, SessionStatus};

/// Shown for every failed query; the cause only goes to the log
pub const ERROR_MESSAGE: &str = "Failed to access the graph. Check your connection.";

type QueryTask = JoinHandle<Result<AssistantReply, TransportError>>;

pub struct Session {
    service: Arc<dyn GraphService>,
    log: Vec<ConversationEntry>,
    in_flight: Option<QueryTask>,
}

impl Session {
    pub fn new(service: Arc<dyn GraphService>) -> Self {
        Self {
            service,
            log: Vec::new(),
            in_flight: None,
        }
    }

    pub fn log(&self) -> &[ConversationEntry] {
        &self.log
    }

    pub fn status(&self) -> SessionStatus {
        if self.in_flight.is_some() {
            SessionStatus::Pending
        } else {
            SessionStatus::Idle
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SessionStatus::Pending
    }

    /// The failure message to surface, if the latest exchange ended in an error
    pub fn error_banner(&self) -> Option<&str> {
        self.log
            .last()
            .filter(|entry| entry.role() == EntryRole::Error)
            .map(ConversationEntry::content)
    }

    /// Start a query. Returns `false` without touching anything when the text
    /// is blank or another query is still outstanding.
    ///
    /// The user's entry keeps `query` exactly as typed and the same text is
    /// sent to the service. Must be called from within a Tokio runtime.
    pub fn submit(&mut self, query: &str) -> bool {
        if query.trim().is_empty() {
            debug!("ignoring blank submission");
            return false;
        }
        if self.in_flight.is_some() {
            debug!("ignoring submission while a query is pending");
            return false;
        }

        self.log.push(ConversationEntry::user(query));

        let service = Arc::clone(&self.service);
        let text = query.to_string();
        info!(chars = text.chars().count(), "submitting query");
        self.in_flight = Some(tokio::spawn(async move { service.query(&text).await }));
        true
    }

    /// Apply the outcome of the in-flight query if it has finished. Never blocks.
    ///
    /// Returns `true` when an entry was appended.
    pub fn poll(&mut self) -> bool {
        let outcome = match self.in_flight.as_mut() {
            Some(task) => match task.now_or_never() {
                Some(outcome) => outcome,
                None => return false,
            },
            None => return false,
        };

        self.in_flight = None;
        self.finish(outcome);
        true
    }

    /// Wait for the in-flight query and apply its outcome.
    ///
    /// Cancel-safe: dropping this future leaves the query pending.
    pub async fn settle(&mut self) -> bool {
        let Some(task) = self.in_flight.as_mut() else {
            return false;
        };

        let outcome = task.await;
        self.in_flight = None;
        self.finish(outcome);
        true
    }

    fn finish(&mut self, outcome: Result<Result<AssistantReply, TransportError>, JoinError>) {
        let entry = match outcome {
            Ok(Ok(reply)) => {
                info!(
                    tools = reply.tool_calls.len(),
                    execution_time = ?reply.execution_time_secs,
                    "query answered"
                );
                ConversationEntry::assistant(reply)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "query failed");
                ConversationEntry::error(ERROR_MESSAGE)
            }
            Err(err) => {
                warn!(error = %err, "query task ended without a result");
                ConversationEntry::error(ERROR_MESSAGE)
            }
        };
        self.log.push(entry);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            debug!("session dropped with a query in flight; aborting it");
            task.abort();
        }
    }
}
