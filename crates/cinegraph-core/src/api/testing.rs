//! Scripted `GraphService` for exercising the session and dashboard without a network

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{GraphService, HealthReport, TransportError};
use crate::state::{AssistantReply, DashboardStats};

#[derive(Default)]
pub(crate) struct ScriptedService {
    replies: Mutex<VecDeque<Result<AssistantReply, TransportError>>>,
    stats: Mutex<VecDeque<Result<DashboardStats, TransportError>>>,
    gate: Option<Arc<Notify>>,
    panic_on_query: bool,
    query_calls: AtomicUsize,
    stats_calls: AtomicUsize,
    completed: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: AssistantReply) -> Self {
        self.replies.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn fail_query(self, err: TransportError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn stats(self, stats: DashboardStats) -> Self {
        self.stats.lock().unwrap().push_back(Ok(stats));
        self
    }

    pub fn fail_stats(self, err: TransportError) -> Self {
        self.stats.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_query = true;
        self
    }

    /// Hold every call open until the returned `Notify` is signalled once per call
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    /// Calls that got past the gate and produced a result
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl GraphService for ScriptedService {
    async fn query(&self, text: &str) -> Result<AssistantReply, TransportError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(text.to_string());
        self.wait_for_gate().await;

        if self.panic_on_query {
            panic!("scripted query panic");
        }

        let next = self.replies.lock().unwrap().pop_front();
        self.completed.fetch_add(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Err(TransportError::Network("no scripted reply".to_string())))
    }

    async fn fetch_stats(&self) -> Result<DashboardStats, TransportError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;

        let next = self.stats.lock().unwrap().pop_front();
        self.completed.fetch_add(1, Ordering::SeqCst);
        next.unwrap_or_else(|| Err(TransportError::Network("no scripted stats".to_string())))
    }

    async fn health(&self) -> Result<HealthReport, TransportError> {
        Ok(HealthReport {
            status: "healthy".to_string(),
            neo4j_connected: true,
            llm_available: true,
        })
    }
}
