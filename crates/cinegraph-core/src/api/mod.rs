//! Transport to the remote reasoning service

mod client;
mod error;
mod wire;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::state::{AssistantReply, DashboardStats};

pub use client::GraphRagClient;
pub use error::TransportError;
pub use wire::HealthReport;

/// The operations the session and dashboard need from the service.
///
/// Every call is a single attempt: no retries, caching or deduplication.
#[async_trait]
pub trait GraphService: Send + Sync {
    /// `POST /ask`
    async fn query(&self, text: &str) -> Result<AssistantReply, TransportError>;

    /// `GET /graph-info`
    async fn fetch_stats(&self) -> Result<DashboardStats, TransportError>;

    /// `GET /` liveness probe
    async fn health(&self) -> Result<HealthReport, TransportError>;
}
