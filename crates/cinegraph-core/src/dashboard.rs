//! Graph statistics for the dashboard view
//!
//! Fetched once when the view mounts; a fresh fetch only happens when the
//! view asks for one. No polling interval, no retries.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::api::{GraphService, TransportError};
use crate::state::DashboardStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    Loading,
    Ready(DashboardStats),
    /// Only the fact of failure is kept
    Failed,
}

impl DashboardState {
    pub fn stats(&self) -> Option<&DashboardStats> {
        match self {
            Self::Ready(stats) => Some(stats),
            Self::Loading | Self::Failed => None,
        }
    }
}

type StatsTask = JoinHandle<Result<DashboardStats, TransportError>>;

pub struct Dashboard {
    service: Arc<dyn GraphService>,
    state: DashboardState,
    in_flight: Option<StatsTask>,
}

impl Dashboard {
    /// Create the dashboard and start its first fetch. Must be called from within a Tokio runtime.
    pub fn mount(service: Arc<dyn GraphService>) -> Self {
        let mut dashboard = Self {
            service,
            state: DashboardState::Loading,
            in_flight: None,
        };
        dashboard.load();
        dashboard
    }

    /// Start a fresh fetch, superseding any fetch still in flight
    pub fn load(&mut self) {
        if let Some(stale) = self.in_flight.take() {
            debug!("superseding in-flight stats fetch");
            stale.abort();
        }

        self.state = DashboardState::Loading;
        let service = Arc::clone(&self.service);
        self.in_flight = Some(tokio::spawn(async move { service.fetch_stats().await }));
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn stats(&self) -> Option<&DashboardStats> {
        self.state.stats()
    }

    pub fn is_loading(&self) -> bool {
        self.state == DashboardState::Loading
    }

    pub fn has_failed(&self) -> bool {
        self.state == DashboardState::Failed
    }

    /// Apply the fetch result if it is ready. Never blocks.
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

    /// Wait for the in-flight fetch and apply its result. Cancel-safe.
    pub async fn settle(&mut self) -> bool {
        let Some(task) = self.in_flight.as_mut() else {
            return false;
        };

        let outcome = task.await;
        self.in_flight = None;
        self.finish(outcome);
        true
    }

    fn finish(&mut self, outcome: Result<Result<DashboardStats, TransportError>, JoinError>) {
        self.state = match outcome {
            Ok(Ok(stats)) => {
                info!(
                    movies = stats.movie_count,
                    entities = stats.entity_count,
                    "graph stats loaded"
                );
                DashboardState::Ready(stats)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "failed to load graph stats");
                DashboardState::Failed
            }
            Err(err) => {
                warn!(error = %err, "stats task ended without a result");
                DashboardState::Failed
            }
        };
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedService;

    const SNAPSHOT: DashboardStats = DashboardStats {
        movie_count: 500,
        entity_count: 1200,
        genre_count: 20,
        relationship_count: 8000,
    };

    fn mount(service: ScriptedService) -> (Dashboard, Arc<ScriptedService>) {
        let service = Arc::new(service);
        (Dashboard::mount(service.clone()), service)
    }

    #[tokio::test]
    async fn test_starts_loading_on_mount() {
        let (service, _gate) = ScriptedService::new().stats(SNAPSHOT).gated();
        let (mut dashboard, _) = mount(service);

        assert_eq!(dashboard.state(), &DashboardState::Loading);
        assert!(dashboard.stats().is_none());
        tokio::task::yield_now().await;
        assert!(!dashboard.poll());
        assert!(dashboard.is_loading());
    }

    #[tokio::test]
    async fn test_success_holds_snapshot() {
        let (mut dashboard, service) = mount(ScriptedService::new().stats(SNAPSHOT));

        assert!(dashboard.settle().await);
        assert_eq!(dashboard.state(), &DashboardState::Ready(SNAPSHOT));
        assert_eq!(dashboard.stats(), Some(&SNAPSHOT));
        assert_eq!(service.stats_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_carries_no_stats() {
        let (mut dashboard, _) =
            mount(ScriptedService::new().fail_stats(TransportError::Decode("bad".to_string())));

        dashboard.settle().await;
        assert_eq!(dashboard.state(), &DashboardState::Failed);
        assert!(dashboard.has_failed());
        assert!(dashboard.stats().is_none());
    }

    #[tokio::test]
    async fn test_reload_replaces_snapshot_wholesale() {
        let newer = DashboardStats {
            movie_count: 501,
            ..SNAPSHOT
        };
        let (mut dashboard, service) = mount(
            ScriptedService::new()
                .fail_stats(TransportError::Network("down".to_string()))
                .stats(SNAPSHOT)
                .stats(newer),
        );

        dashboard.settle().await;
        assert!(dashboard.has_failed());

        dashboard.load();
        assert!(dashboard.is_loading());
        dashboard.settle().await;
        assert_eq!(dashboard.stats(), Some(&SNAPSHOT));

        dashboard.load();
        dashboard.settle().await;
        assert_eq!(dashboard.stats(), Some(&newer));
        assert_eq!(service.stats_calls(), 3);
    }

    #[tokio::test]
    async fn test_settle_without_fetch_is_noop() {
        let (mut dashboard, _) = mount(ScriptedService::new().stats(SNAPSHOT));
        dashboard.settle().await;

        assert!(!dashboard.settle().await);
        assert!(!dashboard.poll());
        assert_eq!(dashboard.stats(), Some(&SNAPSHOT));
    }

    #[tokio::test]
    async fn test_superseded_fetch_is_never_applied() {
        let (service, gate) = ScriptedService::new().stats(SNAPSHOT).gated();
        let (mut dashboard, service) = mount(service);
        tokio::task::yield_now().await;

        // Second activation before the first fetch returns
        dashboard.load();
        gate.notify_one();
        gate.notify_one();
        dashboard.settle().await;

        assert_eq!(dashboard.stats(), Some(&SNAPSHOT));
        assert_eq!(service.completed(), 1);
    }
}
