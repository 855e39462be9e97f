use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use cinegraph_core::{Dashboard, GraphService, HealthReport, Session, TransportError};

pub const STARTER_QUESTIONS: [&str; 4] = [
    "Highest rated 90s sci-fi",
    "Who did Christopher Nolan direct?",
    "Movies like Inception",
    "Cast of The Matrix",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Assistant,
    DataHub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Header indicator fed by the one-off liveness probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHealth {
    Checking,
    Online,
    Degraded,
    Offline,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Chat view state (the conversation itself lives in `session`)
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub follow_tail: bool, // Keep the newest entry in view

    pub session: Session,
    /// Present only while the Data Hub is on screen
    pub dashboard: Option<Dashboard>,

    pub health: ServiceHealth,
    health_task: Option<JoinHandle<Result<HealthReport, TransportError>>>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub api_base_url: String,
    service: Arc<dyn GraphService>,
}

impl App {
    /// Must be called from within a Tokio runtime; starts the health probe.
    pub fn new(service: Arc<dyn GraphService>, api_base_url: String) -> Self {
        let probe = Arc::clone(&service);
        let health_task = tokio::spawn(async move { probe.health().await });

        Self {
            should_quit: false,
            screen: Screen::Assistant,
            input_mode: InputMode::Editing,
            query_input: String::new(),
            query_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            follow_tail: true,
            session: Session::new(Arc::clone(&service)),
            dashboard: None,
            health: ServiceHealth::Checking,
            health_task: Some(health_task),
            animation_frame: 0,
            api_base_url,
            service,
        }
    }

    pub fn show_assistant(&mut self) {
        self.screen = Screen::Assistant;
        // Unmounting drops the dashboard along with any fetch in flight
        self.dashboard = None;
    }

    pub fn show_data_hub(&mut self) {
        self.screen = Screen::DataHub;
        self.input_mode = InputMode::Normal;
        self.dashboard = Some(Dashboard::mount(Arc::clone(&self.service)));
    }

    pub fn toggle_screen(&mut self) {
        match self.screen {
            Screen::Assistant => self.show_data_hub(),
            Screen::DataHub => self.show_assistant(),
        }
    }

    pub fn reload_dashboard(&mut self) {
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.load();
        }
    }

    /// Hand the input to the session; the buffer is only cleared if it was accepted
    pub fn submit_query(&mut self) -> bool {
        if !self.session.submit(&self.query_input) {
            return false;
        }

        self.query_input.clear();
        self.query_cursor = 0;
        self.follow_tail = true;
        true
    }

    pub fn use_starter_question(&mut self, idx: usize) {
        if !self.session.log().is_empty() {
            return;
        }
        if let Some(question) = STARTER_QUESTIONS.get(idx) {
            self.query_input = question.to_string();
            self.query_cursor = self.query_input.chars().count();
            self.input_mode = InputMode::Editing;
        }
    }

    /// Called on every timer tick: advance the animation and apply finished requests
    pub fn tick(&mut self) {
        if self.session.is_loading() || self.dashboard.as_ref().is_some_and(Dashboard::is_loading) {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if self.session.poll() {
            self.follow_tail = true;
        }
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.poll();
        }
        self.poll_health();
    }

    fn poll_health(&mut self) {
        let outcome = match self.health_task.as_mut() {
            Some(task) => match task.now_or_never() {
                Some(outcome) => outcome,
                None => return,
            },
            None => return,
        };
        self.health_task = None;

        self.health = match outcome {
            Ok(Ok(report)) if report.is_healthy() => ServiceHealth::Online,
            Ok(Ok(report)) => {
                info!(
                    neo4j = report.neo4j_connected,
                    llm = report.llm_available,
                    "reasoning service is degraded"
                );
                ServiceHealth::Degraded
            }
            Ok(Err(err)) => {
                warn!(error = %err, "health probe failed");
                ServiceHealth::Offline
            }
            Err(err) => {
                warn!(error = %err, "health probe task ended without a result");
                ServiceHealth::Offline
            }
        };
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(task) = self.health_task.take() {
            task.abort();
        }
    }
}
