pub mod api;
pub mod config;
pub mod dashboard;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use api::{GraphRagClient, GraphService, HealthReport, TransportError};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardState};
pub use session::{Session, ERROR_MESSAGE};
pub use state::{AssistantReply, ConversationEntry, DashboardStats, EntryRole, SessionStatus, ToolCall};
