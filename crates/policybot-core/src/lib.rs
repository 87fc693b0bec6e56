pub mod api;
pub mod config;
pub mod conversation;
pub mod documents;
pub mod error;
pub mod layout;
pub mod models;
pub mod panel;
pub mod query;
pub mod state;
pub mod upload;

// Re-export main types for convenience
pub use api::BackendClient;
pub use config::Config;
pub use conversation::{Applied, Conversation, Outcome, PendingQuery, QueryPhase, SubmitRejected};
pub use documents::{Document, DocumentStore, LoadPhase, SelectionState};
pub use error::{ApiError, ConfigError};
pub use layout::{DragOutcome, ResizablePane, ResizeEdge};
pub use models::{AccessContext, ModelCatalog};
pub use panel::{PanelController, SummaryState, SummaryView};
pub use query::{submit_query, QueryDelta, QueryProtocol};
pub use state::{Citation, Role, SessionId, Turn, TurnId};
pub use upload::{start_upload, UploadEvent, UploadFile, UploadStatus, UploadTracker};
