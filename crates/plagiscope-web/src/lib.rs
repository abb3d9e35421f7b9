//! plagiscope-web: Web UI for Plagiscope
//! Provides:
//!   - The session controller (inputs, file processing, analysis, reset)
//!   - Server-rendered input and result pages
//!   - A JSON snapshot API and an SSE feed of session changes

pub mod handlers;
pub mod router;
pub mod session;
pub mod sse;
pub mod state;
pub mod view;

pub use session::{AnalysisJob, FileTarget, Session, SessionPhase};
pub use state::{AppEvent, AppState, SharedState};
