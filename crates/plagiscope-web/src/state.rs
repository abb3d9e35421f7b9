//! Shared application state for the web server.
//!
//! The session lock is never held across extraction or a model call.

use std::sync::Arc;

use plagiscope_common::{AnalysisResult, Category, PlagiscopeError, Result};
use plagiscope_ingestion::{extract_text_async, UploadedFile};
use plagiscope_llm::AnalysisClient;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use crate::session::{AnalysisJob, FileTarget, Session, SessionPhase};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// Inputs or phase changed; clients should re-render.
    SessionChanged { phase: String },
    /// A document or reference file finished loading
    FileProcessed { name: String, chars: usize },
    AnalysisStarted { references: usize, web_search: bool },
    AnalysisCompleted { risk: u8, category: Category, matches: usize },
    /// Any failure, already converted to its user-facing message
    Error { message: String },
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub session: RwLock<Session>,
    pub analyzer: AnalysisClient,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(analyzer: AnalysisClient, session: Session) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self { session: RwLock::new(session), analyzer, event_tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    pub fn publish(&self, event: AppEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    fn publish_phase(&self, phase: SessionPhase) {
        self.publish(AppEvent::SessionChanged { phase: phase.as_str().to_string() });
    }

    /// Surface an error to the user without touching the phase.
    pub async fn record_error(&self, err: &PlagiscopeError) {
        let message = err.user_message();
        self.session.write().await.record_error(message.clone());
        self.publish(AppEvent::Error { message });
    }

    /// Apply a synchronous edit to the session and notify observers.
    pub async fn edit<T>(&self, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let (out, phase) = {
            let mut session = self.session.write().await;
            let out = f(&mut session)?;
            (out, session.phase())
        };
        self.publish_phase(phase);
        Ok(out)
    }

    /// Read a file and store its text as the document or as a new reference.
    /// Failures are left for the caller to surface.
    pub async fn process_file(&self, target: FileTarget, file: UploadedFile) -> Result<()> {
        if file.bytes.is_empty() && file.name.is_empty() {
            return Err(PlagiscopeError::Validation("Choose a file to upload.".to_string()));
        }

        self.session.write().await.begin_file_processing()?;
        self.publish_phase(SessionPhase::ProcessingFile);

        let name = file.name.clone();
        tracing::info!(file = %name, bytes = file.bytes.len(), ?target, "Processing uploaded file");
        let outcome = extract_text_async(file).await;
        let chars = outcome.as_ref().map(|t| t.chars().count()).unwrap_or(0);

        let finished = self.session.write().await.finish_file_processing(target, &name, outcome);
        self.publish_phase(SessionPhase::Idle);
        match finished {
            Ok(()) => {
                self.publish(AppEvent::FileProcessed { name, chars });
                Ok(())
            }
            Err(err) => {
                self.publish(AppEvent::Error { message: err.user_message() });
                Err(err)
            }
        }
    }

    /// Validate and enter `Analyzing`. Nothing is sent to the model on failure.
    pub async fn begin_analysis(&self) -> Result<AnalysisJob> {
        let job = self.session.write().await.begin_analysis()?;
        self.publish_phase(SessionPhase::Analyzing);
        self.publish(AppEvent::AnalysisStarted {
            references: job.references.len(),
            web_search: job.use_web_search,
        });
        Ok(job)
    }

    /// Call the model for a job and store the outcome in the session.
    pub async fn run_analysis(&self, job: AnalysisJob) -> Result<AnalysisResult> {
        let outcome = self
            .analyzer
            .analyze(&job.document_text, &job.references, &job.document_type, job.use_web_search)
            .await;

        let finished = self.session.write().await.finish_analysis(outcome);

        match &finished {
            Ok(result) => {
                self.publish_phase(SessionPhase::ResultShown);
                self.publish(AppEvent::AnalysisCompleted {
                    risk: result.overall_plagiarism_risk,
                    category: result.category,
                    matches: result.matches.len(),
                });
            }
            Err(err) => {
                self.publish_phase(SessionPhase::Idle);
                self.publish(AppEvent::Error { message: err.user_message() });
            }
        }
        finished
    }

    /// Begin an analysis and run it on a background task.
    pub async fn start_analysis(self: &Arc<Self>) -> Result<()> {
        let job = self.begin_analysis().await?;
        let state = Arc::clone(self);
        tokio::spawn(async move {
            // Outcome is already stored in the session and published
            let _ = state.run_analysis(job).await;
        });
        Ok(())
    }

    /// Begin and run an analysis inline.
    pub async fn analyze_now(&self) -> Result<AnalysisResult> {
        let job = self.begin_analysis().await?;
        self.run_analysis(job).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.edit(|s| s.reset()).await
    }
}
