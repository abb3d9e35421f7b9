//! Session controller: the authoritative state of one plagiarism check.
//!
//! Long operations are split into `begin_*` / `finish_*` halves so callers can
//! release the session lock while extraction or the model call is running.
//! A second `begin_*` while one is in flight is rejected with `Busy`.

use plagiscope_common::{AnalysisResult, PlagiscopeError, ReferenceItem, Result, SourceType};
use plagiscope_ingestion::{ReferenceField, ReferenceStore};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    ProcessingFile,
    Analyzing,
    ResultShown,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle           => "idle",
            SessionPhase::ProcessingFile => "processing_file",
            SessionPhase::Analyzing      => "analyzing",
            SessionPhase::ResultShown    => "result_shown",
        }
    }
}

/// Where the text of a processed file goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTarget {
    Document,
    Reference(SourceType),
}

/// Snapshot of everything one analysis run needs.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub document_text: String,
    /// Only references with non-blank text.
    pub references: Vec<ReferenceItem>,
    pub document_type: String,
    pub use_web_search: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub document_text: String,
    pub document_name: Option<String>,
    pub document_type: String,
    pub use_web_search: bool,
    pub references: ReferenceStore,
    phase: SessionPhase,
    last_error: Option<String>,
    result: Option<AnalysisResult>,
}

impl Session {
    pub fn new(document_type: impl Into<String>, use_web_search: bool) -> Self {
        Self {
            document_text: String::new(),
            document_name: None,
            document_type: document_type.into(),
            use_web_search,
            references: ReferenceStore::new(),
            phase: SessionPhase::Idle,
            last_error: None,
            result: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, SessionPhase::ProcessingFile | SessionPhase::Analyzing)
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn ensure_editable(&self) -> Result<()> {
        match self.phase {
            SessionPhase::Idle => Ok(()),
            SessionPhase::ProcessingFile => Err(PlagiscopeError::Busy(
                "Please wait until the file has been processed.".to_string(),
            )),
            SessionPhase::Analyzing => Err(PlagiscopeError::Busy(
                "An analysis is running; edits are disabled until it finishes.".to_string(),
            )),
            SessionPhase::ResultShown => Err(PlagiscopeError::Busy(
                "Start a new check before editing the inputs.".to_string(),
            )),
        }
    }

    // ── Inputs ────────────────────────────────────────────────────────────────

    pub fn set_document_text(&mut self, text: String) -> Result<()> {
        self.ensure_editable()?;
        self.document_text = text;
        self.document_name = None;
        Ok(())
    }

    pub fn set_document_type(&mut self, document_type: String) -> Result<()> {
        self.ensure_editable()?;
        self.document_type = document_type;
        Ok(())
    }

    pub fn set_web_search(&mut self, enabled: bool) -> Result<()> {
        self.ensure_editable()?;
        self.use_web_search = enabled;
        Ok(())
    }

    pub fn add_reference(&mut self) -> Result<usize> {
        self.ensure_editable()?;
        Ok(self.references.add())
    }

    pub fn update_reference(&mut self, index: usize, field: ReferenceField) -> Result<bool> {
        self.ensure_editable()?;
        Ok(self.references.update(index, field))
    }

    pub fn remove_reference(&mut self, index: usize) -> Result<bool> {
        self.ensure_editable()?;
        Ok(self.references.remove(index).is_some())
    }

    /// UI-only flag, so allowed in any phase.
    pub fn toggle_reference(&mut self, index: usize) -> bool {
        self.references.toggle_expand(index)
    }

    // ── File processing ───────────────────────────────────────────────────────

    pub fn begin_file_processing(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.phase = SessionPhase::ProcessingFile;
        self.last_error = None;
        Ok(())
    }

    /// Store the outcome of a file read and return to idle. Failures are kept
    /// as the session's error message and handed back to the caller.
    pub fn finish_file_processing(
        &mut self,
        target: FileTarget,
        file_name: &str,
        outcome: Result<String>,
    ) -> Result<()> {
        self.phase = SessionPhase::Idle;
        match outcome {
            Ok(text) => {
                match target {
                    FileTarget::Document => {
                        self.document_text = text;
                        self.document_name = Some(file_name.to_string());
                    }
                    FileTarget::Reference(source_type) => {
                        self.references.add_with_text(source_type, text);
                    }
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(file = file_name, error = %err, "File processing failed");
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    // ── Analysis ──────────────────────────────────────────────────────────────

    /// Check that the document and at least one comparison source are present.
    pub fn validate(&self) -> Result<()> {
        if self.document_text.trim().is_empty() {
            return Err(PlagiscopeError::Validation(
                "Please upload or paste the document you want to check.".to_string(),
            ));
        }
        if !self.use_web_search && self.references.with_text().is_empty() {
            return Err(PlagiscopeError::Validation(
                "Add at least one reference text or enable web search.".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and enter `Analyzing`. No state changes when validation fails.
    pub fn begin_analysis(&mut self) -> Result<AnalysisJob> {
        if self.phase == SessionPhase::Analyzing {
            return Err(PlagiscopeError::Busy("An analysis is already running.".to_string()));
        }
        self.ensure_editable()?;
        self.validate()?;

        let duplicates = self.references.duplicate_ids();
        if !duplicates.is_empty() {
            tracing::warn!(ids = ?duplicates, "Several references share an id; match attribution may be ambiguous");
        }

        self.phase = SessionPhase::Analyzing;
        self.last_error = None;
        Ok(AnalysisJob {
            document_text: self.document_text.clone(),
            references: self.references.with_text(),
            document_type: self.document_type.clone(),
            use_web_search: self.use_web_search,
        })
    }

    /// Store the outcome of a run; the result (or error) is handed back.
    pub fn finish_analysis(&mut self, outcome: Result<AnalysisResult>) -> Result<AnalysisResult> {
        match outcome {
            Ok(result) => {
                self.result = Some(result.clone());
                self.last_error = None;
                self.phase = SessionPhase::ResultShown;
                Ok(result)
            }
            Err(err) => {
                tracing::error!(error = %err, "Analysis failed");
                self.result = None;
                self.last_error = Some(err.user_message());
                self.phase = SessionPhase::Idle;
                Err(err)
            }
        }
    }

    /// Leave result mode. Document and references are kept.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_busy() {
            return Err(PlagiscopeError::Busy(
                "Cannot reset while an operation is running.".to_string(),
            ));
        }
        self.result = None;
        self.last_error = None;
        self.phase = SessionPhase::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plagiscope_common::Category;

    fn result(risk: u8) -> AnalysisResult {
        AnalysisResult {
            overall_plagiarism_risk: risk,
            category: Category::NoIssue,
            summary: vec!["Nothing found.".into()],
            matches: vec![],
            web_sources: None,
        }
    }

    fn ready_session() -> Session {
        let mut s = Session::new("Essay", false);
        s.set_document_text("My essay text.".into()).unwrap();
        let idx = s.add_reference().unwrap();
        s.update_reference(idx, ReferenceField::Text("Source text.".into())).unwrap();
        s
    }

    #[test]
    fn test_empty_document_rejected_regardless_of_sources() {
        for web in [false, true] {
            let mut s = Session::new("Essay", web);
            let idx = s.add_reference().unwrap();
            s.update_reference(idx, ReferenceField::Text("ref".into())).unwrap();
            let err = s.begin_analysis().unwrap_err();
            assert!(matches!(err, PlagiscopeError::Validation(_)));
            assert_eq!(s.phase(), SessionPhase::Idle);
        }
    }

    #[test]
    fn test_blank_references_without_web_search_rejected() {
        let mut s = Session::new("Essay", false);
        s.set_document_text("text".into()).unwrap();
        s.add_reference().unwrap();
        let err = s.begin_analysis().unwrap_err();
        assert!(matches!(err, PlagiscopeError::Validation(_)));
    }

    #[test]
    fn test_web_search_alone_is_enough() {
        let mut s = Session::new("Essay", true);
        s.set_document_text("text".into()).unwrap();
        let job = s.begin_analysis().unwrap();
        assert!(job.references.is_empty());
        assert!(job.use_web_search);
        assert_eq!(s.phase(), SessionPhase::Analyzing);
    }

    #[test]
    fn test_job_excludes_blank_references() {
        let mut s = ready_session();
        s.add_reference().unwrap();
        let job = s.begin_analysis().unwrap();
        assert_eq!(job.references.len(), 1);
        assert_eq!(job.references[0].id, "REF-001");
    }

    #[test]
    fn test_only_one_analysis_in_flight() {
        let mut s = ready_session();
        s.begin_analysis().unwrap();
        let err = s.begin_analysis().unwrap_err();
        assert!(matches!(err, PlagiscopeError::Busy(_)));
        assert!(s.add_reference().is_err());
    }

    #[test]
    fn test_successful_analysis_shows_result_then_reset() {
        let mut s = ready_session();
        s.begin_analysis().unwrap();
        s.finish_analysis(Ok(result(42))).unwrap();
        assert_eq!(s.phase(), SessionPhase::ResultShown);
        assert_eq!(s.result().map(|r| r.overall_plagiarism_risk), Some(42));

        s.reset().unwrap();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.result().is_none());
        assert_eq!(s.document_text, "My essay text.");
        assert_eq!(s.references.len(), 1);
    }

    #[test]
    fn test_failed_analysis_returns_to_idle_with_message() {
        let mut s = ready_session();
        s.begin_analysis().unwrap();
        let err = s.finish_analysis(Err(PlagiscopeError::EmptyResponse)).unwrap_err();
        assert!(matches!(err, PlagiscopeError::EmptyResponse));
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert!(s.result().is_none());
        assert!(s.last_error().unwrap().contains("no answer"));
    }

    #[test]
    fn test_new_analysis_replaces_previous_result() {
        let mut s = ready_session();
        s.begin_analysis().unwrap();
        s.finish_analysis(Ok(result(10))).unwrap();
        assert!(s.begin_analysis().is_err(), "result mode must be reset first");
        s.reset().unwrap();
        s.begin_analysis().unwrap();
        s.finish_analysis(Ok(result(90))).unwrap();
        assert_eq!(s.result().unwrap().overall_plagiarism_risk, 90);
    }

    #[test]
    fn test_file_processing_round_trip() {
        let mut s = Session::new("Essay", false);
        s.begin_file_processing().unwrap();
        assert_eq!(s.phase(), SessionPhase::ProcessingFile);
        assert!(s.begin_file_processing().is_err());
        assert!(s.begin_analysis().is_err());

        s.finish_file_processing(FileTarget::Document, "essay.txt", Ok("Loaded".into())).unwrap();
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.document_text, "Loaded");
        assert_eq!(s.document_name.as_deref(), Some("essay.txt"));
    }

    #[test]
    fn test_failed_file_processing_keeps_document() {
        let mut s = Session::new("Essay", false);
        s.set_document_text("Existing".into()).unwrap();
        s.begin_file_processing().unwrap();
        let outcome = Err(PlagiscopeError::Extraction("corrupt".into()));
        assert!(s.finish_file_processing(FileTarget::Document, "bad.pdf", outcome).is_err());
        assert_eq!(s.phase(), SessionPhase::Idle);
        assert_eq!(s.document_text, "Existing");
        assert!(s.last_error().unwrap().contains("text-based"));
    }

    #[test]
    fn test_reference_file_is_appended() {
        let mut s = Session::new("Essay", false);
        s.begin_file_processing().unwrap();
        s.finish_file_processing(FileTarget::Reference(SourceType::Book), "ch1.txt", Ok("Chapter".into()))
            .unwrap();
        assert_eq!(s.references.items()[0].id, "REF-001");
        assert_eq!(s.references.items()[0].source_type, SourceType::Book);
        assert!(s.document_text.is_empty());
    }

    #[test]
    fn test_toggle_allowed_while_analyzing() {
        let mut s = ready_session();
        s.begin_analysis().unwrap();
        assert!(s.toggle_reference(0));
        assert!(s.reset().is_err());
    }
}
