//! Analysis client: prompt → model → cleaned JSON → [`AnalysisResult`].
//!
//! No retries. Every failure comes back as a typed [`PlagiscopeError`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use plagiscope_common::{AnalysisResult, PlagiscopeError, ReferenceItem, Result, WebSource};

use crate::audit::AnalysisAuditEntry;
use crate::backend::{GroundingChunk, LlmBackend, LlmRequest, Message, ResponseFormat};
use crate::prompt::build_prompt;

/// Generation parameters applied to every analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self { temperature: 0.1, max_output_tokens: 8192 }
    }
}

pub struct AnalysisClient {
    backend: Arc<dyn LlmBackend>,
    settings: AnalysisSettings,
}

impl AnalysisClient {
    pub fn new(backend: Arc<dyn LlmBackend>, settings: AnalysisSettings) -> Self {
        Self { backend, settings }
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    pub fn has_credential(&self) -> bool {
        self.backend.has_credential()
    }

    /// Run one analysis. Callers validate the document and sources first.
    pub async fn analyze(
        &self,
        document_text: &str,
        references: &[ReferenceItem],
        document_type: &str,
        use_web_search: bool,
    ) -> Result<AnalysisResult> {
        let built = build_prompt(document_text, references, document_type, use_web_search);

        if !self.backend.has_credential() {
            return Err(PlagiscopeError::Auth);
        }

        let req = LlmRequest {
            messages: vec![Message::user(built.prompt.clone())],
            model: None,
            max_tokens: Some(self.settings.max_output_tokens),
            temperature: Some(self.settings.temperature),
            web_search: built.options.web_search,
            response_format: if built.options.json_response {
                ResponseFormat::Json
            } else {
                ResponseFormat::Text
            },
        };

        tracing::info!(
            model = self.backend.model_id(),
            document_chars = document_text.len(),
            references = references.len(),
            web_search = use_web_search,
            "Starting plagiarism analysis"
        );

        let started = Instant::now();
        let resp = self.backend.complete(req).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        let raw = resp.content.ok_or(PlagiscopeError::EmptyResponse)?;

        AnalysisAuditEntry::new(
            resp.model,
            built.prompt.len(),
            references.len(),
            use_web_search,
            resp.prompt_tokens,
            resp.completion_tokens,
            &raw,
            latency_ms,
        )
        .log();

        let mut result = parse_analysis(&raw)?;

        // Web sources come from grounding metadata only, never from the reply body
        result.web_sources = None;
        if use_web_search {
            let sources = collect_web_sources(&resp.grounding);
            if !sources.is_empty() {
                result.web_sources = Some(sources);
            }
        }

        tracing::info!(
            risk = result.overall_plagiarism_risk,
            matches = result.matches.len(),
            "Plagiarism analysis complete"
        );
        Ok(result)
    }
}

/// Strip code fences and any prose around the outermost `{ … }` span.
/// Without a brace pair the fence-stripped text is returned as is.
pub fn clean_model_output(raw: &str) -> String {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if end > start => cleaned[start..=end].to_string(),
        _ => cleaned.to_string(),
    }
}

/// Parse cleaned model output into a validated result.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let cleaned = clean_model_output(raw);

    let result: AnalysisResult = serde_json::from_str(&cleaned).map_err(|e| {
        tracing::warn!(error = %e, raw = %raw, "Model output is not a valid analysis report");
        PlagiscopeError::Parse { message: e.to_string(), raw: raw.to_string() }
    })?;

    if result.overall_plagiarism_risk > 100 {
        tracing::warn!(risk = result.overall_plagiarism_risk, raw = %raw, "Risk score out of range");
        return Err(PlagiscopeError::Parse {
            message: format!(
                "overall_plagiarism_risk {} is outside 0-100",
                result.overall_plagiarism_risk
            ),
            raw: raw.to_string(),
        });
    }

    Ok(result)
}

/// Web citations from grounding metadata, deduplicated by URI in first-seen
/// order. Entries without a URI are dropped; a missing title falls back to the URI.
pub fn collect_web_sources(chunks: &[GroundingChunk]) -> Vec<WebSource> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter_map(|chunk| chunk.web.as_ref())
        .filter_map(|web| {
            let uri = web.uri.as_ref().filter(|u| !u.is_empty())?;
            let title = web
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| uri.clone());
            Some(WebSource { uri: uri.clone(), title })
        })
        .filter(|source| seen.insert(source.uri.clone()))
        .collect()
}
