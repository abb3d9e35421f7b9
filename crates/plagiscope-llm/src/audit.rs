//! Audit records for analysis calls.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One completed model call. The raw output is kept only as a SHA-256 digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisAuditEntry {
    pub id: Uuid,
    pub model: String,
    pub prompt_chars: usize,
    pub reference_count: usize,
    pub web_search: bool,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: String,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl AnalysisAuditEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: String,
        prompt_chars: usize,
        reference_count: usize,
        web_search: bool,
        prompt_tokens: u32,
        completion_tokens: u32,
        output: &str,
        latency_ms: u64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(output.as_bytes());
        let output_hash = format!("{:x}", hasher.finalize());

        Self {
            id: Uuid::new_v4(),
            model,
            prompt_chars,
            reference_count,
            web_search,
            prompt_tokens,
            completion_tokens,
            output_hash,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            audit_id = %self.id,
            model = %self.model,
            prompt_chars = self.prompt_chars,
            references = self.reference_count,
            web_search = self.web_search,
            prompt_tokens = self.prompt_tokens,
            completion_tokens = self.completion_tokens,
            output_hash = %self.output_hash,
            latency_ms = self.latency_ms,
            "Analysis call completed"
        );
    }
}
