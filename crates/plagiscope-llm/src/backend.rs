//! LLM backend trait and the Gemini implementation.
//!
//! The backend owns the credential; callers only see [`LlmBackend::has_credential`].
//! Web search and JSON response mode are mutually exclusive on the Gemini API,
//! so a request carries at most one of them.

use async_trait::async_trait;
use plagiscope_common::PlagiscopeError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("No API key configured")]
    MissingCredential,
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

impl From<LlmError> for PlagiscopeError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingCredential => PlagiscopeError::Auth,
            LlmError::Http(e) if e.is_timeout() => {
                PlagiscopeError::Transport("the model did not answer before the request timeout".to_string())
            }
            other => PlagiscopeError::Transport(other.to_string()),
        }
    }
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Enable the provider's search tool.
    pub web_search: bool,
    pub response_format: ResponseFormat,
}

/// Web citation attached to a search-grounded answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Concatenated text parts; `None` when the model produced no text.
    pub content: Option<String>,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub grounding: Vec<GroundingChunk>,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    fn model_id(&self) -> &str;
    /// Whether a credential is configured; checked before any request is sent.
    fn has_credential(&self) -> bool;
}

// ── Gemini wire format ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError { status, message: msg });
    }
    Ok(body)
}

fn build_gemini_body(req: &LlmRequest) -> serde_json::Value {
    // System message → systemInstruction
    let system_text = req.messages.iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.clone());

    let contents: Vec<serde_json::Value> = req.messages.iter()
        .filter(|m| m.role != "system")
        .map(|m| {
            let role = if m.role == "assistant" { "model" } else { "user" };
            serde_json::json!({
                "role": role,
                "parts": [{ "text": m.content }]
            })
        })
        .collect();

    let mut generation_config = serde_json::json!({
        "maxOutputTokens": req.max_tokens.unwrap_or(8192),
        "temperature":     req.temperature.unwrap_or(0.1),
    });

    let mut body = serde_json::json!({ "contents": contents });

    if req.web_search {
        body["tools"] = serde_json::json!([{ "google_search": {} }]);
    } else if req.response_format == ResponseFormat::Json {
        generation_config["responseMimeType"] = serde_json::json!("application/json");
    }
    body["generationConfig"] = generation_config;

    if let Some(sys) = system_text {
        body["systemInstruction"] = serde_json::json!({
            "parts": [{ "text": sys }]
        });
    }
    body
}

fn into_llm_response(parsed: GenerateContentResponse, fallback_model: &str) -> LlmResponse {
    let first = parsed.candidates.into_iter().next().unwrap_or_default();

    let text: String = first.content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let usage = parsed.usage_metadata.unwrap_or_default();

    LlmResponse {
        content: if text.trim().is_empty() { None } else { Some(text) },
        model: parsed.model_version.unwrap_or_else(|| fallback_model.to_string()),
        prompt_tokens: usage.prompt_token_count.unwrap_or(0),
        completion_tokens: usage.candidates_token_count.unwrap_or(0),
        grounding: first.grounding_metadata.map(|g| g.grounding_chunks).unwrap_or_default(),
    }
}

// ── Google Gemini ─────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    pub model: String,
    pub base_url: String,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// An empty key is treated as no key.
    pub fn new(api_key: Option<SecretString>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.filter(|k| !k.expose_secret().trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Apply a whole-request timeout to every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingCredential)?;
        let model = req.model.as_deref().unwrap_or(&self.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );

        let body = build_gemini_body(&req);
        tracing::debug!(model, web_search = req.web_search, "Sending Gemini request");

        let resp = self.client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        let parsed: GenerateContentResponse = serde_json::from_value(json)?;

        Ok(into_llm_response(parsed, model))
    }

    fn model_id(&self) -> &str { &self.model }
    fn has_credential(&self) -> bool { self.api_key.is_some() }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(web_search: bool, response_format: ResponseFormat) -> LlmRequest {
        LlmRequest {
            messages: vec![Message::user("check this")],
            model: None,
            max_tokens: Some(1024),
            temperature: Some(0.2),
            web_search,
            response_format,
        }
    }

    #[test]
    fn test_gemini_backend_without_key_has_no_credential() {
        let b = GeminiBackend::new(None, "gemini-2.5-flash");
        assert!(!b.has_credential());
        assert_eq!(b.model_id(), "gemini-2.5-flash");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let b = GeminiBackend::new(Some(SecretString::from("   ".to_string())), "gemini-2.5-flash");
        assert!(!b.has_credential());
    }

    #[tokio::test]
    async fn test_complete_without_key_fails_before_sending() {
        // Unroutable base URL: reaching the network would produce an Http error instead.
        let b = GeminiBackend::new(None, "gemini-2.5-flash").with_base_url("http://127.0.0.1:9");
        let err = b.complete(request(false, ResponseFormat::Json)).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential));
    }

    #[test]
    fn test_json_mode_sets_response_mime_type() {
        let body = build_gemini_body(&request(false, ResponseFormat::Json));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_web_search_disables_json_mode() {
        let body = build_gemini_body(&request(true, ResponseFormat::Json));
        assert_eq!(body["tools"][0], serde_json::json!({ "google_search": {} }));
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_system_message_becomes_system_instruction() {
        let mut req = request(false, ResponseFormat::Text);
        req.messages.insert(0, Message { role: "system".into(), content: "be strict".into() });
        let body = build_gemini_body(&req);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be strict");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_parts_and_grounding_are_collected() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://example.org", "title": "Example" } },
                        { "retrievedContext": {} }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        });
        let parsed: GenerateContentResponse = serde_json::from_value(json).unwrap();
        let resp = into_llm_response(parsed, "gemini-test");

        assert_eq!(resp.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(resp.model, "gemini-test");
        assert_eq!(resp.prompt_tokens, 12);
        assert_eq!(resp.grounding.len(), 2);
        assert_eq!(resp.grounding[1].web, None);
    }

    #[test]
    fn test_response_without_candidates_has_no_content() {
        let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        let resp = into_llm_response(parsed, "gemini-test");
        assert!(resp.content.is_none());
        assert!(resp.grounding.is_empty());
    }

    #[test]
    fn test_missing_credential_maps_to_auth_error() {
        let err: PlagiscopeError = LlmError::MissingCredential.into();
        assert!(matches!(err, PlagiscopeError::Auth));
        let err: PlagiscopeError = LlmError::ApiError { status: 500, message: "boom".into() }.into();
        assert!(matches!(err, PlagiscopeError::Transport(_)));
    }
}
