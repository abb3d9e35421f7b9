use thiserror::Error;

/// Every failure a user-initiated action can end in.
///
/// All variants are caught at the session boundary and surfaced through
/// [`PlagiscopeError::user_message`]; none are retried.
#[derive(Debug, Error)]
pub enum PlagiscopeError {
    /// The uploaded document could not be opened or yielded no text.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Missing document text or no comparison source selected.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No API key configured for the analysis model")]
    Auth,

    #[error("The model returned an empty response")]
    EmptyResponse,

    /// The model reply was not valid JSON for the analysis schema.
    /// `raw` keeps the offending text for diagnostics.
    #[error("Parse error: {message}")]
    Parse { message: String, raw: String },

    /// Network or model invocation failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Another operation of the same kind is still running.
    #[error("Busy: {0}")]
    Busy(String),
}

impl PlagiscopeError {
    /// Message shown to the user in place of the technical error.
    pub fn user_message(&self) -> String {
        match self {
            PlagiscopeError::Extraction(detail) => format!(
                "Could not read the document ({detail}). Please upload a text-based PDF or a plain text file."
            ),
            PlagiscopeError::Validation(msg) => msg.clone(),
            PlagiscopeError::Auth => {
                "No API key is configured. Set llm.api_key in plagiscope.toml or the GEMINI_API_KEY environment variable.".to_string()
            }
            PlagiscopeError::EmptyResponse => {
                "The analysis model returned no answer. Please try again.".to_string()
            }
            PlagiscopeError::Parse { .. } => {
                "The analysis model returned a malformed report. Please try again.".to_string()
            }
            PlagiscopeError::Transport(detail) => {
                format!("The analysis request failed: {detail}")
            }
            PlagiscopeError::Busy(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlagiscopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_message_asks_for_text_document() {
        let err = PlagiscopeError::Extraction("image-only PDF".to_string());
        let msg = err.user_message();
        assert!(msg.contains("image-only PDF"));
        assert!(msg.contains("text-based"));
    }

    #[test]
    fn test_parse_error_hides_raw_text_from_user() {
        let err = PlagiscopeError::Parse {
            message: "expected value".to_string(),
            raw: "not json at all".to_string(),
        };
        assert!(!err.user_message().contains("not json at all"));
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = PlagiscopeError::Validation("Please add a document.".to_string());
        assert_eq!(err.user_message(), "Please add a document.");
    }
}
