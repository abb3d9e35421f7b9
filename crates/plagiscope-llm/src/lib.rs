//! plagiscope-llm: Model access for plagiarism analysis.
//! Holds the LlmBackend trait with its Gemini implementation, the prompt
//! builder, the analysis client and audit records for model calls.

pub mod analysis;
pub mod audit;
pub mod backend;
pub mod prompt;

pub use analysis::{AnalysisClient, AnalysisSettings};
pub use backend::{GeminiBackend, LlmBackend, LlmError};
