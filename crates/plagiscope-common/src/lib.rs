//! plagiscope-common: Shared types and errors used across all Plagiscope crates.

pub mod error;
pub mod models;

// Re-export commonly used types
pub use error::{PlagiscopeError, Result};
pub use models::{
    AnalysisResult, Category, CitationStatus, MatchResult, MatchType, ReferenceItem, RiskTier,
    SourceType, WebSource, WEB_SOURCE_ID,
};
