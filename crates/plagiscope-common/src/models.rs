//! Data model shared by the analysis client, the session controller and the views.
//!
//! Field names of [`AnalysisResult`] and [`MatchResult`] are the exact JSON keys
//! the analysis model is asked to produce; they are case-sensitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference id the model uses for matches found through web search
/// rather than in a user-supplied reference.
pub const WEB_SOURCE_ID: &str = "WEB-SOURCE";

// ── References ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Paper,
    Book,
    Website,
    Thesis,
    Other,
}

impl SourceType {
    pub const ALL: [SourceType; 5] = [
        SourceType::Paper,
        SourceType::Book,
        SourceType::Website,
        SourceType::Thesis,
        SourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Paper   => "paper",
            SourceType::Book    => "book",
            SourceType::Website => "website",
            SourceType::Thesis  => "thesis",
            SourceType::Other   => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceType::Paper   => "Paper",
            SourceType::Book    => "Book",
            SourceType::Website => "Website",
            SourceType::Thesis  => "Thesis",
            SourceType::Other   => "Other",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paper"   => Ok(SourceType::Paper),
            "book"    => Ok(SourceType::Book),
            "website" => Ok(SourceType::Website),
            "thesis"  => Ok(SourceType::Thesis),
            "other"   => Ok(SourceType::Other),
            other     => Err(format!("unknown source type: {other}")),
        }
    }
}

/// A user-supplied comparison text. `id` is user-editable and not required
/// to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    pub id: String,
    pub source_type: SourceType,
    pub text: String,
    /// UI-only; never sent to the model.
    pub is_expanded: bool,
}

impl ReferenceItem {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

// ── Analysis result ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NoIssue,
    MinorOverlap,
    ModerateRisk,
    HighRisk,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::NoIssue      => "No issue",
            Category::MinorOverlap => "Minor overlap",
            Category::ModerateRisk => "Moderate risk",
            Category::HighRisk     => "High risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Verbatim,
    CloseParaphrase,
    Mosaic,
}

impl MatchType {
    pub fn label(&self) -> &'static str {
        match self {
            MatchType::Verbatim        => "Verbatim",
            MatchType::CloseParaphrase => "Close paraphrase",
            MatchType::Mosaic          => "Mosaic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    NoCitation,
    HasCitationButTooClose,
    ProperlyCited,
}

impl CitationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CitationStatus::NoCitation             => "No citation",
            CitationStatus::HasCitationButTooClose => "Cited, but too close",
            CitationStatus::ProperlyCited          => "Properly cited",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub document_span: String,
    pub reference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspected_reference_ids: Option<Vec<String>>,
    pub reference_snippet: String,
    pub citation_status: CitationStatus,
    pub similarity_explanation: String,
}

impl MatchResult {
    pub fn is_web_match(&self) -> bool {
        self.reference_id.as_deref() == Some(WEB_SOURCE_ID)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: String,
}

/// Structured report produced wholesale from the model's JSON reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_plagiarism_risk: u8,
    pub category: Category,
    pub summary: Vec<String>,
    pub matches: Vec<MatchResult>,
    #[serde(rename = "webSources", default, skip_serializing_if = "Option::is_none")]
    pub web_sources: Option<Vec<WebSource>>,
}

impl AnalysisResult {
    pub fn risk_tier(&self) -> RiskTier {
        RiskTier::from_score(self.overall_plagiarism_risk)
    }
}

// ── Risk tiers ────────────────────────────────────────────────────────────────

/// Colour tier for a risk score: ≥80 high, ≥50 moderate, ≥20 minor, else safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Safe,
    Minor,
    Moderate,
    High,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => RiskTier::High,
            50.. => RiskTier::Moderate,
            20.. => RiskTier::Minor,
            _    => RiskTier::Safe,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::High     => "red",
            RiskTier::Moderate => "orange",
            RiskTier::Minor    => "yellow",
            RiskTier::Safe     => "green",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::High     => "High",
            RiskTier::Moderate => "Moderate",
            RiskTier::Minor    => "Minor",
            RiskTier::Safe     => "Safe",
        }
    }
}
