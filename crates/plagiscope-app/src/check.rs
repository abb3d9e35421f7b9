//! `plagiscope check`: one headless analysis through the same session
//! controller the web app uses.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use plagiscope_common::{AnalysisResult, PlagiscopeError, SourceType};
use plagiscope_ingestion::UploadedFile;
use plagiscope_llm::AnalysisClient;
use plagiscope_web::{AppState, FileTarget, Session};

use crate::config::AnalysisConfig;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document to check (PDF or plain text)
    pub document: PathBuf,
    /// Reference text file or PDF; repeat for several
    #[arg(short, long = "reference", value_name = "FILE")]
    pub references: Vec<PathBuf>,
    /// Source type recorded for every --reference
    #[arg(long, value_name = "TYPE", default_value = "paper")]
    pub source_type: SourceType,
    /// Also search the public web (always on when analysis.web_search_default is set)
    #[arg(long)]
    pub web_search: bool,
    /// Document type label, e.g. "Lab report"
    #[arg(long, value_name = "TYPE")]
    pub document_type: Option<String>,
    /// Print the raw JSON result instead of a report
    #[arg(long)]
    pub json: bool,
}

pub async fn run(analyzer: AnalysisClient, defaults: &AnalysisConfig, args: CheckArgs) -> anyhow::Result<()> {
    let result = run_check(analyzer, defaults, &args).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_report(&result)?);
    }
    Ok(())
}

fn user_facing(err: PlagiscopeError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}

async fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(name, None, bytes))
}

pub async fn run_check(
    analyzer: AnalysisClient,
    defaults: &AnalysisConfig,
    args: &CheckArgs,
) -> anyhow::Result<AnalysisResult> {
    let document_type = args
        .document_type
        .clone()
        .unwrap_or_else(|| defaults.default_document_type.clone());
    let session = Session::new(document_type, args.web_search || defaults.web_search_default);
    let state = AppState::new(analyzer, session);

    let document = read_upload(&args.document).await?;
    state.process_file(FileTarget::Document, document).await.map_err(user_facing)?;

    for path in &args.references {
        let file = read_upload(path).await?;
        state
            .process_file(FileTarget::Reference(args.source_type), file)
            .await
            .map_err(user_facing)?;
    }

    tracing::info!(
        document = %args.document.display(),
        references = args.references.len(),
        "Running headless check"
    );
    state.analyze_now().await.map_err(user_facing)
}

pub fn render_report(result: &AnalysisResult) -> Result<String, fmt::Error> {
    let tier = result.risk_tier();
    let mut out = String::new();

    writeln!(
        out,
        "Overall plagiarism risk: {}/100 ({})",
        result.overall_plagiarism_risk,
        tier.label()
    )?;
    writeln!(out, "Category: {}", result.category.label())?;

    if !result.summary.is_empty() {
        writeln!(out, "\nSummary")?;
        for line in &result.summary {
            writeln!(out, "  - {line}")?;
        }
    }

    writeln!(out, "\nMatches ({})", result.matches.len())?;
    if result.matches.is_empty() {
        writeln!(out, "  No plagiarism matches were found.")?;
    }
    for (i, m) in result.matches.iter().enumerate() {
        let source = if m.is_web_match() {
            "web".to_string()
        } else {
            m.reference_id.clone().unwrap_or_else(|| "unknown source".to_string())
        };
        writeln!(
            out,
            "  {}. {} | {} | {}",
            i + 1,
            m.match_type.label(),
            source,
            m.citation_status.label()
        )?;
        if let Some(ids) = &m.suspected_reference_ids {
            writeln!(out, "     Suspected sources: {}", ids.join(", "))?;
        }
        writeln!(out, "     Document:  \"{}\"", m.document_span)?;
        writeln!(out, "     Reference: \"{}\"", m.reference_snippet)?;
        writeln!(out, "     Why: {}", m.similarity_explanation)?;
    }

    if let Some(sources) = &result.web_sources {
        writeln!(out, "\nWeb sources")?;
        for s in sources {
            writeln!(out, "  - {} <{}>", s.title, s.uri)?;
        }
    }
    Ok(out)
}
