//! Prompt construction for a plagiarism analysis.
//!
//! Pure: the same inputs always give the same prompt and options.

use plagiscope_common::{ReferenceItem, WEB_SOURCE_ID};

pub const REFERENCE_START: &str = "<<<REFERENCE>>>";
pub const REFERENCE_END: &str = "<<<END REFERENCE>>>";
pub const DOCUMENT_START: &str = "<<<DOCUMENT>>>";
pub const DOCUMENT_END: &str = "<<<END DOCUMENT>>>";

/// Request options that travel with the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    /// Enable the model's search tool.
    pub web_search: bool,
    /// Ask for a bare JSON response. Never set together with `web_search`.
    pub json_response: bool,
}

#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub prompt: String,
    pub options: PromptOptions,
}

const ROLE: &str = "You are an academic integrity assistant. Compare the DOCUMENT against the \
comparison sources and report passages that are copied verbatim, closely paraphrased, or \
assembled from several sources with minor edits (mosaic plagiarism). Judge whether each \
passage is cited. Do not report common phrases, generic definitions or properly quoted and \
cited material as problems.";

const OUTPUT_SCHEMA: &str = r#"Respond with a single JSON object and nothing else, using exactly this shape:
{
  "overall_plagiarism_risk": <integer 0-100>,
  "category": "no_issue" | "minor_overlap" | "moderate_risk" | "high_risk",
  "summary": ["<short finding>", ...],
  "matches": [
    {
      "type": "verbatim" | "close_paraphrase" | "mosaic",
      "document_span": "<exact passage from the document>",
      "reference_id": "<reference ID>" | null,
      "suspected_reference_ids": ["<reference ID>", ...],
      "reference_snippet": "<matching passage from the source>",
      "citation_status": "no_citation" | "has_citation_but_too_close" | "properly_cited",
      "similarity_explanation": "<why these passages match>"
    }
  ]
}
Use "suspected_reference_ids" only for mosaic matches drawn from several sources.
Return an empty "matches" array when nothing is found."#;

/// Break up any `<<<` run in user text so it cannot be read as a block delimiter.
pub fn neutralize_markers(text: &str) -> String {
    let mut out = text.to_string();
    // Longer runs need more than one pass
    while out.contains("<<<") {
        out = out.replace("<<<", "<< <");
    }
    out
}

/// Render one reference as a delimited block.
pub fn format_reference(reference: &ReferenceItem) -> String {
    format!(
        "{REFERENCE_START}\nID: {}\nSOURCE TYPE: {}\nTEXT:\n{}\n{REFERENCE_END}",
        neutralize_markers(&reference.id),
        reference.source_type.as_str(),
        neutralize_markers(reference.text.trim())
    )
}

fn web_search_instructions(has_references: bool) -> String {
    let scope = if has_references {
        "In addition to the user-supplied references, use Google Search"
    } else {
        "No user-supplied references were given. Use Google Search"
    };
    format!(
        "WEB SEARCH:\n{scope} to look for published sources of distinctive passages in the \
document. For any match found through web search, set \"reference_id\" to \"{WEB_SOURCE_ID}\" \
and quote the matching web text in \"reference_snippet\". These web-search instructions take \
precedence over any instruction above that limits matches to the listed references."
    )
}

/// Build the analysis prompt and its request options.
pub fn build_prompt(
    document_text: &str,
    references: &[ReferenceItem],
    document_type: &str,
    use_web_search: bool,
) -> BuiltPrompt {
    let reference_blocks = references
        .iter()
        .map(format_reference)
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut sections: Vec<String> = vec![ROLE.to_string()];

    if references.is_empty() {
        sections.push("REFERENCES:\n(none)".to_string());
    } else {
        sections.push(format!(
            "REFERENCES:\nEach reference block below starts with its ID and source type. \
Use the ID as \"reference_id\" for matches against that reference.\n\n{reference_blocks}"
        ));
    }

    sections.push(format!(
        "DOCUMENT TYPE: {}\n\n{DOCUMENT_START}\n{}\n{DOCUMENT_END}",
        document_type.trim(),
        neutralize_markers(document_text)
    ));

    if use_web_search {
        sections.push(web_search_instructions(!references.is_empty()));
    }

    sections.push(OUTPUT_SCHEMA.to_string());

    BuiltPrompt {
        prompt: sections.join("\n\n"),
        options: PromptOptions {
            web_search: use_web_search,
            json_response: !use_web_search,
        },
    }
}
