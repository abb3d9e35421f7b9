//! Server-rendered HTML for the two UI modes.
//!
//! Rendering is pure: it reads a [`Session`] snapshot and never mutates it.
//! All user and model text goes through [`escape_html`].

use plagiscope_common::{AnalysisResult, MatchResult, SourceType, WebSource};

use crate::session::{Session, SessionPhase};

/// Navigation HTML shared across all pages
pub const NAV_HTML: &str = include_str!("../templates/nav.html");
pub const MAIN_CSS: &str = include_str!("../static/main.css");

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&'  => out.push_str("&amp;"),
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _    => out.push(c),
        }
    }
    out
}

/// Full page for the current session: result mode when a result is held,
/// input mode otherwise.
pub fn render_page(session: &Session) -> String {
    let error_html = session
        .last_error()
        .map(|msg| format!(r#"<div class="alert alert-danger" role="alert">{}</div>"#, escape_html(msg)))
        .unwrap_or_default();

    let body = match session.result() {
        Some(result) => render_result(result),
        None => render_input(session),
    };

    // While something is in flight, reload as soon as the server reports progress.
    let live_script = if session.is_busy() {
        r#"<script>
const events = new EventSource('/api/events');
events.onmessage = (e) => {
    const ev = JSON.parse(e.data);
    if (ev.type !== 'session_changed' || ev.phase === 'idle' || ev.phase === 'result_shown') {
        window.location.reload();
    }
};
</script>"#
    } else {
        ""
    };

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Plagiscope</title>
    <link rel="stylesheet" href="/static/main.css">
</head>
<body>
{}
<main class="main-content">
    {}
    {}
</main>
{}
</body>
</html>"#, NAV_HTML, error_html, body, live_script)
}

// ── Input mode ────────────────────────────────────────────────────────────────

fn source_type_options(selected: SourceType) -> String {
    SourceType::ALL
        .iter()
        .map(|st| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                st.as_str(),
                if *st == selected { " selected" } else { "" },
                st.label()
            )
        })
        .collect()
}

fn render_references(session: &Session, locked: &str) -> String {
    if session.references.is_empty() {
        return r#"<div class="empty-state">No references yet. Add a reference text or enable web search.</div>"#
            .to_string();
    }

    session.references.items().iter().enumerate().map(|(i, r)| {
        let preview = if r.has_text() {
            let snippet: String = r.text.chars().take(80).collect();
            format!("{}{}", escape_html(&snippet), if r.text.chars().count() > 80 { "…" } else { "" })
        } else {
            r#"<em class="text-muted">empty</em>"#.to_string()
        };

        let body = if r.is_expanded {
            format!(r#"
            <div class="reference-body">
                <form method="POST" action="/references/{i}/update" class="row">
                    <input type="hidden" name="field" value="id">
                    <input type="text" name="value" value="{id}" aria-label="Reference ID"{locked}>
                    <button type="submit" class="btn"{locked}>Rename</button>
                </form>
                <form method="POST" action="/references/{i}/update" class="row">
                    <input type="hidden" name="field" value="source_type">
                    <select name="value" onchange="this.form.submit()" aria-label="Source type"{locked}>{options}</select>
                </form>
                <form method="POST" action="/references/{i}/update">
                    <input type="hidden" name="field" value="text">
                    <textarea name="value" placeholder="Paste the reference text here"{locked}>{text}</textarea>
                    <button type="submit" class="btn"{locked}>Save text</button>
                </form>
            </div>"#,
                id = escape_html(&r.id),
                options = source_type_options(r.source_type),
                text = escape_html(&r.text),
            )
        } else {
            String::new()
        };

        format!(r#"
        <div class="reference">
            <div class="reference-header">
                <strong>{id}</strong>
                <span class="badge">{source}</span>
                <span class="text-muted" style="flex:1">{preview}</span>
                <form method="POST" action="/references/{i}/toggle" class="inline-form">
                    <button type="submit" class="btn">{toggle}</button>
                </form>
                <form method="POST" action="/references/{i}/remove" class="inline-form">
                    <button type="submit" class="btn btn-danger"{locked}>Remove</button>
                </form>
            </div>
            {body}
        </div>"#,
            id = escape_html(&r.id),
            source = r.source_type.label(),
            toggle = if r.is_expanded { "Collapse" } else { "Edit" },
        )
    }).collect()
}

fn render_input(session: &Session) -> String {
    let busy = session.is_busy();
    let locked = if busy { " disabled" } else { "" };

    let status_html = match session.phase() {
        SessionPhase::ProcessingFile => {
            r#"<div class="alert alert-info">Reading file…</div>"#
        }
        SessionPhase::Analyzing => {
            r#"<div class="alert alert-info">Analyzing document. This can take a minute for long texts.</div>"#
        }
        _ => "",
    };

    let doc_label = match &session.document_name {
        Some(name) => format!("Loaded from <strong>{}</strong>", escape_html(name)),
        None => "Paste text or upload a PDF / text file".to_string(),
    };

    let analyze_label = if session.phase() == SessionPhase::Analyzing { "Analyzing…" } else { "Analyze" };

    format!(r#"
    <div class="page-header">
        <h1 class="page-title">New plagiarism check</h1>
        <p class="text-muted">Compare a document against your reference texts and, optionally, the web.</p>
    </div>
    {status_html}

    <div class="card">
        <div class="card-header">
            <h2>Document</h2>
            <span class="text-muted">{chars} characters</span>
        </div>
        <div class="card-body">
            <p class="text-muted">{doc_label}</p>
            <form method="POST" action="/document/upload" enctype="multipart/form-data" class="row">
                <input type="file" name="file" accept=".pdf,.txt,.md,application/pdf,text/plain"{locked}>
                <button type="submit" class="btn"{locked}>Upload</button>
            </form>
            <form method="POST" action="/document/text" style="margin-top:.75rem">
                <textarea name="document_text" placeholder="…or paste the document text here"{locked}>{document}</textarea>
                <button type="submit" class="btn"{locked}>Save text</button>
            </form>
        </div>
    </div>

    <div class="card">
        <div class="card-header">
            <h2>References</h2>
            <span class="text-muted">{ref_count} total</span>
        </div>
        <div class="card-body">
            {references}
            <div class="row">
                <form method="POST" action="/references/add" class="inline-form">
                    <button type="submit" class="btn"{locked}>+ Add reference</button>
                </form>
                <form method="POST" action="/references/upload" enctype="multipart/form-data" class="row">
                    <select name="source_type" aria-label="Source type"{locked}>{upload_options}</select>
                    <input type="file" name="file" accept=".pdf,.txt,.md,application/pdf,text/plain"{locked}>
                    <button type="submit" class="btn"{locked}>Add from file</button>
                </form>
            </div>
        </div>
    </div>

    <div class="card">
        <div class="card-body">
            <form method="POST" action="/analyze" class="row">
                <label>Document type
                    <input type="text" name="document_type" value="{document_type}"{locked}>
                </label>
                <label><input type="checkbox" name="use_web_search" value="on"{web_checked}{locked}> Also search the web</label>
                <button type="submit" class="btn btn-primary btn-lg"{locked}>{analyze_label}</button>
            </form>
        </div>
    </div>"#,
        chars = session.document_text.chars().count(),
        document = escape_html(&session.document_text),
        ref_count = session.references.len(),
        references = render_references(session, locked),
        upload_options = source_type_options(SourceType::default()),
        document_type = escape_html(&session.document_type),
        web_checked = if session.use_web_search { " checked" } else { "" },
    )
}

// ── Result mode ───────────────────────────────────────────────────────────────

fn render_match(index: usize, m: &MatchResult) -> String {
    let source = match m.reference_id.as_deref() {
        _ if m.is_web_match() => "Web source".to_string(),
        Some(id) => format!("Reference {}", escape_html(id)),
        None => "Unattributed".to_string(),
    };

    let suspected = m
        .suspected_reference_ids
        .as_ref()
        .filter(|ids| !ids.is_empty())
        .map(|ids| {
            let list = ids.iter().map(|id| escape_html(id)).collect::<Vec<_>>().join(", ");
            format!(r#"<div class="text-muted">Suspected sources: {list}</div>"#)
        })
        .unwrap_or_default();

    format!(r#"
    <div class="match">
        <div class="row">
            <strong>#{n} {kind}</strong>
            <span class="badge">{citation}</span>
            <span class="text-muted">{source}</span>
        </div>
        {suspected}
        <div>Document:</div>
        <blockquote>{span}</blockquote>
        <div>Source:</div>
        <blockquote>{snippet}</blockquote>
        <p>{explanation}</p>
    </div>"#,
        n = index + 1,
        kind = m.match_type.label(),
        citation = m.citation_status.label(),
        span = escape_html(&m.document_span),
        snippet = escape_html(&m.reference_snippet),
        explanation = escape_html(&m.similarity_explanation),
    )
}

fn render_web_sources(sources: &[WebSource]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let items: String = sources
        .iter()
        .map(|s| {
            format!(
                r#"<li><a href="{}" target="_blank" rel="noopener noreferrer">{}</a></li>"#,
                escape_html(&s.uri),
                escape_html(&s.title)
            )
        })
        .collect();
    format!(r#"
    <div class="card">
        <div class="card-header"><h3>Web sources</h3></div>
        <div class="card-body"><ul>{items}</ul></div>
    </div>"#)
}

/// Result mode: risk gauge, summary, matches and web sources.
pub fn render_result(result: &AnalysisResult) -> String {
    let tier = result.risk_tier();
    let color = tier.color();

    let summary: String = result
        .summary
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();

    let matches_html = if result.matches.is_empty() {
        r#"<div class="empty-state">No plagiarism matches were found.</div>"#.to_string()
    } else {
        result.matches.iter().enumerate().map(|(i, m)| render_match(i, m)).collect()
    };

    let web_html = render_web_sources(result.web_sources.as_deref().unwrap_or(&[]));

    format!(r#"
    <div class="page-header">
        <h1 class="page-title">Analysis result</h1>
    </div>

    <div class="card">
        <div class="card-body risk">
            <div class="risk-score risk-{color}">{score}</div>
            <div style="flex:1">
                <div><strong>{tier_label} risk</strong> · {category}</div>
                <div class="bar-track"><div class="bar bar-{color}" style="width:{score}%"></div></div>
            </div>
        </div>
    </div>

    <div class="card">
        <div class="card-header"><h3>Summary</h3></div>
        <div class="card-body"><ul>{summary}</ul></div>
    </div>

    <div class="card">
        <div class="card-header">
            <h3>Matches</h3>
            <span class="text-muted">{match_count}</span>
        </div>
        <div class="card-body">{matches_html}</div>
    </div>

    {web_html}

    <form method="POST" action="/reset">
        <button type="submit" class="btn btn-primary btn-lg">Start a new check</button>
    </form>"#,
        score = result.overall_plagiarism_risk,
        tier_label = tier.label(),
        category = result.category.label(),
        match_count = result.matches.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use plagiscope_common::{Category, CitationStatus, MatchType, WEB_SOURCE_ID};

    fn result(risk: u8, matches: Vec<MatchResult>) -> AnalysisResult {
        AnalysisResult {
            overall_plagiarism_risk: risk,
            category: Category::ModerateRisk,
            summary: vec!["Two passages copied.".into()],
            matches,
            web_sources: None,
        }
    }

    fn web_match() -> MatchResult {
        MatchResult {
            match_type: MatchType::Verbatim,
            document_span: "<b>copied</b>".into(),
            reference_id: Some(WEB_SOURCE_ID.into()),
            suspected_reference_ids: None,
            reference_snippet: "copied".into(),
            citation_status: CitationStatus::NoCitation,
            similarity_explanation: "Identical.".into(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_result_color_follows_tier() {
        assert!(render_result(&result(19, vec![])).contains("risk-green"));
        assert!(render_result(&result(20, vec![])).contains("risk-yellow"));
        assert!(render_result(&result(50, vec![])).contains("risk-orange"));
        assert!(render_result(&result(80, vec![])).contains("risk-red"));
    }

    #[test]
    fn test_empty_matches_show_empty_state() {
        let html = render_result(&result(5, vec![]));
        assert!(html.contains("No plagiarism matches were found."));
        assert!(html.contains("Two passages copied."));
    }

    #[test]
    fn test_match_text_is_escaped_and_web_labelled() {
        let html = render_result(&result(60, vec![web_match()]));
        assert!(html.contains("&lt;b&gt;copied&lt;/b&gt;"));
        assert!(!html.contains("<b>copied</b>"));
        assert!(html.contains("Web source"));
        assert!(html.contains("No citation"));
    }

    #[test]
    fn test_web_sources_listed_when_present() {
        let mut r = result(60, vec![]);
        assert!(!render_result(&r).contains("Web sources"));
        r.web_sources = Some(vec![WebSource { uri: "https://a.org".into(), title: "A".into() }]);
        let html = render_result(&r);
        assert!(html.contains("Web sources"));
        assert!(html.contains(r#"href="https://a.org""#));
    }

    #[test]
    fn test_input_mode_lists_references() {
        let mut session = Session::new("Essay", false);
        session.add_reference().unwrap();
        let html = render_page(&session);
        assert!(html.contains("REF-001"));
        assert!(html.contains(r#"action="/analyze""#));
        assert!(!html.contains("EventSource"));
    }

    #[test]
    fn test_analyzing_page_disables_inputs_and_listens() {
        let mut session = Session::new("Essay", true);
        session.set_document_text("text".into()).unwrap();
        session.begin_analysis().unwrap();
        let html = render_page(&session);
        assert!(html.contains("Analyzing…"));
        assert!(html.contains(" disabled"));
        assert!(html.contains("EventSource"));
    }
}
