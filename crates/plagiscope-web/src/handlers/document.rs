//! Document upload, pasted text and check settings.

use axum::extract::{Multipart, State};
use axum::response::Redirect;
use axum::Form;
use serde::Deserialize;

use crate::handlers::{back_to_page, read_upload, surface};
use crate::session::FileTarget;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct DocumentTextForm {
    pub document_text: String,
}

#[derive(Deserialize)]
pub struct SettingsForm {
    pub document_type: Option<String>,
    /// Checkbox: present ("on") when ticked, absent otherwise
    pub use_web_search: Option<String>,
}

impl SettingsForm {
    pub fn web_search_enabled(&self) -> bool {
        matches!(self.use_web_search.as_deref(), Some("on" | "true" | "1"))
    }
}

pub async fn upload_document(State(state): State<SharedState>, multipart: Multipart) -> Redirect {
    let outcome = match read_upload(multipart).await {
        Ok((file, _)) => state.process_file(FileTarget::Document, file).await,
        Err(err) => Err(err),
    };
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn set_document_text(
    State(state): State<SharedState>,
    Form(form): Form<DocumentTextForm>,
) -> Redirect {
    let outcome = state.edit(|s| s.set_document_text(form.document_text)).await;
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn update_settings(
    State(state): State<SharedState>,
    Form(form): Form<SettingsForm>,
) -> Redirect {
    let outcome = apply_settings(&state, form).await;
    surface(&state, outcome).await;
    back_to_page()
}

pub(crate) async fn apply_settings(
    state: &SharedState,
    form: SettingsForm,
) -> plagiscope_common::Result<()> {
    let web_search = form.web_search_enabled();
    state
        .edit(|s| {
            if let Some(doc_type) = form.document_type.filter(|t| !t.trim().is_empty()) {
                s.set_document_type(doc_type)?;
            }
            s.set_web_search(web_search)
        })
        .await
}
