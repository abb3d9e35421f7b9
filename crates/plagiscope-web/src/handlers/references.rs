//! Reference list editing.

use axum::extract::{Multipart, Path, State};
use axum::response::Redirect;
use axum::Form;
use plagiscope_common::{PlagiscopeError, SourceType};
use plagiscope_ingestion::ReferenceField;
use serde::Deserialize;

use crate::handlers::{back_to_page, read_upload, surface};
use crate::session::FileTarget;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct UpdateForm {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

pub async fn add_reference(State(state): State<SharedState>) -> Redirect {
    let outcome = state.edit(|s| s.add_reference()).await;
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn update_reference(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
    Form(form): Form<UpdateForm>,
) -> Redirect {
    let outcome = match ReferenceField::parse(&form.field, &form.value) {
        Ok(field) => state.edit(|s| s.update_reference(index, field)).await.map(|_| ()),
        Err(msg) => Err(PlagiscopeError::Validation(msg)),
    };
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn remove_reference(State(state): State<SharedState>, Path(index): Path<usize>) -> Redirect {
    let outcome = state.edit(|s| s.remove_reference(index)).await;
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn toggle_reference(State(state): State<SharedState>, Path(index): Path<usize>) -> Redirect {
    let outcome = state.edit(|s| Ok(s.toggle_reference(index))).await;
    surface(&state, outcome).await;
    back_to_page()
}

/// Add a reference whose text comes from an uploaded file.
pub async fn upload_reference(State(state): State<SharedState>, multipart: Multipart) -> Redirect {
    let outcome = match read_upload(multipart).await {
        Ok((file, fields)) => {
            let source_type = fields
                .iter()
                .find(|(name, _)| name == "source_type")
                .and_then(|(_, value)| value.parse::<SourceType>().ok())
                .unwrap_or_default();
            state.process_file(FileTarget::Reference(source_type), file).await
        }
        Err(err) => Err(err),
    };
    surface(&state, outcome).await;
    back_to_page()
}
