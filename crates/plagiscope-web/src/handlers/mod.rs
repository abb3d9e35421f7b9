//! HTTP handlers for all web routes.

pub mod analysis;
pub mod document;
pub mod page;
pub mod references;

use axum::extract::Multipart;
use axum::response::Redirect;
use plagiscope_common::PlagiscopeError;
use plagiscope_ingestion::UploadedFile;

use crate::state::SharedState;

/// Form posts always land back on the main page (post/redirect/get).
pub(crate) fn back_to_page() -> Redirect {
    Redirect::to("/")
}

/// Record a failed action on the session so the next render shows it.
pub(crate) async fn surface<T>(state: &SharedState, outcome: plagiscope_common::Result<T>) {
    if let Err(err) = outcome {
        tracing::debug!(error = %err, "Action rejected");
        state.record_error(&err).await;
    }
}

/// Pull the `file` part and any plain text fields out of a multipart upload.
pub(crate) async fn read_upload(
    mut multipart: Multipart,
) -> Result<(UploadedFile, Vec<(String, String)>), PlagiscopeError> {
    let upload_error = |e: axum::extract::multipart::MultipartError| {
        PlagiscopeError::Extraction(format!("upload failed: {e}"))
    };

    let mut file: Option<UploadedFile> = None;
    let mut fields = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(upload_error)?;
            file = Some(UploadedFile::new(file_name, content_type, bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(upload_error)?;
            fields.push((name, value));
        }
    }

    let file = file.ok_or_else(|| PlagiscopeError::Validation("Choose a file to upload.".to_string()))?;
    Ok((file, fields))
}
