//! Analysis trigger, reset and the JSON API.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::{Form, Json};

use crate::handlers::document::{apply_settings, SettingsForm};
use crate::handlers::{back_to_page, surface};
use crate::session::Session;
use crate::state::SharedState;

/// Save the settings submitted with the button, then start the run in the
/// background. Validation failures never reach the model.
pub async fn analyze(State(state): State<SharedState>, Form(form): Form<SettingsForm>) -> Redirect {
    let outcome = match apply_settings(&state, form).await {
        Ok(()) => state.start_analysis().await,
        Err(err) => Err(err),
    };
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn reset(State(state): State<SharedState>) -> Redirect {
    let outcome = state.reset().await;
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn dismiss_error(State(state): State<SharedState>) -> Redirect {
    let outcome = state
        .edit(|s| {
            s.dismiss_error();
            Ok(())
        })
        .await;
    surface(&state, outcome).await;
    back_to_page()
}

pub async fn api_session(State(state): State<SharedState>) -> Json<Session> {
    Json(state.snapshot().await)
}

pub async fn api_result(State(state): State<SharedState>) -> impl IntoResponse {
    match state.session.read().await.result() {
        Some(result) => Json(result.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "No analysis result yet").into_response(),
    }
}
