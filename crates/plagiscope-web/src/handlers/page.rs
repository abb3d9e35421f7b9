//! Main page and static assets.

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};

use crate::state::SharedState;
use crate::view::{render_page, MAIN_CSS};

pub async fn index(State(state): State<SharedState>) -> Html<String> {
    let session = state.snapshot().await;
    Html(render_page(&session))
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], MAIN_CSS)
}

pub async fn healthz() -> &'static str {
    "ok"
}
