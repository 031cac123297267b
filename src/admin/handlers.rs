use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;

/// Queue a reload and answer once it has run.
pub async fn reload(State(state): State<AppState>) -> Response {
    match state.reload.request().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to reload config: {e}\n"),
        )
            .into_response(),
    }
}

pub async fn quit(State(state): State<AppState>) -> &'static str {
    state.termination.request_quit();
    "Requesting termination... Goodbye!\n"
}
