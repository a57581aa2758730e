use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{db, error::AppResult, AppState};

// ── GET /metrics ──────────────────────────────────────────────────────────────

pub async fn scrape(State(state): State<AppState>) -> AppResult<Response> {
    state
        .metrics
        .set_active_connections(db::active_connections(&state.db));

    let body = state.metrics.render()?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    )
        .into_response())
}
