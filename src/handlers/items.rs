use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{db, error::AppResult, AppState};

// ── GET /items ────────────────────────────────────────────────────────────────

pub async fn list_items(State(state): State<AppState>) -> AppResult<Response> {
    let start = Instant::now();
    let items = db::fetch_all_items(&state.db).await?;
    let elapsed = start.elapsed();

    state.metrics.observe_query(db::ITEMS_QUERY, elapsed);

    debug!(
        count = items.len(),
        elapsed_ms = elapsed.as_millis(),
        "Listed items"
    );

    let body = serde_json::to_vec(&items)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}
