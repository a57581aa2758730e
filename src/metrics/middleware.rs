use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::Metrics;

/// Counts and times every request that reaches the wrapped routes, whatever
/// the response status. The label is the raw request path.
pub async fn track_requests(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(req).await;

    metrics.observe_request(&path, start.elapsed());
    response
}
