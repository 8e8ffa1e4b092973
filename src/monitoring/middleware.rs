use crate::monitoring::FabricMetrics;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Records `http_requests_total` and `http_request_duration_seconds` for
/// every request, labelled by the matched route template.
pub async fn track_requests(
    State(metrics): State<Arc<FabricMetrics>>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let duration = started.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    metrics.record_http_request(&method, &endpoint, status, duration);

    info!(
        method = %method,
        endpoint = %endpoint,
        status_code = status,
        duration_ms = (duration * 1000.0) as u64,
        "Request completed"
    );

    response
}
