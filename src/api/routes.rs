use crate::api::handlers::{agents, answer, health, metrics, sessions};
use crate::api::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::monitoring::middleware::track_requests;
use crate::utils::toml_config::CorsConfig;
use crate::AppState;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;

/// Largest request body accepted, in bytes.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Routes of the API, without the outer middleware stack.
pub fn create_router(state: &AppState) -> Router<AppState> {
    let mut public_routes = Router::new()
        // Public routes (no auth required)
        .route("/", get(health::root))
        .route("/v1/health", get(health::health))
        .route("/metrics", get(metrics::metrics));

    if state.config.server.debug {
        let mut doc = ApiDoc::openapi();
        doc.info.title = state.config.server.title.clone();
        doc.info.description = Some(state.config.server.description.clone());
        doc.info.version = env!("CARGO_PKG_VERSION").to_string();
        public_routes = public_routes.route("/openapi.json", get(move || async move { Json(doc) }));
    }

    let protected_routes = Router::new()
        // Protected routes (auth required)
        .route("/v1/answer", post(answer::answer))
        .route("/v1/sessions", post(sessions::create_session))
        .route("/v1/agents", get(agents::list_agents))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            auth_middleware,
        ));

    public_routes.merge(protected_routes)
}

/// The complete application: routes plus metrics, CORS and tracing layers.
pub fn build_app(state: AppState) -> Router {
    create_router(&state)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
