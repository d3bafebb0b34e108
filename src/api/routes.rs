//! Router configuration for the API.
//!
//! Routes are collected through `OpenApiRouter` so the OpenAPI document is
//! produced from the same registrations that serve traffic.

use std::time::Duration;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    global_error_handler, logging_middleware, request_id_middleware, request_timeout_middleware,
};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. CORS, answering preflight requests before anything else
/// 2. Compression
/// 3. Request ID, generated or propagated
/// 4. Logging, inside the request ID so the span carries it
/// 5. Error envelope for responses not produced by `AppError`
/// 6. Request time limit
///
/// # Routes
/// - `/prenotazioni-materiali` - Material reservations
/// - `/prenotazioni-mezzi` - Vehicle reservations
/// - `/health` - Probes
/// - `/swagger-ui`, `/api-docs/openapi.json` - API documentation
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(handlers::material_reservations::material_reservation_routes())
        .merge(handlers::vehicle_reservations::vehicle_reservation_routes())
        .merge(handlers::health::health_routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(middleware::from_fn_with_state(
            request_timeout,
            request_timeout_middleware,
        ))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
