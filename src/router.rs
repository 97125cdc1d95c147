use axum::{
    Router,
    routing::{get, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors},
    routes,
};

/// Builds the application router nested under the configured base URI.
/// Rate limiting is layered on separately in `main` since it needs redis.
pub fn build(state: AppState) -> Router {
    // 公开路由
    let public_routes =
        Router::new().route("/vendors/live", get(routes::vendor::find_live_vendors));

    // 需要认证的商户路由
    let protected_routes = Router::new()
        .route(
            "/vendors/{vendor_id}/location",
            put(routes::vendor::set_location).get(routes::vendor::get_location),
        )
        .route("/vendors/{vendor_id}/active", put(routes::vendor::set_active))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest(
            &state.config.api_base_uri,
            Router::new().merge(public_routes).merge(protected_routes),
        )
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
