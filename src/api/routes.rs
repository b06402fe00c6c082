use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Assemble the application router.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(crate::api::handlers::meta::health))
        .route("/app", get(crate::api::handlers::meta::app_info))
        .route("/chat", post(crate::api::handlers::chat::chat))
        .route(
            "/sessions/{id}",
            get(crate::api::handlers::sessions::get_session),
        )
        .route(
            "/feedback",
            post(crate::api::handlers::feedback::submit_feedback)
                .get(crate::api::handlers::feedback::list_feedback),
        );

    let router = Router::new().nest("/api", api_routes);

    #[cfg(feature = "ui")]
    let router = router.fallback(crate::ui::static_handler);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
