pub mod auth;
pub mod middleware;
pub mod payload;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use auth::login_handler;
pub use middleware::require_admin;
pub use rest::{
    create_product_handler, delete_product_handler, get_product_handler, list_products_handler,
    update_product_handler,
};
use state::AppState;

/// Builds the complete API router: public catalog and login routes, plus the
/// admin routes behind the bearer token middleware.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(app_state.config.allowed_origins.clone()))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/login", post(login_handler))
        .route("/products", get(list_products_handler))
        .route("/products/{id}", get(get_product_handler));

    // Admin routes (admin bearer token required)
    let admin_routes = Router::new()
        .route("/admin/products", post(create_product_handler))
        .route(
            "/admin/products/{id}",
            put(update_product_handler).delete(delete_product_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
