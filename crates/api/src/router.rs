use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth_handlers, dashboard_handlers, middleware as auth_middleware, request_handlers, user_handlers, AppState,
};
use auth::Role;

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Web Work Request API is running",
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_handlers::register))
        .route("/api/auth/login", post(auth_handlers::login));

    // Account routes open to any authenticated caller
    let user_routes = Router::new()
        .route("/api/users/me", get(user_handlers::me))
        .route("/api/users", get(user_handlers::list_users))
        .route(
            "/api/users/{id}",
            get(user_handlers::get_user).put(user_handlers::update_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // Account administration (operator only); auth runs before the role gate
    let admin_routes = Router::new()
        .route("/api/users", post(user_handlers::create_user))
        .route("/api/users/{id}", delete(user_handlers::delete_user))
        .route_layer(middleware::from_fn_with_state(
            Role::Operator,
            auth_middleware::require_role,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    let dashboard_routes = Router::new()
        .route("/api/dashboard/stats", get(dashboard_handlers::stats))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    let request_routes = Router::new()
        .route(
            "/api/requests",
            post(request_handlers::create_request).get(request_handlers::list_requests),
        )
        .route("/api/requests/my-requests", get(request_handlers::my_requests))
        .route(
            "/api/requests/{id}",
            get(request_handlers::get_request).delete(request_handlers::delete_request),
        )
        .route("/api/requests/{id}/status", put(request_handlers::update_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(dashboard_routes)
        .merge(request_routes)
        .layer(middleware::from_fn_with_state(
            state.request_timeout,
            auth_middleware::request_deadline,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
