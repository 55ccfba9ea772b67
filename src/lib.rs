// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::{require_session, session_resolver};

/// Monta o router completo. A sessão é resolvida em toda requisição; os grupos
/// protegidos recusam pedidos sem sessão antes de ler o corpo, e cada operação
/// aplica as regras de acesso no serviço.
pub fn build_router(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/", post(handlers::users::create_member))
        .route(
            "/me",
            get(handlers::users::get_me).put(handlers::users::update_me),
        )
        .route("/{id}/business", put(handlers::users::assign_business))
        .route_layer(axum_middleware::from_fn(require_session));

    let business_routes = Router::new()
        .route(
            "/",
            get(handlers::business::list_businesses)
                .post(handlers::business::create_business)
                .put(handlers::business::update_own_business)
                .delete(handlers::business::delete_business),
        )
        .route("/mine", get(handlers::business::get_own_business))
        .route(
            "/select",
            get(handlers::business::get_selected_business)
                .post(handlers::business::select_business),
        )
        .route(
            "/{id}",
            get(handlers::business::get_business).put(handlers::business::update_business),
        )
        .route_layer(axum_middleware::from_fn(require_session));

    let client_routes = Router::new()
        .route(
            "/",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::archive_client),
        )
        .route_layer(axum_middleware::from_fn(require_session));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/business", business_routes)
        .nest("/api/clients", client_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_resolver,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
