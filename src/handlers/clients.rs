// src/handlers/clients.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::Session,
    models::client::{ArchivedClient, Client, ClientPage, ClientPayload, ListClientsQuery},
};

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ListClientsQuery),
    responses(
        (status = 200, description = "Página de clientes ativos", body = ClientPage),
        (status = 403, description = "Sem negócio ou negócio de outro tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<ClientPage>, AppError> {
    let page = app_state.client_service.list(session.actor(), &query).await?;
    Ok(Json(page))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Nome ausente"),
        (status = 409, description = "E-mail já usado por outro cliente do negócio")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.client_service.create(session.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente inexistente, arquivado ou de outro tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    let client = app_state.client_service.get(session.actor(), id).await?;
    Ok(Json(client))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 404, description = "Cliente inexistente, arquivado ou de outro tenant"),
        (status = 409, description = "E-mail já usado por outro cliente do negócio")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, AppError> {
    let client = app_state
        .client_service
        .update(session.actor(), id, payload)
        .await?;
    Ok(Json(client))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente arquivado", body = ArchivedClient),
        (status = 404, description = "Cliente inexistente, arquivado ou de outro tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn archive_client(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ArchivedClient>, AppError> {
    let archived = app_state.client_service.archive(session.actor(), id).await?;
    Ok(Json(archived))
}
