// src/handlers/users.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::Session,
    models::auth::{AssignBusinessPayload, CreateMemberPayload, UpdateProfilePayload, User},
};

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário da sessão", body = User),
        (status = 401, description = "Sem sessão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(session: Session) -> Result<Json<User>, AppError> {
    Ok(Json(session.user()?.clone()))
}

// PUT /api/users/me
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Perfil atualizado", body = User),
        (status = 409, description = "E-mail em uso por outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_me(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .user_service
        .update_profile(session.actor(), &payload)
        .await?;
    Ok(Json(user))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateMemberPayload,
    responses(
        (status = 201, description = "Membro criado", body = User),
        (status = 403, description = "Apenas ADMIN"),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_member(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateMemberPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state
        .user_service
        .create_member(session.actor(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// PUT /api/users/{id}/business
#[utoipa::path(
    put,
    path = "/api/users/{id}/business",
    tag = "Users",
    request_body = AssignBusinessPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Negócio do usuário alterado", body = User),
        (status = 403, description = "Apenas ADMIN"),
        (status = 404, description = "Usuário ou negócio inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_business(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignBusinessPayload>,
) -> Result<Json<User>, AppError> {
    let user = app_state
        .user_service
        .assign_business(session.actor(), id, payload.business_id)
        .await?;
    Ok(Json(user))
}
