// src/handlers/business.rs

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
    models::business::{
        Business, BusinessIdPayload, BusinessList, CreateBusinessPayload, DeletedBusiness,
        ListBusinessQuery, OwnBusiness, SelectedBusiness, UpdateBusinessPayload,
    },
};

// =============================================================================
//  CRUD
// =============================================================================

// GET /api/business
#[utoipa::path(
    get,
    path = "/api/business",
    tag = "Business",
    params(ListBusinessQuery),
    responses(
        (status = 200, description = "Negócios, mais recentes primeiro", body = BusinessList),
        (status = 403, description = "Apenas ADMIN")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_businesses(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<ListBusinessQuery>,
) -> Result<Json<BusinessList>, AppError> {
    let list = app_state
        .business_service
        .list(session.actor(), query.include_archived)
        .await?;
    Ok(Json(list))
}

// POST /api/business
#[utoipa::path(
    post,
    path = "/api/business",
    tag = "Business",
    request_body = CreateBusinessPayload,
    responses(
        (status = 201, description = "Negócio criado", body = Business),
        (status = 400, description = "Nome ausente"),
        (status = 403, description = "Sem permissão para criar"),
        (status = 409, description = "WhatsApp já registrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_business(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateBusinessPayload>,
) -> Result<impl IntoResponse, AppError> {
    let business = app_state
        .business_service
        .create(session.actor(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(business)))
}

// PUT /api/business
#[utoipa::path(
    put,
    path = "/api/business",
    tag = "Business",
    request_body = UpdateBusinessPayload,
    responses(
        (status = 200, description = "Negócio próprio atualizado", body = Business),
        (status = 403, description = "Usuário sem negócio")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_own_business(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateBusinessPayload>,
) -> Result<Json<Business>, AppError> {
    let business = app_state
        .business_service
        .update_own(session.actor(), payload)
        .await?;
    Ok(Json(business))
}

// DELETE /api/business
#[utoipa::path(
    delete,
    path = "/api/business",
    tag = "Business",
    request_body = BusinessIdPayload,
    responses(
        (status = 200, description = "Negócio excluído e usuários desassociados", body = DeletedBusiness),
        (status = 403, description = "Apenas ADMIN"),
        (status = 404, description = "Negócio inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_business(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<BusinessIdPayload>,
) -> Result<Json<DeletedBusiness>, AppError> {
    let deleted = app_state
        .business_service
        .delete(session.actor(), payload.business_id)
        .await?;
    Ok(Json(deleted))
}

// GET /api/business/mine
#[utoipa::path(
    get,
    path = "/api/business/mine",
    tag = "Business",
    responses(
        (status = 200, description = "Negócio do usuário, se houver", body = OwnBusiness)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_own_business(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<OwnBusiness>, AppError> {
    let own = app_state.business_service.get_own(session.actor()).await?;
    Ok(Json(own))
}

// GET /api/business/{id}
#[utoipa::path(
    get,
    path = "/api/business/{id}",
    tag = "Business",
    params(("id" = Uuid, Path, description = "ID do negócio")),
    responses(
        (status = 200, description = "Negócio", body = Business),
        (status = 403, description = "Negócio de outro tenant"),
        (status = 404, description = "Negócio inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_business(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Business>, AppError> {
    let business = app_state.business_service.get(session.actor(), id).await?;
    Ok(Json(business))
}

// PUT /api/business/{id}
#[utoipa::path(
    put,
    path = "/api/business/{id}",
    tag = "Business",
    params(("id" = Uuid, Path, description = "ID do negócio")),
    request_body = UpdateBusinessPayload,
    responses(
        (status = 200, description = "Negócio atualizado", body = Business),
        (status = 400, description = "Nome ausente"),
        (status = 403, description = "Negócio de outro tenant"),
        (status = 409, description = "WhatsApp já registrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_business(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessPayload>,
) -> Result<Json<Business>, AppError> {
    let business = app_state
        .business_service
        .update(session.actor(), id, payload)
        .await?;
    Ok(Json(business))
}

// =============================================================================
//  NEGÓCIO SELECIONADO
// =============================================================================

// GET /api/business/select
#[utoipa::path(
    get,
    path = "/api/business/select",
    tag = "Business",
    responses(
        (status = 200, description = "Negócio selecionado (escolhido automaticamente se necessário)", body = SelectedBusiness),
        (status = 401, description = "Sem sessão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_selected_business(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Json<SelectedBusiness>, AppError> {
    let selected = app_state.selection_service.current(session.actor()).await?;
    Ok(Json(selected))
}

// POST /api/business/select
#[utoipa::path(
    post,
    path = "/api/business/select",
    tag = "Business",
    request_body = BusinessIdPayload,
    responses(
        (status = 200, description = "Negócio selecionado", body = Business),
        (status = 403, description = "Negócio de outro tenant"),
        (status = 404, description = "Negócio inexistente ou arquivado")
    ),
    security(("api_jwt" = []))
)]
pub async fn select_business(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<BusinessIdPayload>,
) -> Result<Json<Business>, AppError> {
    let business = app_state
        .selection_service
        .select(session.actor(), payload.business_id)
        .await?;
    Ok(Json(business))
}
