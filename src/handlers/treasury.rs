// src/handlers/treasury.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermTreasuryRead, PermTreasuryWrite, RequirePermission},
    },
    models::treasury::{CreateTreasuryPayload, CreateTreasuryTransactionPayload, Treasury, TreasuryTransaction},
};

#[utoipa::path(
    get,
    path = "/api/treasuries",
    tag = "Treasury",
    responses((status = 200, description = "Tesourarias", body = Vec<Treasury>)),
    security(("api_jwt" = []))
)]
pub async fn list_treasuries(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermTreasuryRead>,
) -> Result<impl IntoResponse, ApiError> {
    let treasuries = app_state
        .treasury_service
        .list_treasuries()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(treasuries))
}

#[utoipa::path(
    post,
    path = "/api/treasuries",
    tag = "Treasury",
    request_body = CreateTreasuryPayload,
    responses(
        (status = 201, description = "Tesouraria criada com saldo zero", body = Treasury),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_treasury(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermTreasuryWrite>,
    Json(payload): Json<CreateTreasuryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let treasury = app_state
        .treasury_service
        .create_treasury(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(treasury)))
}

#[utoipa::path(
    get,
    path = "/api/treasuries/{id}",
    tag = "Treasury",
    params(("id" = Uuid, Path, description = "ID da tesouraria")),
    responses(
        (status = 200, description = "Tesouraria", body = Treasury),
        (status = 404, description = "Tesouraria não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_treasury(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermTreasuryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let treasury = app_state
        .treasury_service
        .get_treasury(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(treasury))
}

#[utoipa::path(
    get,
    path = "/api/treasuries/{id}/transactions",
    tag = "Treasury",
    params(("id" = Uuid, Path, description = "ID da tesouraria")),
    responses((status = 200, description = "Lançamentos (mais recentes primeiro)", body = Vec<TreasuryTransaction>)),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermTreasuryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = app_state
        .treasury_service
        .list_transactions(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(transactions))
}

#[utoipa::path(
    post,
    path = "/api/treasuries/{id}/transactions",
    tag = "Treasury",
    params(("id" = Uuid, Path, description = "ID da tesouraria")),
    request_body = CreateTreasuryTransactionPayload,
    responses(
        (status = 201, description = "Lançamento manual registrado", body = TreasuryTransaction),
        (status = 422, description = "Saldo insuficiente ou tesouraria inativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermTreasuryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateTreasuryTransactionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let transaction = app_state
        .treasury_service
        .create_manual_transaction(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(transaction)))
}
