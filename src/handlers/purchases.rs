// src/handlers/purchases.rs

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
        rbac::{PermPurchasesRead, PermPurchasesWrite, RequirePermission},
    },
    models::purchases::{
        CreatePurchasePayload, Purchase, PurchaseDetail, ReceivePurchasePayload, SupplierPaymentPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/purchases",
    tag = "Purchases",
    responses((status = 200, description = "Faturas de compra", body = Vec<Purchase>)),
    security(("api_jwt" = []))
)]
pub async fn list_purchases(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let purchases = app_state
        .purchase_service
        .list_purchases()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchases))
}

#[utoipa::path(
    post,
    path = "/api/purchases",
    tag = "Purchases",
    request_body = CreatePurchasePayload,
    responses(
        (status = 201, description = "Compra registrada (aguardando recebimento)", body = PurchaseDetail),
        (status = 404, description = "Fornecedor ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasesWrite>,
    Json(payload): Json<CreatePurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = app_state
        .purchase_service
        .create_purchase(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(purchase)))
}

#[utoipa::path(
    get,
    path = "/api/purchases/{id}",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    responses(
        (status = 200, description = "Compra com itens", body = PurchaseDetail),
        (status = 404, description = "Compra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPurchasesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = app_state
        .purchase_service
        .get_purchase(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchase))
}

#[utoipa::path(
    post,
    path = "/api/purchases/{id}/receive",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    request_body = ReceivePurchasePayload,
    responses(
        (status = 200, description = "Mercadoria recebida no estoque", body = PurchaseDetail),
        (status = 409, description = "Compra já recebida"),
        (status = 422, description = "Quantidade maior que a pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_purchase(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceivePurchasePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = app_state
        .purchase_service
        .receive_purchase(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchase))
}

#[utoipa::path(
    post,
    path = "/api/purchases/{id}/payments",
    tag = "Purchases",
    params(("id" = Uuid, Path, description = "ID da compra")),
    request_body = SupplierPaymentPayload,
    responses(
        (status = 200, description = "Pagamento registrado (retirada da tesouraria)", body = Purchase),
        (status = 422, description = "Saldo insuficiente ou pagamento maior que o devido")
    ),
    security(("api_jwt" = []))
)]
pub async fn pay_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermPurchasesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let purchase = app_state
        .purchase_service
        .pay_supplier(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(purchase))
}
