// src/handlers/shipments.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{PermShipmentsRead, PermShipmentsWrite, PermShippingCompaniesWrite, RequirePermission},
    },
    models::shipments::{
        CreateShipmentPayload, CreateShippingCompanyPayload, Shipment, ShipmentDetail, ShipmentListQuery,
        ShippingCompany, UpdateShipmentStatusPayload,
    },
};

// --- TRANSPORTADORAS ---

#[utoipa::path(
    get,
    path = "/api/shipping-companies",
    tag = "Shipments",
    responses((status = 200, description = "Transportadoras ativas", body = Vec<ShippingCompany>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermShipmentsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .shipment_service
        .list_companies()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(companies))
}

#[utoipa::path(
    post,
    path = "/api/shipping-companies",
    tag = "Shipments",
    request_body = CreateShippingCompanyPayload,
    responses(
        (status = 201, description = "Transportadora cadastrada", body = ShippingCompany),
        (status = 409, description = "Nome ou código já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermShippingCompaniesWrite>,
    Json(payload): Json<CreateShippingCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let company = app_state
        .shipment_service
        .create_company(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// --- ENVIOS ---

#[utoipa::path(
    get,
    path = "/api/shipments",
    tag = "Shipments",
    params(ShipmentListQuery),
    responses((status = 200, description = "Envios", body = Vec<Shipment>)),
    security(("api_jwt" = []))
)]
pub async fn list_shipments(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermShipmentsRead>,
    Query(query): Query<ShipmentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let shipments = app_state
        .shipment_service
        .list_shipments(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(shipments))
}

#[utoipa::path(
    post,
    path = "/api/shipments",
    tag = "Shipments",
    request_body = CreateShipmentPayload,
    responses(
        (status = 201, description = "Envio criado em PREPARING", body = ShipmentDetail),
        (status = 404, description = "Venda ou transportadora não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shipment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermShipmentsWrite>,
    Json(payload): Json<CreateShipmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let shipment = app_state
        .shipment_service
        .create_shipment(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(shipment)))
}

#[utoipa::path(
    get,
    path = "/api/shipments/{id}",
    tag = "Shipments",
    params(("id" = Uuid, Path, description = "ID do envio")),
    responses(
        (status = 200, description = "Envio com histórico de status", body = ShipmentDetail),
        (status = 404, description = "Envio não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_shipment(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermShipmentsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let shipment = app_state
        .shipment_service
        .get_shipment(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(shipment))
}

#[utoipa::path(
    post,
    path = "/api/shipments/{id}/status",
    tag = "Shipments",
    params(("id" = Uuid, Path, description = "ID do envio")),
    request_body = UpdateShipmentStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = ShipmentDetail),
        (status = 409, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_shipment_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermShipmentsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShipmentStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let shipment = app_state
        .shipment_service
        .update_status(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(shipment))
}
