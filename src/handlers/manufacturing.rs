// src/handlers/manufacturing.rs

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
        rbac::{PermManufacturingRead, PermManufacturingWrite, RequirePermission},
    },
    models::manufacturing::{
        CreateFactoryPayload, CreateManufacturingOrderPayload, Factory, FactoryListQuery, ManufacturingListQuery,
        ManufacturingOrder, ManufacturingOrderDetail, ReceiveManufacturingPayload,
    },
};

// ---
// Fábricas
// ---

#[utoipa::path(
    get,
    path = "/api/factories",
    tag = "Manufacturing",
    params(FactoryListQuery),
    responses((status = 200, description = "Fábricas ativas", body = Vec<Factory>)),
    security(("api_jwt" = []))
)]
pub async fn list_factories(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManufacturingRead>,
    Query(query): Query<FactoryListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let factories = app_state
        .manufacturing_service
        .list_factories(query.search.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(factories))
}

#[utoipa::path(
    post,
    path = "/api/factories",
    tag = "Manufacturing",
    request_body = CreateFactoryPayload,
    responses(
        (status = 201, description = "Fábrica cadastrada", body = Factory),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_factory(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermManufacturingWrite>,
    Json(payload): Json<CreateFactoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let factory = app_state
        .manufacturing_service
        .create_factory(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(factory)))
}

// ---
// Ordens de fabricação
// ---

#[utoipa::path(
    get,
    path = "/api/manufacturing-orders",
    tag = "Manufacturing",
    params(ManufacturingListQuery),
    responses((status = 200, description = "Ordens de fabricação", body = Vec<ManufacturingOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManufacturingRead>,
    Query(query): Query<ManufacturingListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .manufacturing_service
        .list_orders(query.search.as_deref(), query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

#[utoipa::path(
    post,
    path = "/api/manufacturing-orders",
    tag = "Manufacturing",
    request_body = CreateManufacturingOrderPayload,
    responses(
        (status = 201, description = "Ordem criada; matéria-prima enviada à fábrica", body = ManufacturingOrderDetail),
        (status = 404, description = "Fábrica ou produto não encontrado"),
        (status = 409, description = "Produto de serviço"),
        (status = 422, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermManufacturingWrite>,
    Json(payload): Json<CreateManufacturingOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .manufacturing_service
        .create_order(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/api/manufacturing-orders/{id}",
    tag = "Manufacturing",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Ordem com matéria-prima e produtos prontos", body = ManufacturingOrderDetail),
        (status = 404, description = "Ordem não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermManufacturingRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .manufacturing_service
        .get_order(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/manufacturing-orders/{id}/receive",
    tag = "Manufacturing",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    request_body = ReceiveManufacturingPayload,
    responses(
        (status = 200, description = "Produto pronto recebido; ordem concluída", body = ManufacturingOrderDetail),
        (status = 404, description = "Ordem ou linha não encontrada"),
        (status = 409, description = "Ordem fora de produção ou linha repetida")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermManufacturingWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceiveManufacturingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .manufacturing_service
        .receive_order(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/api/manufacturing-orders/{id}/cancel",
    tag = "Manufacturing",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Ordem cancelada; matéria-prima devolvida", body = ManufacturingOrderDetail),
        (status = 404, description = "Ordem não encontrada"),
        (status = 409, description = "Ordem já concluída ou cancelada")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermManufacturingWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .manufacturing_service
        .cancel_order(id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}
