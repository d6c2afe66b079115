// src/handlers/inventory.rs

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
        rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    },
    models::{
        inventory::{
            AdjustStockPayload, Category, CreateCategoryPayload, CreateProductPayload, Product, StockMovement,
            UpdateProductPayload,
        },
        parties::SearchQuery,
    },
};

// ---
// Categorias
// ---

#[utoipa::path(
    get,
    path = "/api/inventory/categories",
    tag = "Inventory",
    responses((status = 200, description = "Categorias", body = Vec<Category>)),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .inventory_service
        .list_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/inventory/categories",
    tag = "Inventory",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .inventory_service
        .create_category(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// ---
// Produtos
// ---

#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Inventory",
    responses((status = 200, description = "Produtos ativos", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_products()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/search",
    tag = "Inventory",
    params(SearchQuery),
    responses((status = 200, description = "Até 20 produtos por nome, SKU ou código de barras", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn search_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .search_products(&query.q)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/low-stock",
    tag = "Inventory",
    responses((status = 200, description = "Produtos com estoque no mínimo ou abaixo", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .list_low_stock()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado (com movimento de estoque inicial, se houver)", body = Product),
        (status = 409, description = "SKU ou código de barras já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .create_product(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .get_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    put,
    path = "/api/inventory/products/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses((status = 200, description = "Produto atualizado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .inventory_service
        .update_product(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/deactivate",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Produto desativado", body = Product)),
    security(("api_jwt" = []))
)]
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .inventory_service
        .deactivate_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// ---
// Movimentos de estoque
// ---

#[utoipa::path(
    post,
    path = "/api/inventory/products/{id}/adjust",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AdjustStockPayload,
    responses(
        (status = 201, description = "Ajuste registrado", body = StockMovement),
        (status = 422, description = "Estoque insuficiente ou ajuste sem efeito")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .inventory_service
        .adjust_stock(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/products/{id}/movements",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses((status = 200, description = "Histórico de movimentos", body = Vec<StockMovement>)),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .list_movements(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}
