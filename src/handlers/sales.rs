// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
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
        rbac::{PermSalesRead, PermSalesWrite, RequirePermission},
    },
    models::sales::{CreateSalePayload, Sale, SaleDetail, SaleListQuery},
};

#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleListQuery),
    responses((status = 200, description = "Faturas de venda", body = Vec<Sale>)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .sales_service
        .list_sales(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda criada: estoque baixado, pagamento no caixa, cobrança do saldo", body = SaleDetail),
        (status = 400, description = "Dados inválidos (ex.: venda a prazo sem cliente)"),
        (status = 422, description = "Estoque insuficiente ou totais inconsistentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSalesWrite>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .sales_service
        .create_sale(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda com itens", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sales_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

// GET /api/sales/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/sales/{id}/pdf",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Fatura em PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let pdf = app_state
        .document_service
        .sale_invoice_pdf(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let disposition = format!("inline; filename=\"invoice-{id}.pdf\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}
