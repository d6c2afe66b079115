// src/handlers/parties.rs

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
        rbac::{PermCustomersRead, PermCustomersWrite, PermSuppliersRead, PermSuppliersWrite, RequirePermission},
    },
    models::parties::{
        CreateCustomerPaymentPayload, Customer, CustomerPayload, CustomerPayment, SearchQuery, Supplier,
        SupplierPayload,
    },
};

// ---
// CLIENTES
// ---

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Clientes ativos", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersRead>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .party_service
        .list_customers()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}

#[utoipa::path(
    get,
    path = "/api/customers/search",
    tag = "Customers",
    params(SearchQuery),
    responses((status = 200, description = "Até 20 clientes por nome ou telefone", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn search_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersRead>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .party_service
        .search_customers(&query.q)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 409, description = "Telefone já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCustomersWrite>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .party_service
        .create_customer(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .party_service
        .get_customer(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CustomerPayload,
    responses((status = 200, description = "Cliente atualizado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .party_service
        .update_customer(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    post,
    path = "/api/customers/{id}/deactivate",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Cliente desativado", body = Customer)),
    security(("api_jwt" = []))
)]
pub async fn deactivate_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .party_service
        .deactivate_customer(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/payments",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Pagamentos do cliente", body = Vec<CustomerPayment>)),
    security(("api_jwt" = []))
)]
pub async fn list_customer_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCustomersRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = app_state
        .party_service
        .list_customer_payments(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payments))
}

#[utoipa::path(
    post,
    path = "/api/customers/{id}/payments",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = CreateCustomerPaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado e depositado no caixa principal", body = CustomerPayment),
        (status = 422, description = "Pagamento maior que o saldo da venda")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_customer_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCustomerPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state
        .sales_service
        .record_customer_payment(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// ---
// FORNECEDORES
// ---

#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    responses((status = 200, description = "Fornecedores ativos", body = Vec<Supplier>)),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersRead>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .party_service
        .list_suppliers()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(suppliers))
}

#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = SupplierPayload,
    responses((status = 201, description = "Fornecedor criado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersWrite>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .party_service
        .create_supplier(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

#[utoipa::path(
    get,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses(
        (status = 200, description = "Fornecedor", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .party_service
        .get_supplier(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

#[utoipa::path(
    put,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    request_body = SupplierPayload,
    responses((status = 200, description = "Fornecedor atualizado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .party_service
        .update_supplier(id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

#[utoipa::path(
    post,
    path = "/api/suppliers/{id}/deactivate",
    tag = "Suppliers",
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    responses((status = 200, description = "Fornecedor desativado", body = Supplier)),
    security(("api_jwt" = []))
)]
pub async fn deactivate_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = app_state
        .party_service
        .deactivate_supplier(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}
