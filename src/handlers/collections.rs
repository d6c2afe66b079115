// src/handlers/collections.rs

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
        rbac::{PermCollectionsRead, PermCollectionsSettings, PermCollectionsWrite, RequirePermission},
    },
    models::collections::{
        AlertScanResult, CollectionAlert, CollectionSettings, CollectionTask, CollectionTaskDetail,
        CreateCollectionTaskPayload, CreateFollowUpPayload, TaskListQuery, UpdateCollectionSettingsPayload,
    },
};

// ---
// Tarefas
// ---

#[utoipa::path(
    get,
    path = "/api/collections/tasks",
    tag = "Collections",
    params(TaskListQuery),
    responses((status = 200, description = "Tarefas de cobrança", body = Vec<CollectionTask>)),
    security(("api_jwt" = []))
)]
pub async fn list_tasks(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCollectionsRead>,
    Query(query): Query<TaskListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = app_state
        .collection_service
        .list_tasks(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(tasks))
}

#[utoipa::path(
    post,
    path = "/api/collections/tasks",
    tag = "Collections",
    request_body = CreateCollectionTaskPayload,
    responses(
        (status = 201, description = "Tarefa criada", body = CollectionTask),
        (status = 404, description = "Cliente, venda ou responsável não encontrado"),
        (status = 409, description = "Venda de outro cliente, tarefa aberta já existente ou responsável inativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_task(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCollectionsWrite>,
    Json(payload): Json<CreateCollectionTaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .collection_service
        .create_task(&payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/collections/tasks/{id}",
    tag = "Collections",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    responses(
        (status = 200, description = "Tarefa com contatos", body = CollectionTaskDetail),
        (status = 404, description = "Tarefa não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_task(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCollectionsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let task = app_state
        .collection_service
        .get_task(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/collections/tasks/{id}/follow-ups",
    tag = "Collections",
    params(("id" = Uuid, Path, description = "ID da tarefa")),
    request_body = CreateFollowUpPayload,
    responses(
        (status = 201, description = "Contato registrado", body = CollectionTaskDetail),
        (status = 409, description = "Tarefa já encerrada ou limite de tentativas atingido")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_follow_up(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCollectionsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateFollowUpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let task = app_state
        .collection_service
        .add_follow_up(id, &payload, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(task)))
}

// ---
// Alertas
// ---

#[utoipa::path(
    get,
    path = "/api/collections/alerts",
    tag = "Collections",
    responses((status = 200, description = "Alertas não dispensados do usuário", body = Vec<CollectionAlert>)),
    security(("api_jwt" = []))
)]
pub async fn list_alerts(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCollectionsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = app_state
        .collection_service
        .list_alerts(user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(alerts))
}

#[utoipa::path(
    post,
    path = "/api/collections/alerts/scan",
    tag = "Collections",
    responses((status = 200, description = "Alertas do dia gerados", body = AlertScanResult)),
    security(("api_jwt" = []))
)]
pub async fn scan_alerts(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCollectionsWrite>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .collection_service
        .scan_alerts()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/collections/alerts/{id}/read",
    tag = "Collections",
    params(("id" = Uuid, Path, description = "ID do alerta")),
    responses(
        (status = 200, description = "Alerta marcado como lido", body = CollectionAlert),
        (status = 404, description = "Alerta não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_alert_read(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCollectionsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = app_state
        .collection_service
        .mark_alert_read(id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(alert))
}

#[utoipa::path(
    post,
    path = "/api/collections/alerts/{id}/dismiss",
    tag = "Collections",
    params(("id" = Uuid, Path, description = "ID do alerta")),
    responses(
        (status = 200, description = "Alerta dispensado", body = CollectionAlert),
        (status = 404, description = "Alerta não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn dismiss_alert(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermCollectionsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = app_state
        .collection_service
        .dismiss_alert(id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(alert))
}

// ---
// Configurações
// ---

#[utoipa::path(
    get,
    path = "/api/collections/settings",
    tag = "Collections",
    responses((status = 200, description = "Configurações de cobrança", body = CollectionSettings)),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCollectionsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state
        .collection_service
        .get_settings()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/api/collections/settings",
    tag = "Collections",
    request_body = UpdateCollectionSettingsPayload,
    responses((status = 200, description = "Configurações atualizadas", body = CollectionSettings)),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCollectionsSettings>,
    Json(payload): Json<UpdateCollectionSettingsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let settings = app_state
        .collection_service
        .update_settings(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(settings))
}
