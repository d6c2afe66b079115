// src/handlers/auth.rs

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
        rbac::{PermUsersManage, RequirePermission},
    },
    models::auth::{AuthResponse, ChangePasswordPayload, CreateUserPayload, LoginPayload, SetupAdminPayload, User},
};

// POST /api/auth/setup
#[utoipa::path(
    post,
    path = "/api/auth/setup",
    tag = "Auth",
    request_body = SetupAdminPayload,
    responses(
        (status = 201, description = "Administrador inicial criado", body = AuthResponse),
        (status = 409, description = "Já existem usuários")
    )
)]
pub async fn setup(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SetupAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .auth_service
        .setup(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login bem-sucedido", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário autenticado", body = User)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

// PUT /api/users/me/password
#[utoipa::path(
    put,
    path = "/api/users/me/password",
    tag = "Users",
    request_body = ChangePasswordPayload,
    responses(
        (status = 204, description = "Senha alterada"),
        (status = 401, description = "Senha atual incorreta")
    ),
    security(("api_jwt" = []))
)]
pub async fn change_password(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .change_password(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários cadastrados", body = Vec<User>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersManage>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .auth_service
        .list_users()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 409, description = "Usuário ou e-mail já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsersManage>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .create_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(user)))
}

// POST /api/users/{id}/deactivate
#[utoipa::path(
    post,
    path = "/api/users/{id}/deactivate",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário desativado", body = User),
        (status = 403, description = "Não é possível desativar a si mesmo")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermUsersManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deactivated = app_state
        .auth_service
        .deactivate_user(id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("Usuário {} desativado por {}", deactivated.username, user.0.username);
    Ok(Json(deactivated))
}
