// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// ---
// Guardião de autenticação (aplicado com from_fn_with_state)
// ---
// Valida o Bearer token, carrega o usuário (ativo) e o coloca nas extensions.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.id, "Requisição autenticada");

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
