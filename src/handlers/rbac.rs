// src/handlers/rbac.rs

use axum::Json;

use crate::{
    middleware::{auth::AuthenticatedUser, rbac::permission_catalogue},
    models::rbac::PermissionEntry,
};

// GET /api/permissions (o frontend decide o que mostrar para cada papel)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "RBAC",
    responses(
        (status = 200, description = "Catálogo de permissões e papéis que as recebem", body = Vec<PermissionEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(_user: AuthenticatedUser) -> Json<Vec<PermissionEntry>> {
    Json(permission_catalogue().into_iter().map(PermissionEntry::from).collect())
}
