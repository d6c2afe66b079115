// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Mapeia o CREATE TYPE user_role do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Seller,
    Viewer,
}

pub(crate) const SELLER_GRANTS: &[&str] = &[
    "customers:read",
    "customers:write",
    "inventory:read",
    "sales:read",
    "sales:write",
    "shipments:read",
    "shipments:write",
    "collections:read",
    "collections:write",
];

pub(crate) const VIEWER_GRANTS: &[&str] = &["inventory:read"];

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Seller, Role::Viewer];

    /// ADMIN recebe tudo; os demais, uma lista fixa de slugs.
    pub fn grants(self, slug: &str) -> bool {
        match self {
            Role::Admin => true,
            Role::Seller => SELLER_GRANTS.contains(&slug),
            Role::Viewer => VIEWER_GRANTS.contains(&slug),
        }
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "admin")]
    pub username: String,

    #[schema(example = "admin@vayon.local")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(example = "Ahmed Hassan")]
    pub full_name: String,

    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Primeiro administrador (só funciona com a tabela de usuários vazia)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetupAdminPayload {
    #[validate(length(min = 3, max = 50, message = "username_length"))]
    #[schema(example = "admin")]
    pub username: String,

    #[validate(email(message = "email"))]
    #[schema(example = "admin@vayon.local")]
    pub email: String,

    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "admin")]
    pub username: String,

    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 3, max = 50, message = "username_length"))]
    pub username: String,

    #[validate(email(message = "email"))]
    pub email: String,

    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,

    pub role: Role,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    #[validate(length(min = 1, message = "required"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub new_password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seller_sells_but_cannot_touch_treasury_or_purchases() {
        assert!(Role::Seller.grants("sales:write"));
        assert!(Role::Seller.grants("customers:write"));
        assert!(Role::Seller.grants("shipments:write"));
        assert!(Role::Seller.grants("collections:write"));
        assert!(Role::Seller.grants("inventory:read"));
        assert!(!Role::Seller.grants("inventory:write"));
        assert!(!Role::Seller.grants("treasury:write"));
        assert!(!Role::Seller.grants("purchases:write"));
        assert!(!Role::Seller.grants("users:manage"));
    }

    #[test]
    fn viewer_only_reads_inventory() {
        assert!(Role::Viewer.grants("inventory:read"));
        assert!(!Role::Viewer.grants("inventory:write"));
        assert!(!Role::Viewer.grants("sales:read"));
        assert!(!Role::Viewer.grants("customers:read"));
    }

    #[test]
    fn admin_gets_everything() {
        assert!(Role::Admin.grants("users:manage"));
        assert!(Role::Admin.grants("anything:at-all"));
    }

    #[test]
    fn setup_payload_rejects_short_password_and_bad_email() {
        let payload = SetupAdminPayload {
            username: "ad".into(),
            email: "not-an-email".into(),
            full_name: "Admin".into(),
            password: "123".into(),
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("full_name"));
    }
}
