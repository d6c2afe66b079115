// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Cada variante tem um código estável (`code`) e um status HTTP (`status`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Autenticação ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    InactiveUser,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Configuração inicial já realizada")]
    SetupAlreadyCompleted,

    #[error("Permissão '{0}' necessária")]
    Forbidden(String),

    #[error("Não é possível desativar o próprio usuário")]
    CannotDeactivateSelf,

    // --- Unicidade ---
    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(&'static str),

    // --- Razões (estoque e tesouraria) ---
    #[error("Quantidade inválida: {0}")]
    InvalidQuantity(Decimal),

    #[error("Valor {value} com mais de {scale} casas decimais")]
    PrecisionExceeded { value: Decimal, scale: u32 },

    #[error("Estoque insuficiente para {product}: disponível {available}, solicitado {requested}")]
    InsufficientStock {
        product: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Saldo insuficiente em {treasury}: disponível {available}, solicitado {requested}")]
    InsufficientBalance {
        treasury: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Tesouraria inativa: {0}")]
    InactiveTreasury(String),

    #[error("Ajuste sem efeito no estoque")]
    ZeroAdjustment,

    // --- Documentos ---
    #[error("Documento sem itens")]
    EmptyDocument,

    #[error("Pagamento excede o saldo devedor ({remaining})")]
    Overpayment { remaining: Decimal },

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Estado do documento não permite a operação: {0}")]
    InvalidDocumentState(String),

    #[error("Recebimento excede o pedido para {product}: pendente {pending}, recebido {received}")]
    OverReceipt {
        product: String,
        pending: Decimal,
        received: Decimal,
    },

    #[error("Falha ao gerar documento: {0}")]
    DocumentRender(String),

    // --- Infraestrutura ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Código estável, usado pelo frontend e como chave de tradução.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::InactiveUser => "INACTIVE_USER",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::SetupAlreadyCompleted => "SETUP_ALREADY_COMPLETED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::CannotDeactivateSelf => "CANNOT_DEACTIVATE_SELF",
            AppError::UsernameAlreadyExists => "USERNAME_ALREADY_EXISTS",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::UniqueConstraintViolation(_) => "UNIQUE_CONSTRAINT_VIOLATION",
            AppError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::PrecisionExceeded { .. } => "PRECISION_EXCEEDED",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::InactiveTreasury(_) => "INACTIVE_TREASURY",
            AppError::ZeroAdjustment => "ZERO_ADJUSTMENT",
            AppError::EmptyDocument => "EMPTY_DOCUMENT",
            AppError::Overpayment { .. } => "OVERPAYMENT",
            AppError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            AppError::InvalidDocumentState(_) => "INVALID_DOCUMENT_STATE",
            AppError::OverReceipt { .. } => "OVER_RECEIPT",
            AppError::DocumentRender(_) => "DOCUMENT_RENDER_FAILED",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::InactiveUser => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) | AppError::CannotDeactivateSelf => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SetupAlreadyCompleted
            | AppError::UsernameAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::InvalidStatusTransition { .. }
            | AppError::InvalidDocumentState(_) => StatusCode::CONFLICT,
            AppError::InvalidQuantity(_)
            | AppError::PrecisionExceeded { .. }
            | AppError::InsufficientStock { .. }
            | AppError::InsufficientBalance { .. }
            | AppError::InactiveTreasury(_)
            | AppError::ZeroAdjustment
            | AppError::EmptyDocument
            | AppError::Overpayment { .. }
            | AppError::OverReceipt { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DocumentRender(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Parâmetros interpolados na mensagem traduzida ({product}, {available}...)
    fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            AppError::Forbidden(slug) => vec![("permission", slug.clone())],
            AppError::UniqueConstraintViolation(constraint) => {
                vec![("constraint", constraint.clone())]
            }
            AppError::ResourceNotFound(resource) => vec![("resource", resource.to_string())],
            AppError::InvalidQuantity(qty) => vec![("quantity", qty.normalize().to_string())],
            AppError::PrecisionExceeded { value, scale } => {
                vec![("value", value.to_string()), ("scale", scale.to_string())]
            }
            AppError::InsufficientStock { product, available, requested } => vec![
                ("product", product.clone()),
                ("available", available.normalize().to_string()),
                ("requested", requested.normalize().to_string()),
            ],
            AppError::InsufficientBalance { treasury, available, requested } => vec![
                ("treasury", treasury.clone()),
                ("available", available.normalize().to_string()),
                ("requested", requested.normalize().to_string()),
            ],
            AppError::InactiveTreasury(name) => vec![("treasury", name.clone())],
            AppError::Overpayment { remaining } => {
                vec![("remaining", remaining.normalize().to_string())]
            }
            AppError::InvalidStatusTransition { from, to } => {
                vec![("from", from.clone()), ("to", to.clone())]
            }
            AppError::InvalidDocumentState(state) => vec![("state", state.clone())],
            AppError::OverReceipt { product, pending, received } => vec![
                ("product", product.clone()),
                ("pending", pending.normalize().to_string()),
                ("received", received.normalize().to_string()),
            ],
            _ => Vec::new(),
        }
    }

    /// Converte o erro interno em uma resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let key = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            store.translate(&locale.0, &format!("validation.{key}"), &[])
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError {
            status,
            code: self.code().to_string(),
            error: store.translate(&locale.0, self.code(), &self.params()),
            details,
        }
    }
}

// Resposta padrão (sem tradução) para quando não temos o Locale em mãos,
// por exemplo nos extratores.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }
        let body = Json(json!({ "code": self.code(), "error": self.to_string() }));
        (status, body).into_response()
    }
}

// ---
// ApiError: o que efetivamente vai para o cliente
// ---
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "code": self.code,
            "error": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Mapeia violações de unicidade do Postgres; o resto segue como DatabaseError.
pub fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(constraint) = db_err.constraint() {
                return match constraint {
                    "users_username_key" => AppError::UsernameAlreadyExists,
                    "users_email_key" => AppError::EmailAlreadyExists,
                    _ => AppError::UniqueConstraintViolation(constraint.to_string()),
                };
            }
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn business_rule_errors_are_unprocessable() {
        let err = AppError::InsufficientStock {
            product: "Shirt".into(),
            available: dec!(2),
            requested: dec!(5),
        };
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
        assert_eq!(
            AppError::InvalidStatusTransition { from: "DELIVERED".into(), to: "PREPARING".into() }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::ResourceNotFound("product").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_error_interpolates_localized_message() {
        let err = AppError::InsufficientBalance {
            treasury: "Main treasury".into(),
            available: dec!(100.00),
            requested: dec!(250.50),
        };
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.code, "INSUFFICIENT_BALANCE");
        assert!(api.error.contains("Main treasury"));
        assert!(api.error.contains("100"));
        assert!(api.error.contains("250.5"));
        assert!(api.details.is_none());
    }

    #[test]
    fn validation_errors_are_listed_per_field() {
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("length");
        e.message = Some("required".into());
        errors.add("username", e);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["username"][0], "This field is required.");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("connection reset by peer"));
        let api = err.to_api_error(&Locale("ar".into()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("connection reset"));
    }
}
