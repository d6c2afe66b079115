// src/models/parties.rs
// Clientes e fornecedores

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_money_amount;

// --- CLIENTES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,

    #[schema(example = "Mona Adel")]
    pub name: String,

    #[schema(example = "01012345678")]
    pub phone: Option<String>,

    pub email: Option<String>,
    pub address: Option<String>,

    #[schema(example = "Nasr City")]
    pub city: Option<String>,

    #[schema(example = "Cairo")]
    pub governorate: Option<String>,

    pub notes: Option<String>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado tanto para criar quanto para atualizar (PUT substitui tudo)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub name: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(email(message = "email"))]
    pub email: Option<String>,

    pub address: Option<String>,
    pub city: Option<String>,
    pub governorate: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub sale_id: Option<Uuid>,
    pub user_id: Uuid,
    pub amount: Decimal,

    #[schema(example = "cash")]
    pub payment_method: String,

    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub payment_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPaymentPayload {
    // Se informado, o pagamento abate o saldo desta venda
    pub sale_id: Option<Uuid>,

    #[validate(custom(function = "validate_money_amount"))]
    #[schema(example = "250.00")]
    pub amount: Decimal,

    #[validate(length(min = 1, max = 50, message = "required"))]
    #[schema(example = "cash")]
    pub payment_method: String,

    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

// --- FORNECEDORES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,

    #[schema(example = "Delta Textiles")]
    pub name: String,

    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    #[schema(example = "Karim Said")]
    pub contact_person: Option<String>,

    #[schema(example = "30 days")]
    pub payment_terms: Option<String>,

    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub name: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(email(message = "email"))]
    pub email: Option<String>,

    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub payment_terms: Option<String>,
    pub notes: Option<String>,
}

// --- BUSCA (autocomplete) ---

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Menos de 2 caracteres (sem contar espaços) devolve lista vazia
    #[serde(default)]
    pub q: String,
}

pub const SEARCH_LIMIT: i64 = 20;
pub const MIN_SEARCH_CHARS: usize = 2;

/// Termo aparado, ou `None` se for curto demais para buscar.
pub fn search_term(q: &str) -> Option<&str> {
    let term = q.trim();
    (term.chars().count() >= MIN_SEARCH_CHARS).then_some(term)
}

/// Padrão `%termo%` para ILIKE ... ESCAPE '\'; `%` e `_` do usuário valem literalmente.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_or_blank_terms_are_skipped() {
        assert_eq!(search_term("  a "), None);
        assert_eq!(search_term("   "), None);
        assert_eq!(search_term(" ab "), Some("ab"));
        // Conta caracteres, não bytes
        assert_eq!(search_term("ع"), None);
        assert_eq!(search_term("عل"), Some("عل"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("shirt"), "%shirt%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
    }
}
