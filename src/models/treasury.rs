// src/models/treasury.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_money_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "treasury_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreasuryKind {
    /// Vendas e recebimentos de clientes
    Main,
    /// Cobranças na entrega (COD)
    Shipping,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "treasury_transaction_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreasuryTransactionType {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Treasury {
    pub id: Uuid,

    #[schema(example = "Main treasury")]
    pub name: String,

    pub kind: TreasuryKind,
    pub description: Option<String>,
    pub current_balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryTransaction {
    pub id: Uuid,
    pub treasury_id: Uuid,
    pub user_id: Option<Uuid>,
    pub transaction_type: TreasuryTransactionType,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,

    #[schema(example = "SALE")]
    pub reference_type: Option<String>,

    pub reference_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreasuryPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub name: String,

    // Novas tesourarias são OTHER por padrão
    pub kind: Option<TreasuryKind>,

    pub description: Option<String>,
}

// Depósito ou retirada manual
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTreasuryTransactionPayload {
    pub transaction_type: TreasuryTransactionType,

    #[validate(custom(function = "validate_money_amount"))]
    #[schema(example = "500.00")]
    pub amount: Decimal,

    pub description: Option<String>,
}

// Entrada do razão de tesouraria
#[derive(Debug, Clone)]
pub struct TreasuryEntryRequest<'a> {
    pub treasury_id: Uuid,
    pub transaction_type: TreasuryTransactionType,
    pub amount: Decimal,
    pub reference_type: Option<&'a str>,
    pub reference_id: Option<Uuid>,
    pub description: Option<&'a str>,
}
