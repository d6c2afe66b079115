// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_stock_level};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementReason {
    InitialStock,
    Sale,
    PurchaseReceipt,
    Adjustment,
    ManufacturingOut,
    ManufacturingIn,
    ManufacturingReturn,
}

// Modo do ajuste manual de estoque
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentMode {
    Increase,
    Decrease,
    /// A quantidade informada é o novo saldo
    Set,
}

impl AdjustmentMode {
    /// Converte o pedido de ajuste em (direção, quantidade positiva).
    /// `None` quando o ajuste não muda nada.
    pub fn to_delta(self, current_stock: Decimal, quantity: Decimal) -> Option<(StockDirection, Decimal)> {
        let (direction, qty) = match self {
            AdjustmentMode::Increase => (StockDirection::In, quantity),
            AdjustmentMode::Decrease => (StockDirection::Out, quantity),
            AdjustmentMode::Set => {
                let diff = quantity - current_stock;
                if diff.is_sign_negative() {
                    (StockDirection::Out, -diff)
                } else {
                    (StockDirection::In, diff)
                }
            }
        };
        if qty.is_zero() { None } else { Some((direction, qty)) }
    }
}

// --- CATEGORIAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,

    #[schema(example = "T-Shirts")]
    pub name: String,

    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

// --- PRODUTOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(example = "Cotton T-Shirt")]
    pub name: String,

    pub description: Option<String>,

    #[schema(example = "TS-001-BL-M")]
    pub sku: Option<String>,

    pub barcode: Option<String>,
    pub category_id: Option<Uuid>,

    #[schema(example = "piece")]
    pub unit: String,

    // Custo médio ponderado
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,

    // Serviços não controlam estoque
    pub is_service: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub name: String,
    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub sku: Option<String>,

    #[validate(length(max = 50))]
    pub barcode: Option<String>,

    pub category_id: Option<Uuid>,
    pub unit: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub selling_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub wholesale_price: Option<Decimal>,

    // Estoque inicial (gera um movimento INITIAL_STOCK)
    #[validate(custom(function = "validate_stock_level"))]
    #[serde(default)]
    pub initial_stock: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub min_stock: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub max_stock: Decimal,

    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,

    #[serde(default)]
    pub is_service: bool,
}

// Apenas campos de catálogo; estoque só muda por movimentos
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    pub name: String,
    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub sku: Option<String>,

    #[validate(length(max = 50))]
    pub barcode: Option<String>,

    pub category_id: Option<Uuid>,

    #[validate(length(min = 1, max = 20, message = "required"))]
    pub unit: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub selling_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub wholesale_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub min_stock: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub max_stock: Decimal,

    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    pub mode: AdjustmentMode,

    // Para SET é o saldo desejado (pode ser zero)
    #[validate(custom(function = "validate_stock_level"))]
    pub quantity: Decimal,

    pub notes: Option<String>,
}

// --- MOVIMENTOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub direction: StockDirection,
    pub reason: StockMovementReason,
    pub quantity: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    pub unit_cost: Option<Decimal>,
    pub unit_price: Option<Decimal>,

    #[schema(example = "SALE")]
    pub reference_type: Option<String>,

    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Entrada do razão de estoque (o que o chamador quer movimentar)
#[derive(Debug, Clone)]
pub struct StockMovementRequest<'a> {
    pub product_id: Uuid,
    pub direction: StockDirection,
    pub quantity: Decimal,
    pub reason: StockMovementReason,
    pub unit_cost: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub reference_type: Option<&'a str>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn set_mode_turns_target_into_delta() {
        assert_eq!(
            AdjustmentMode::Set.to_delta(dec!(10), dec!(4)),
            Some((StockDirection::Out, dec!(6)))
        );
        assert_eq!(
            AdjustmentMode::Set.to_delta(dec!(10), dec!(12.5)),
            Some((StockDirection::In, dec!(2.5)))
        );
    }

    #[test]
    fn zero_delta_is_rejected() {
        assert_eq!(AdjustmentMode::Set.to_delta(dec!(7), dec!(7)), None);
        assert_eq!(AdjustmentMode::Increase.to_delta(dec!(7), dec!(0)), None);
    }

    #[test]
    fn increase_and_decrease_keep_quantity() {
        assert_eq!(
            AdjustmentMode::Increase.to_delta(dec!(0), dec!(3)),
            Some((StockDirection::In, dec!(3)))
        );
        assert_eq!(
            AdjustmentMode::Decrease.to_delta(dec!(5), dec!(3)),
            Some((StockDirection::Out, dec!(3)))
        );
    }
}
