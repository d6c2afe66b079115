// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::{
    error::AppError,
    validation::{validate_not_negative, validate_quantity},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// O status nunca é informado pelo cliente: sai do total e do valor pago.
    pub fn derive(total: Decimal, paid: Decimal) -> Self {
        if paid >= total {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }
}

/// Valor de uma linha: quantidade × preço − desconto da linha.
pub fn line_total(quantity: Decimal, unit_price: Decimal, discount: Decimal) -> Decimal {
    (quantity * unit_price - discount).round_dp(2)
}

// Totais de um documento; respeitam as mesmas CHECKs da tabela
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub payment_status: PaymentStatus,
}

impl InvoiceTotals {
    /// total = subtotal − desconto + imposto + frete; restante = total − pago.
    pub fn compute(
        line_totals: &[Decimal],
        discount_amount: Decimal,
        tax_amount: Decimal,
        shipping_cost: Decimal,
        paid_amount: Decimal,
    ) -> Result<Self, AppError> {
        if line_totals.is_empty() {
            return Err(AppError::EmptyDocument);
        }

        let subtotal: Decimal = line_totals.iter().map(|t| t.round_dp(2)).sum();
        let discount_amount = discount_amount.round_dp(2);
        let tax_amount = tax_amount.round_dp(2);
        let shipping_cost = shipping_cost.round_dp(2);
        let paid_amount = paid_amount.round_dp(2);

        let total_amount = subtotal - discount_amount + tax_amount + shipping_cost;
        if total_amount.is_sign_negative() && !total_amount.is_zero() {
            return Err(AppError::InvalidDocumentState("NEGATIVE_TOTAL".into()));
        }
        if paid_amount > total_amount {
            return Err(AppError::Overpayment { remaining: total_amount });
        }

        Ok(Self {
            subtotal,
            discount_amount,
            tax_amount,
            shipping_cost,
            total_amount,
            paid_amount,
            remaining_amount: total_amount - paid_amount,
            payment_status: PaymentStatus::derive(total_amount, paid_amount),
        })
    }
}

// --- VENDAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,

    #[schema(example = "INV-20250115-0001")]
    pub invoice_number: String,

    pub customer_id: Option<Uuid>,
    pub user_id: Uuid,
    pub sale_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,

    #[schema(example = "cash")]
    pub payment_method: String,

    pub payment_status: PaymentStatus,
    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_governorate: Option<String>,
    pub shipping_phone: Option<String>,

    // Espelha o status do envio vinculado
    #[schema(example = "IN_TRANSIT")]
    pub shipping_status: Option<String>,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,

    // Vem do JOIN com products
    pub product_name: String,

    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub total_price: Decimal,
    pub cost_price: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,

    // Se ausente, usa o preço de venda do produto
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount_amount: Decimal,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    pub customer_id: Option<Uuid>,

    // Sem customerId: procura (nome + telefone) ou cadastra o cliente
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub customer_name: Option<String>,

    #[validate(length(max = 20))]
    pub customer_phone: Option<String>,

    #[validate(length(min = 1, message = "items_required"))]
    #[validate(nested)]
    pub items: Vec<SaleItemPayload>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub discount_amount: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub tax_amount: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub shipping_cost: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub paid_amount: Decimal,

    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,

    pub shipping_address: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_governorate: Option<String>,
    pub shipping_phone: Option<String>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaleListQuery {
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_is_subtotal_minus_discount_plus_tax_and_shipping() {
        let lines = [line_total(dec!(2), dec!(150), dec!(0)), line_total(dec!(1), dec!(99.99), dec!(9.99))];
        let totals = InvoiceTotals::compute(&lines, dec!(20), dec!(14), dec!(50), dec!(100)).unwrap();

        assert_eq!(totals.subtotal, dec!(390.00));
        assert_eq!(totals.total_amount, dec!(434.00));
        assert_eq!(totals.remaining_amount, dec!(334.00));
        assert_eq!(totals.payment_status, PaymentStatus::Partial);
        assert_eq!(
            totals.total_amount,
            totals.subtotal - totals.discount_amount + totals.tax_amount + totals.shipping_cost
        );
        assert_eq!(totals.remaining_amount, totals.total_amount - totals.paid_amount);
    }

    #[test]
    fn fully_paid_and_unpaid_statuses() {
        let lines = [dec!(100)];
        let paid = InvoiceTotals::compute(&lines, dec!(0), dec!(0), dec!(0), dec!(100)).unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.remaining_amount.is_zero());

        let unpaid = InvoiceTotals::compute(&lines, dec!(0), dec!(0), dec!(0), dec!(0)).unwrap();
        assert_eq!(unpaid.payment_status, PaymentStatus::Unpaid);
        assert_eq!(unpaid.remaining_amount, dec!(100));
    }

    #[test]
    fn overpayment_is_rejected() {
        let err = InvoiceTotals::compute(&[dec!(80)], dec!(0), dec!(0), dec!(0), dec!(80.01)).unwrap_err();
        assert!(matches!(err, AppError::Overpayment { remaining } if remaining == dec!(80)));
    }

    #[test]
    fn empty_invoice_is_rejected() {
        assert!(matches!(
            InvoiceTotals::compute(&[], dec!(0), dec!(0), dec!(0), dec!(0)),
            Err(AppError::EmptyDocument)
        ));
    }

    #[test]
    fn discount_larger_than_subtotal_is_rejected() {
        assert!(InvoiceTotals::compute(&[dec!(10)], dec!(11), dec!(0), dec!(0), dec!(0)).is_err());
    }

    #[test]
    fn line_total_rounds_to_cents() {
        assert_eq!(line_total(dec!(1.5), dec!(33.33), dec!(0)), dec!(50.00));
        assert_eq!(line_total(dec!(3), dec!(10), dec!(5)), dec!(25));
    }

    #[test]
    fn payment_status_derivation() {
        assert_eq!(PaymentStatus::derive(dec!(100), dec!(0)), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::derive(dec!(100), dec!(0.01)), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::derive(dec!(100), dec!(100)), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(dec!(0), dec!(0)), PaymentStatus::Paid);
    }
}
