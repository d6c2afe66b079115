// src/models/purchases.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        validation::{validate_money_amount, validate_not_negative, validate_percentage, validate_quantity},
    },
    models::sales::{InvoiceTotals, PaymentStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Confirmed,
    PartiallyReceived,
    Received,
}

impl PurchaseStatus {
    pub fn accepts_receipt(self) -> bool {
        !matches!(self, PurchaseStatus::Received)
    }

    /// Status depois de um recebimento, olhando o que ainda falta chegar.
    pub fn after_receipt(pending_after: Decimal) -> Self {
        if pending_after <= Decimal::ZERO {
            PurchaseStatus::Received
        } else {
            PurchaseStatus::PartiallyReceived
        }
    }
}

/// Descontos e impostos de compra são percentuais:
/// desconto = subtotal × %; tributável = subtotal − desconto + frete;
/// imposto = tributável × %; total = tributável + imposto.
pub fn purchase_totals(
    line_totals: &[Decimal],
    discount_percentage: Decimal,
    tax_percentage: Decimal,
    shipping_cost: Decimal,
    paid_amount: Decimal,
) -> Result<InvoiceTotals, AppError> {
    let subtotal: Decimal = line_totals.iter().map(|t| t.round_dp(2)).sum();
    let discount_amount = (subtotal * discount_percentage / Decimal::ONE_HUNDRED).round_dp(2);
    let taxable = subtotal - discount_amount + shipping_cost.round_dp(2);
    let tax_amount = (taxable * tax_percentage / Decimal::ONE_HUNDRED).round_dp(2);

    InvoiceTotals::compute(line_totals, discount_amount, tax_amount, shipping_cost, paid_amount)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,

    #[schema(example = "PUR-20250115-0001")]
    pub invoice_number: String,

    pub supplier_id: Uuid,
    pub user_id: Uuid,
    pub purchase_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub status: PurchaseStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub received_quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PurchaseItem {
    pub fn pending_quantity(&self) -> Decimal {
        self.quantity - self.received_quantity
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItemPayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePurchasePayload {
    pub supplier_id: Uuid,

    #[validate(length(min = 1, message = "items_required"))]
    #[validate(nested)]
    pub items: Vec<PurchaseItemPayload>,

    #[validate(custom(function = "validate_percentage"))]
    #[serde(default)]
    pub discount_percentage: Decimal,

    #[validate(custom(function = "validate_percentage"))]
    #[serde(default)]
    pub tax_percentage: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub shipping_cost: Decimal,

    pub payment_method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLinePayload {
    pub purchase_item_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePurchasePayload {
    // Ausente: recebe tudo o que está pendente
    #[validate(nested)]
    pub items: Option<Vec<ReceiveLinePayload>>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPaymentPayload {
    #[validate(custom(function = "validate_money_amount"))]
    pub amount: Decimal,

    // Padrão: tesouraria MAIN
    pub treasury_id: Option<Uuid>,

    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percentage_discount_and_tax_over_shipping() {
        // subtotal 1000, 10% desconto = 100, tributável = 900 + 50 = 950, 14% = 133
        let totals = purchase_totals(&[dec!(600), dec!(400)], dec!(10), dec!(14), dec!(50), dec!(0)).unwrap();
        assert_eq!(totals.subtotal, dec!(1000));
        assert_eq!(totals.discount_amount, dec!(100));
        assert_eq!(totals.tax_amount, dec!(133));
        assert_eq!(totals.total_amount, dec!(1083));
        assert_eq!(totals.remaining_amount, dec!(1083));
        assert_eq!(totals.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn zero_percentages_leave_subtotal_plus_shipping() {
        let totals = purchase_totals(&[dec!(250.50)], dec!(0), dec!(0), dec!(20), dec!(0)).unwrap();
        assert_eq!(totals.total_amount, dec!(270.50));
    }

    #[test]
    fn receipt_status_follows_pending_quantity() {
        assert_eq!(PurchaseStatus::after_receipt(dec!(0)), PurchaseStatus::Received);
        assert_eq!(PurchaseStatus::after_receipt(dec!(2)), PurchaseStatus::PartiallyReceived);
        assert!(PurchaseStatus::Confirmed.accepts_receipt());
        assert!(PurchaseStatus::PartiallyReceived.accepts_receipt());
        assert!(!PurchaseStatus::Received.accepts_receipt());
    }
}
