// src/models/manufacturing.rs
// Fabricação terceirizada: a matéria-prima sai para a fábrica e o produto pronto volta

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{validate_money, validate_quantity, validate_stock_level};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "manufacturing_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManufacturingStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl ManufacturingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ManufacturingStatus::Pending => "PENDING",
            ManufacturingStatus::InProgress => "IN_PROGRESS",
            ManufacturingStatus::Completed => "COMPLETED",
            ManufacturingStatus::Cancelled => "CANCELLED",
        }
    }

    /// Só ordem em produção recebe produto pronto.
    pub fn accepts_receipt(self) -> bool {
        self == ManufacturingStatus::InProgress
    }

    pub fn can_cancel(self) -> bool {
        matches!(self, ManufacturingStatus::Pending | ManufacturingStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quality_grade")]
pub enum QualityGrade {
    A,
    B,
    C,
}

impl QualityGrade {
    /// B e C contam como problema de qualidade da fábrica.
    pub fn is_issue(self) -> bool {
        self != QualityGrade::A
    }
}

// --- REGRAS ---

const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
const MIN_RATING: Decimal = Decimal::ONE;
const RATING_STEP_UP: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
const RATING_STEP_DOWN: Decimal = Decimal::from_parts(2, 0, 0, false, 1);
const ISSUE_TOLERANCE: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// Nota da fábrica depois de um recebimento: sobe 0.1 sem problemas,
/// cai 0.2 quando as linhas B/C passam de 30% do total recebido.
pub fn next_quality_rating(current: Decimal, quality_issues: usize, total_received: Decimal) -> Decimal {
    if quality_issues == 0 {
        (current + RATING_STEP_UP).min(MAX_RATING)
    } else if Decimal::from(quality_issues) > total_received * ISSUE_TOLERANCE {
        (current - RATING_STEP_DOWN).max(MIN_RATING)
    } else {
        current
    }
}

/// Custo de uma linha de matéria-prima, no centavo.
pub fn line_cost(quantity: Decimal, unit_cost: Decimal) -> Decimal {
    (quantity * unit_cost).round_dp(2)
}

/// (custo da matéria-prima, custo total) da ordem.
pub fn order_costs(raw_line_totals: &[Decimal], manufacturing_cost: Decimal) -> (Decimal, Decimal) {
    let raw_materials_cost: Decimal = raw_line_totals.iter().sum();
    let manufacturing_cost = manufacturing_cost.round_dp(2);
    (raw_materials_cost, raw_materials_cost + manufacturing_cost)
}

fn validate_rating(val: &Decimal) -> Result<(), ValidationError> {
    if *val < MIN_RATING || *val > MAX_RATING || val.normalize().scale() > 1 {
        let mut err = ValidationError::new("range");
        err.message = Some("invalid_rating".into());
        return Err(err);
    }
    Ok(())
}

// --- FÁBRICAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Factory {
    pub id: Uuid,

    #[schema(example = "Delta Garments")]
    pub name: String,

    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,

    #[schema(example = "Shirts")]
    pub specialization: Option<String>,

    // Peças por dia
    pub production_capacity: Option<i32>,

    #[schema(example = "4.8")]
    pub quality_rating: Decimal,

    pub notes: Option<String>,
    pub is_active: bool,
    pub created_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFactoryPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub name: String,

    #[validate(length(max = 100))]
    pub contact_person: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub address: Option<String>,

    #[validate(length(max = 100))]
    pub specialization: Option<String>,

    #[validate(range(min = 0))]
    pub production_capacity: Option<i32>,

    // Padrão 5
    #[validate(custom(function = "validate_rating"))]
    pub quality_rating: Option<Decimal>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FactoryListQuery {
    /// Nome, especialidade ou contato
    pub search: Option<String>,
}

// --- ORDENS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingOrder {
    pub id: Uuid,

    #[schema(example = "MFG-20250115-0001")]
    pub order_number: String,

    pub factory_id: Uuid,
    pub factory_name: String,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub status: ManufacturingStatus,
    pub raw_materials_cost: Decimal,
    pub manufacturing_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawMaterialLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_required: Decimal,
    pub quantity_sent: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinishedProductLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_expected: Decimal,
    pub quantity_received: Decimal,
    pub quality_grade: QualityGrade,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingOrderDetail {
    #[serde(flatten)]
    pub order: ManufacturingOrder,
    pub raw_materials: Vec<RawMaterialLine>,
    pub finished_products: Vec<FinishedProductLine>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingLinePayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateManufacturingOrderPayload {
    pub factory_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,

    // Mão de obra cobrada pela fábrica
    #[validate(custom(function = "validate_money"))]
    #[serde(default)]
    pub manufacturing_cost: Decimal,

    // Sai do estoque na criação, ao custo atual do produto
    #[validate(length(min = 1, message = "items_required"))]
    #[validate(nested)]
    pub raw_materials: Vec<ManufacturingLinePayload>,

    #[validate(length(min = 1, message = "items_required"))]
    #[validate(nested)]
    pub finished_products: Vec<ManufacturingLinePayload>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveFinishedLinePayload {
    pub finished_product_id: Uuid,

    // Zero registra a linha sem entrada de estoque
    #[validate(custom(function = "validate_stock_level"))]
    pub quantity_received: Decimal,

    // Padrão A
    pub quality_grade: Option<QualityGrade>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveManufacturingPayload {
    #[validate(length(min = 1, message = "items_required"))]
    #[validate(nested)]
    pub items: Vec<ReceiveFinishedLinePayload>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ManufacturingListQuery {
    /// Número da ordem ou nome da fábrica
    pub search: Option<String>,
    pub status: Option<ManufacturingStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn clean_delivery_raises_rating_up_to_five() {
        assert_eq!(next_quality_rating(dec!(4.5), 0, dec!(100)), dec!(4.6));
        assert_eq!(next_quality_rating(dec!(4.95), 0, dec!(100)), dec!(5));
        assert_eq!(next_quality_rating(dec!(5.0), 0, dec!(0)), dec!(5));
    }

    #[test]
    fn many_issues_lower_rating_down_to_one() {
        // 2 linhas B/C sobre 5 peças: 2 > 1.5
        assert_eq!(next_quality_rating(dec!(4.0), 2, dec!(5)), dec!(3.8));
        assert_eq!(next_quality_rating(dec!(1.1), 3, dec!(2)), dec!(1));
    }

    #[test]
    fn few_issues_keep_rating() {
        // 1 linha B sobre 100 peças fica dentro da tolerância
        assert_eq!(next_quality_rating(dec!(4.2), 1, dec!(100)), dec!(4.2));
    }

    #[test]
    fn costs_add_labour_to_raw_materials() {
        let lines = [line_cost(dec!(12.5), dec!(40)), line_cost(dec!(3), dec!(9.99))];
        assert_eq!(lines, [dec!(500.00), dec!(29.97)]);
        assert_eq!(order_costs(&lines, dec!(150)), (dec!(529.97), dec!(679.97)));
    }

    #[test]
    fn only_running_orders_receive_and_open_orders_cancel() {
        use ManufacturingStatus::*;
        assert!(InProgress.accepts_receipt());
        for status in [Pending, Completed, Cancelled] {
            assert!(!status.accepts_receipt(), "{status:?}");
        }
        assert!(Pending.can_cancel());
        assert!(InProgress.can_cancel());
        assert!(!Completed.can_cancel());
        assert!(!Cancelled.can_cancel());
    }

    #[test]
    fn grades_b_and_c_are_issues() {
        assert!(!QualityGrade::A.is_issue());
        assert!(QualityGrade::B.is_issue());
        assert!(QualityGrade::C.is_issue());
    }

    #[test]
    fn rating_must_be_between_one_and_five() {
        assert!(validate_rating(&dec!(1)).is_ok());
        assert!(validate_rating(&dec!(4.5)).is_ok());
        assert!(validate_rating(&dec!(0.9)).is_err());
        assert!(validate_rating(&dec!(5.1)).is_err());
        assert!(validate_rating(&dec!(4.55)).is_err());
    }
}
