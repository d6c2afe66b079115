// src/models/shipments.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shipment_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Preparing,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Returned,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Preparing => "PREPARING",
            ShipmentStatus::PickedUp => "PICKED_UP",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Returned => "RETURNED",
            ShipmentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Tabela de transições permitidas.
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (self, next),
            (Preparing, PickedUp | Cancelled)
                | (PickedUp, InTransit | Returned | Cancelled)
                | (InTransit, OutForDelivery | Delivered | Returned)
                | (OutForDelivery, Delivered | Returned)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Returned | ShipmentStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "collection_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStatus {
    NotCollected,
    Collected,
}

/// Comissão da transportadora sobre o valor cobrado na entrega.
pub fn collection_commission(cod_amount: Decimal, commission_percentage: Decimal) -> Decimal {
    (cod_amount * commission_percentage / Decimal::ONE_HUNDRED).round_dp(2)
}

// --- TRANSPORTADORAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCompany {
    pub id: Uuid,

    #[schema(example = "Bosta")]
    pub name: String,

    #[schema(example = "BOSTA")]
    pub code: Option<String>,

    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub base_price: Decimal,
    pub price_per_kg: Decimal,

    // Percentual sobre o COD
    #[schema(example = "2.50")]
    pub collection_commission: Decimal,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShippingCompanyPayload {
    #[validate(length(min = 1, max = 100, message = "required"))]
    pub name: String,

    #[validate(length(max = 20))]
    pub code: Option<String>,

    pub phone: Option<String>,
    pub contact_person: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub base_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub price_per_kg: Decimal,

    #[validate(custom(function = "validate_percentage"))]
    #[serde(default)]
    pub collection_commission: Decimal,
}

// --- ENVIOS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: Uuid,

    #[schema(example = "SH-202501-0001")]
    pub shipment_number: String,

    pub sale_id: Option<Uuid>,
    pub shipping_company_id: Option<Uuid>,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_governorate: String,
    pub weight: Option<Decimal>,
    pub pieces_count: i32,
    pub content_description: Option<String>,
    pub cod_amount: Decimal,
    pub shipping_cost: Decimal,

    // Valor (não percentual) já calculado na criação
    pub collection_commission: Decimal,

    pub status: ShipmentStatus,
    pub tracking_number: Option<String>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub collection_status: CollectionStatus,
    pub collected_amount: Decimal,
    pub collection_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentStatusHistory {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub user_id: Uuid,
    pub old_status: Option<ShipmentStatus>,
    pub new_status: ShipmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDetail {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub history: Vec<ShipmentStatusHistory>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentPayload {
    pub sale_id: Option<Uuid>,
    pub shipping_company_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "required"))]
    pub recipient_name: String,

    #[validate(length(min = 1, max = 20, message = "required"))]
    pub recipient_phone: String,

    #[validate(length(min = 1, message = "required"))]
    pub recipient_address: String,

    #[validate(length(min = 1, max = 50, message = "required"))]
    pub recipient_city: String,

    #[validate(length(min = 1, max = 50, message = "required"))]
    pub recipient_governorate: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub weight: Option<Decimal>,

    #[validate(range(min = 1))]
    #[serde(default = "default_pieces")]
    pub pieces_count: i32,

    pub content_description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cod_amount: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub shipping_cost: Decimal,

    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

fn default_pieces() -> i32 {
    1
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShipmentStatusPayload {
    pub status: ShipmentStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShipmentListQuery {
    pub status: Option<ShipmentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use ShipmentStatus::*;

    const ALL: [ShipmentStatus; 7] =
        [Preparing, PickedUp, InTransit, OutForDelivery, Delivered, Returned, Cancelled];

    #[test]
    fn forward_path_is_allowed() {
        assert!(Preparing.can_transition_to(PickedUp));
        assert!(PickedUp.can_transition_to(InTransit));
        assert!(InTransit.can_transition_to(OutForDelivery));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(InTransit.can_transition_to(Delivered));
    }

    #[test]
    fn cancel_only_before_transit() {
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(PickedUp.can_transition_to(Cancelled));
        assert!(!InTransit.can_transition_to(Cancelled));
        assert!(!OutForDelivery.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for from in [Delivered, Returned, Cancelled] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn no_self_or_backward_transitions() {
        for s in ALL {
            assert!(!s.can_transition_to(s));
        }
        assert!(!InTransit.can_transition_to(Preparing));
        assert!(!Preparing.can_transition_to(Delivered));
    }

    #[test]
    fn commission_is_percentage_of_cod() {
        assert_eq!(collection_commission(dec!(1500), dec!(2.5)), dec!(37.50));
        assert_eq!(collection_commission(dec!(0), dec!(3)), dec!(0));
        assert_eq!(collection_commission(dec!(333.33), dec!(1)), dec!(3.33));
    }
}
