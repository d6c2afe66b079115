// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

// Linha única com os dados da empresa (usados no cabeçalho das faturas)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    #[schema(example = "VAYON Clothing")]
    pub business_name: String,

    #[schema(example = "12 Tahrir St, Cairo")]
    pub address: Option<String>,

    #[schema(example = "+20 100 000 0000")]
    pub phone: Option<String>,

    #[schema(example = "sales@vayon.local")]
    pub email: Option<String>,

    #[schema(example = "123-456-789")]
    pub tax_number: Option<String>,

    #[schema(example = "EGP")]
    pub currency: String,

    pub updated_at: DateTime<Utc>,
}

// Campos ausentes mantêm o valor atual
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "VAYON Clothing")]
    pub business_name: Option<String>,

    pub address: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "email"))]
    pub email: Option<String>,

    pub tax_number: Option<String>,

    #[validate(length(min = 3, max = 10))]
    #[schema(example = "EGP")]
    pub currency: Option<String>,
}
