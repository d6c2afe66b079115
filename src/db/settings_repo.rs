// src/db/settings_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::settings::{BusinessSettings, UpdateSettingsRequest},
};

const SETTINGS_COLUMNS: &str = "business_name, address, phone, email, tax_number, currency, updated_at";

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // A linha única é criada pela migration
    pub async fn get_settings(&self) -> Result<BusinessSettings, AppError> {
        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM business_settings WHERE id");
        let settings = sqlx::query_as::<_, BusinessSettings>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(settings)
    }

    // Campos ausentes (None) mantêm o valor atual
    pub async fn update_settings(&self, input: &UpdateSettingsRequest) -> Result<BusinessSettings, AppError> {
        let sql = format!(
            "UPDATE business_settings SET
                business_name = COALESCE($1, business_name),
                address = COALESCE($2, address),
                phone = COALESCE($3, phone),
                email = COALESCE($4, email),
                tax_number = COALESCE($5, tax_number),
                currency = COALESCE($6, currency),
                updated_at = NOW()
             WHERE id
             RETURNING {SETTINGS_COLUMNS}"
        );
        let settings = sqlx::query_as::<_, BusinessSettings>(&sql)
            .bind(input.business_name.as_deref())
            .bind(input.address.as_deref())
            .bind(input.phone.as_deref())
            .bind(input.email.as_deref())
            .bind(input.tax_number.as_deref())
            .bind(input.currency.as_deref().map(str::to_uppercase))
            .fetch_one(&self.pool)
            .await?;
        Ok(settings)
    }
}
