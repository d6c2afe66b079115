// src/db/shipment_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::shipments::{
        CreateShipmentPayload, CreateShippingCompanyPayload, Shipment, ShipmentStatus,
        ShipmentStatusHistory, ShippingCompany,
    },
};

const COMPANY_COLUMNS: &str = "id, name, code, phone, contact_person, base_price, price_per_kg, \
                               collection_commission, is_active, created_at";

const SHIPMENT_COLUMNS: &str = "id, shipment_number, sale_id, shipping_company_id, recipient_name, \
                                recipient_phone, recipient_address, recipient_city, recipient_governorate, \
                                weight, pieces_count, content_description, cod_amount, shipping_cost, \
                                collection_commission, status, tracking_number, pickup_date, delivery_date, \
                                collection_status, collected_amount, collection_date, notes, created_at, \
                                updated_at";

#[derive(Clone)]
pub struct ShipmentRepository {
    pool: PgPool,
}

impl ShipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Transportadoras
    // ---

    pub async fn list_companies(&self) -> Result<Vec<ShippingCompany>, AppError> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM shipping_companies WHERE is_active ORDER BY name");
        Ok(sqlx::query_as::<_, ShippingCompany>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn find_company<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ShippingCompany>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM shipping_companies WHERE id = $1");
        Ok(sqlx::query_as::<_, ShippingCompany>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn create_company(&self, payload: &CreateShippingCompanyPayload) -> Result<ShippingCompany, AppError> {
        let sql = format!(
            "INSERT INTO shipping_companies
                (name, code, phone, contact_person, base_price, price_per_kg, collection_commission)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COMPANY_COLUMNS}"
        );
        let company = sqlx::query_as::<_, ShippingCompany>(&sql)
            .bind(&payload.name)
            .bind(payload.code.as_deref())
            .bind(payload.phone.as_deref())
            .bind(payload.contact_person.as_deref())
            .bind(payload.base_price)
            .bind(payload.price_per_kg)
            .bind(payload.collection_commission)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;
        Ok(company)
    }

    // ---
    // Envios
    // ---

    pub async fn list_shipments(&self, status: Option<ShipmentStatus>) -> Result<Vec<Shipment>, AppError> {
        let sql = format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments
             WHERE ($1::shipment_status IS NULL OR status = $1)
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Shipment>(&sql).bind(status).fetch_all(&self.pool).await?)
    }

    pub async fn find_shipment(&self, id: Uuid) -> Result<Option<Shipment>, AppError> {
        let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1");
        Ok(sqlx::query_as::<_, Shipment>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn lock_shipment<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Shipment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Shipment>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn insert_shipment<'e, E>(
        &self,
        executor: E,
        shipment_number: &str,
        payload: &CreateShipmentPayload,
        collection_commission: Decimal,
    ) -> Result<Shipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO shipments (
                shipment_number, sale_id, shipping_company_id, recipient_name, recipient_phone,
                recipient_address, recipient_city, recipient_governorate, weight, pieces_count,
                content_description, cod_amount, shipping_cost, collection_commission,
                tracking_number, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {SHIPMENT_COLUMNS}"
        );
        let shipment = sqlx::query_as::<_, Shipment>(&sql)
            .bind(shipment_number)
            .bind(payload.sale_id)
            .bind(payload.shipping_company_id)
            .bind(&payload.recipient_name)
            .bind(&payload.recipient_phone)
            .bind(&payload.recipient_address)
            .bind(&payload.recipient_city)
            .bind(&payload.recipient_governorate)
            .bind(payload.weight)
            .bind(payload.pieces_count)
            .bind(payload.content_description.as_deref())
            .bind(payload.cod_amount.round_dp(2))
            .bind(payload.shipping_cost.round_dp(2))
            .bind(collection_commission)
            .bind(payload.tracking_number.as_deref())
            .bind(payload.notes.as_deref())
            .fetch_one(executor)
            .await?;
        Ok(shipment)
    }

    // Datas de coleta/entrega só são preenchidas na primeira vez
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: ShipmentStatus,
        tracking_number: Option<&str>,
    ) -> Result<Shipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE shipments SET
                status = $2,
                tracking_number = COALESCE($3, tracking_number),
                pickup_date = CASE WHEN $2 = 'PICKED_UP'::shipment_status
                                   THEN COALESCE(pickup_date, NOW()) ELSE pickup_date END,
                delivery_date = CASE WHEN $2 = 'DELIVERED'::shipment_status
                                     THEN COALESCE(delivery_date, NOW()) ELSE delivery_date END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {SHIPMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Shipment>(&sql)
            .bind(id)
            .bind(status)
            .bind(tracking_number)
            .fetch_one(executor)
            .await?)
    }

    pub async fn mark_collected<'e, E>(&self, executor: E, id: Uuid, amount: Decimal) -> Result<Shipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE shipments SET
                collection_status = 'COLLECTED', collected_amount = $2,
                collection_date = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING {SHIPMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Shipment>(&sql)
            .bind(id)
            .bind(amount)
            .fetch_one(executor)
            .await?)
    }

    pub async fn insert_history<'e, E>(
        &self,
        executor: E,
        shipment_id: Uuid,
        user_id: Uuid,
        old_status: Option<ShipmentStatus>,
        new_status: ShipmentStatus,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO shipment_status_history (shipment_id, user_id, old_status, new_status, notes)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(shipment_id)
        .bind(user_id)
        .bind(old_status)
        .bind(new_status)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_history(&self, shipment_id: Uuid) -> Result<Vec<ShipmentStatusHistory>, AppError> {
        Ok(sqlx::query_as::<_, ShipmentStatusHistory>(
            "SELECT id, shipment_id, user_id, old_status, new_status, notes, created_at
             FROM shipment_status_history
             WHERE shipment_id = $1
             ORDER BY created_at ASC",
        )
        .bind(shipment_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
