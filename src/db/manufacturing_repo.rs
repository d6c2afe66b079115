// src/db/manufacturing_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        manufacturing::{
            CreateFactoryPayload, Factory, FinishedProductLine, ManufacturingOrder, ManufacturingStatus,
            QualityGrade, RawMaterialLine,
        },
        parties::contains_pattern,
    },
};

const FACTORY_COLUMNS: &str = "id, name, contact_person, phone, email, address, specialization, \
                               production_capacity, quality_rating, notes, is_active, created_by_id, created_at";

const ORDER_COLUMNS: &str = "o.id, o.order_number, o.factory_id, f.name AS factory_name, o.order_date, \
                             o.expected_delivery_date, o.actual_delivery_date, o.status, o.raw_materials_cost, \
                             o.manufacturing_cost, o.total_cost, o.notes, o.created_by_id, o.created_at, \
                             o.updated_at";

const RAW_COLUMNS: &str = "r.id, r.order_id, r.product_id, p.name AS product_name, r.quantity_required, \
                           r.quantity_sent, r.unit_cost, r.total_cost, r.notes, r.created_at";

const FINISHED_COLUMNS: &str = "fp.id, fp.order_id, fp.product_id, p.name AS product_name, fp.quantity_expected, \
                                fp.quantity_received, fp.quality_grade, fp.unit_cost, fp.total_cost, fp.notes, \
                                fp.created_at";

// Cabeçalho de uma ordem nova, custos já calculados
#[derive(Debug, Clone)]
pub struct NewManufacturingOrder<'a> {
    pub order_number: &'a str,
    pub factory_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub raw_materials_cost: Decimal,
    pub manufacturing_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<&'a str>,
    pub created_by_id: Uuid,
}

#[derive(Clone)]
pub struct ManufacturingRepository {
    pool: PgPool,
}

impl ManufacturingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // FÁBRICAS
    // ---

    pub async fn list_factories(&self, term: Option<&str>) -> Result<Vec<Factory>, AppError> {
        let sql = format!(
            "SELECT {FACTORY_COLUMNS} FROM factories
             WHERE is_active
               AND ($1::text IS NULL
                    OR name ILIKE $1 ESCAPE '\\'
                    OR specialization ILIKE $1 ESCAPE '\\'
                    OR contact_person ILIKE $1 ESCAPE '\\')
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Factory>(&sql)
            .bind(term.map(contains_pattern))
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn create_factory(&self, payload: &CreateFactoryPayload, user_id: Uuid) -> Result<Factory, AppError> {
        let sql = format!(
            "INSERT INTO factories (
                name, contact_person, phone, email, address, specialization,
                production_capacity, quality_rating, notes, created_by_id
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8::numeric, 5), $9, $10)
             RETURNING {FACTORY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Factory>(&sql)
            .bind(payload.name.trim())
            .bind(payload.contact_person.as_deref())
            .bind(payload.phone.as_deref())
            .bind(payload.email.as_deref())
            .bind(payload.address.as_deref())
            .bind(payload.specialization.as_deref())
            .bind(payload.production_capacity)
            .bind(payload.quality_rating)
            .bind(payload.notes.as_deref())
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn lock_factory<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Factory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {FACTORY_COLUMNS} FROM factories WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Factory>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn set_quality_rating<'e, E>(&self, executor: E, id: Uuid, rating: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE factories SET quality_rating = $2 WHERE id = $1")
            .bind(id)
            .bind(rating.round_dp(1))
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // ORDENS
    // ---

    pub async fn list_orders(
        &self,
        term: Option<&str>,
        status: Option<ManufacturingStatus>,
    ) -> Result<Vec<ManufacturingOrder>, AppError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}
             FROM manufacturing_orders o
             JOIN factories f ON f.id = o.factory_id
             WHERE ($1::text IS NULL OR o.order_number ILIKE $1 ESCAPE '\\' OR f.name ILIKE $1 ESCAPE '\\')
               AND ($2::manufacturing_status IS NULL OR o.status = $2)
             ORDER BY o.order_date DESC"
        );
        Ok(sqlx::query_as::<_, ManufacturingOrder>(&sql)
            .bind(term.map(contains_pattern))
            .bind(status)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn find_order<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ManufacturingOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}
             FROM manufacturing_orders o
             JOIN factories f ON f.id = o.factory_id
             WHERE o.id = $1"
        );
        Ok(sqlx::query_as::<_, ManufacturingOrder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?)
    }

    pub async fn lock_order<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ManufacturingOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {ORDER_COLUMNS}
             FROM manufacturing_orders o
             JOIN factories f ON f.id = o.factory_id
             WHERE o.id = $1
             FOR UPDATE OF o"
        );
        Ok(sqlx::query_as::<_, ManufacturingOrder>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?)
    }

    /// Insere o cabeçalho já em produção; devolve o id.
    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewManufacturingOrder<'_>) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO manufacturing_orders (
                order_number, factory_id, expected_delivery_date, status, raw_materials_cost,
                manufacturing_cost, total_cost, notes, created_by_id
             )
             VALUES ($1, $2, $3, 'IN_PROGRESS', $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(order.order_number)
        .bind(order.factory_id)
        .bind(order.expected_delivery_date)
        .bind(order.raw_materials_cost)
        .bind(order.manufacturing_cost)
        .bind(order.total_cost)
        .bind(order.notes)
        .bind(order.created_by_id)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: ManufacturingStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE manufacturing_orders SET
                status = $2,
                actual_delivery_date = CASE WHEN $2 = 'COMPLETED'::manufacturing_status
                                            THEN NOW() ELSE actual_delivery_date END,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // LINHAS
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_raw_material<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        unit_cost: Decimal,
        total_cost: Decimal,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Matéria-prima sai inteira na criação
        sqlx::query(
            "INSERT INTO manufacturing_raw_materials (
                order_id, product_id, quantity_required, quantity_sent, unit_cost, total_cost, notes
             )
             VALUES ($1, $2, $3, $3, $4, $5, $6)",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_finished_product<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        unit_cost: Decimal,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO manufacturing_finished_products (order_id, product_id, quantity_expected, unit_cost, notes)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_cost)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list_raw_materials<'e, E>(&self, executor: E, order_id: Uuid) -> Result<Vec<RawMaterialLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {RAW_COLUMNS}
             FROM manufacturing_raw_materials r
             JOIN products p ON p.id = r.product_id
             WHERE r.order_id = $1
             ORDER BY r.created_at ASC, r.id ASC"
        );
        Ok(sqlx::query_as::<_, RawMaterialLine>(&sql)
            .bind(order_id)
            .fetch_all(executor)
            .await?)
    }

    pub async fn list_finished_products<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
    ) -> Result<Vec<FinishedProductLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {FINISHED_COLUMNS}
             FROM manufacturing_finished_products fp
             JOIN products p ON p.id = fp.product_id
             WHERE fp.order_id = $1
             ORDER BY fp.created_at ASC, fp.id ASC"
        );
        Ok(sqlx::query_as::<_, FinishedProductLine>(&sql)
            .bind(order_id)
            .fetch_all(executor)
            .await?)
    }

    pub async fn record_received<'e, E>(
        &self,
        executor: E,
        line_id: Uuid,
        quantity: Decimal,
        grade: QualityGrade,
        total_cost: Decimal,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE manufacturing_finished_products SET
                quantity_received = $2, quality_grade = $3, total_cost = $4, notes = COALESCE($5, notes)
             WHERE id = $1",
        )
        .bind(line_id)
        .bind(quantity)
        .bind(grade)
        .bind(total_cost)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(())
    }
}
