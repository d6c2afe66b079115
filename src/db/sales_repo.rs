// src/db/sales_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{CreateSalePayload, InvoiceTotals, PaymentStatus, Sale, SaleItem},
};

const SALE_COLUMNS: &str = "id, invoice_number, customer_id, user_id, sale_date, due_date, subtotal, \
                            discount_amount, tax_amount, shipping_cost, total_amount, paid_amount, \
                            remaining_amount, payment_method, payment_status, shipping_address, \
                            shipping_city, shipping_governorate, shipping_phone, shipping_status, \
                            notes, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "si.id, si.sale_id, si.product_id, p.name AS product_name, si.quantity, \
                                 si.unit_price, si.discount_amount, si.total_price, si.cost_price, \
                                 si.notes, si.created_at";

// Linha já calculada pelo serviço
#[derive(Debug, Clone)]
pub struct NewSaleItem<'a> {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub total_price: Decimal,
    pub cost_price: Decimal,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_sales(
        &self,
        payment_status: Option<PaymentStatus>,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<Sale>, AppError> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE ($1::payment_status IS NULL OR payment_status = $1)
               AND ($2::uuid IS NULL OR customer_id = $2)
             ORDER BY sale_date DESC"
        );
        Ok(sqlx::query_as::<_, Sale>(&sql)
            .bind(payment_status)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn find_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1");
        Ok(sqlx::query_as::<_, Sale>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn lock_sale<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Sale>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn list_items<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {SALE_ITEM_COLUMNS}
             FROM sale_items si
             JOIN products p ON p.id = si.product_id
             WHERE si.sale_id = $1
             ORDER BY si.created_at ASC, si.id ASC"
        );
        Ok(sqlx::query_as::<_, SaleItem>(&sql).bind(sale_id).fetch_all(executor).await?)
    }

    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        invoice_number: &str,
        customer_id: Option<Uuid>,
        user_id: Uuid,
        due_date: Option<NaiveDate>,
        totals: &InvoiceTotals,
        payload: &CreateSalePayload,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO sales (
                invoice_number, customer_id, user_id, due_date, subtotal, discount_amount,
                tax_amount, shipping_cost, total_amount, paid_amount, remaining_amount,
                payment_method, payment_status, shipping_address, shipping_city,
                shipping_governorate, shipping_phone, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                     COALESCE($12, 'cash'), $13, $14, $15, $16, $17, $18)
             RETURNING {SALE_COLUMNS}"
        );
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(invoice_number)
            .bind(customer_id)
            .bind(user_id)
            .bind(due_date)
            .bind(totals.subtotal)
            .bind(totals.discount_amount)
            .bind(totals.tax_amount)
            .bind(totals.shipping_cost)
            .bind(totals.total_amount)
            .bind(totals.paid_amount)
            .bind(totals.remaining_amount)
            .bind(payload.payment_method.as_deref())
            .bind(totals.payment_status)
            .bind(payload.shipping_address.as_deref())
            .bind(payload.shipping_city.as_deref())
            .bind(payload.shipping_governorate.as_deref())
            .bind(payload.shipping_phone.as_deref())
            .bind(payload.notes.as_deref())
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn insert_item<'e, E>(&self, executor: E, sale_id: Uuid, item: &NewSaleItem<'_>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO sale_items (
                sale_id, product_id, quantity, unit_price, discount_amount, total_price, cost_price, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(sale_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.discount_amount)
        .bind(item.total_price)
        .bind(item.cost_price)
        .bind(item.notes)
        .execute(executor)
        .await?;
        Ok(())
    }

    // Pago/restante/status sempre gravados juntos (as CHECKs da tabela exigem)
    pub async fn apply_payment<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        paid_amount: Decimal,
        remaining_amount: Decimal,
        payment_status: PaymentStatus,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE sales SET
                paid_amount = $2, remaining_amount = $3, payment_status = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {SALE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(paid_amount)
            .bind(remaining_amount)
            .bind(payment_status)
            .fetch_one(executor)
            .await?)
    }

    pub async fn set_shipping_status<'e, E>(&self, executor: E, id: Uuid, status: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE sales SET shipping_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }
}
