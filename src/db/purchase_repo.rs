// src/db/purchase_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        purchases::{CreatePurchasePayload, Purchase, PurchaseItem, PurchaseStatus},
        sales::{InvoiceTotals, PaymentStatus},
    },
};

const PURCHASE_COLUMNS: &str = "id, invoice_number, supplier_id, user_id, purchase_date, due_date, \
                                subtotal, discount_percentage, discount_amount, tax_percentage, \
                                tax_amount, shipping_cost, total_amount, paid_amount, remaining_amount, \
                                payment_method, payment_status, status, notes, created_at, updated_at";

const PURCHASE_ITEM_COLUMNS: &str = "pi.id, pi.purchase_id, pi.product_id, p.name AS product_name, \
                                     pi.quantity, pi.received_quantity, pi.unit_cost, pi.total_cost, \
                                     pi.created_at";

#[derive(Clone)]
pub struct PurchaseRepository {
    pool: PgPool,
}

impl PurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_purchases(&self) -> Result<Vec<Purchase>, AppError> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY purchase_date DESC");
        Ok(sqlx::query_as::<_, Purchase>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn find_purchase<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1");
        Ok(sqlx::query_as::<_, Purchase>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn lock_purchase<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Purchase>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Purchase>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn list_items<'e, E>(&self, executor: E, purchase_id: Uuid) -> Result<Vec<PurchaseItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PURCHASE_ITEM_COLUMNS}
             FROM purchase_items pi
             JOIN products p ON p.id = pi.product_id
             WHERE pi.purchase_id = $1
             ORDER BY pi.created_at ASC, pi.id ASC"
        );
        Ok(sqlx::query_as::<_, PurchaseItem>(&sql)
            .bind(purchase_id)
            .fetch_all(executor)
            .await?)
    }

    pub async fn insert_purchase<'e, E>(
        &self,
        executor: E,
        invoice_number: &str,
        user_id: Uuid,
        totals: &InvoiceTotals,
        payload: &CreatePurchasePayload,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO purchases (
                invoice_number, supplier_id, user_id, due_date, subtotal, discount_percentage,
                discount_amount, tax_percentage, tax_amount, shipping_cost, total_amount,
                paid_amount, remaining_amount, payment_method, payment_status, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     COALESCE($14, 'cash'), $15, $16)
             RETURNING {PURCHASE_COLUMNS}"
        );
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(invoice_number)
            .bind(payload.supplier_id)
            .bind(user_id)
            .bind(payload.due_date)
            .bind(totals.subtotal)
            .bind(payload.discount_percentage)
            .bind(totals.discount_amount)
            .bind(payload.tax_percentage)
            .bind(totals.tax_amount)
            .bind(totals.shipping_cost)
            .bind(totals.total_amount)
            .bind(totals.paid_amount)
            .bind(totals.remaining_amount)
            .bind(payload.payment_method.as_deref())
            .bind(totals.payment_status)
            .bind(payload.notes.as_deref())
            .fetch_one(executor)
            .await?;
        Ok(purchase)
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        purchase_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        unit_cost: Decimal,
        total_cost: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO purchase_items (purchase_id, product_id, quantity, unit_cost, total_cost)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(purchase_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_cost)
        .bind(total_cost)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn add_received_quantity<'e, E>(&self, executor: E, item_id: Uuid, quantity: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE purchase_items SET received_quantity = received_quantity + $2 WHERE id = $1")
            .bind(item_id)
            .bind(quantity)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: PurchaseStatus) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE purchases SET status = $2, updated_at = NOW() WHERE id = $1
             RETURNING {PURCHASE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await?)
    }

    pub async fn apply_payment<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        paid_amount: Decimal,
        remaining_amount: Decimal,
        payment_status: PaymentStatus,
    ) -> Result<Purchase, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE purchases SET
                paid_amount = $2, remaining_amount = $3, payment_status = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {PURCHASE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Purchase>(&sql)
            .bind(id)
            .bind(paid_amount)
            .bind(remaining_amount)
            .bind(payment_status)
            .fetch_one(executor)
            .await?)
    }
}
