// src/db/treasury_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::treasury::{Treasury, TreasuryEntryRequest, TreasuryKind, TreasuryTransaction},
};

const TREASURY_COLUMNS: &str = "id, name, kind, description, current_balance, is_active, created_at";

const TRANSACTION_COLUMNS: &str = "id, treasury_id, user_id, transaction_type, amount, balance_before, \
                                   balance_after, reference_type, reference_id, description, created_at";

#[derive(Clone)]
pub struct TreasuryRepository {
    pool: PgPool,
}

impl TreasuryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_treasuries(&self) -> Result<Vec<Treasury>, AppError> {
        let sql = format!("SELECT {TREASURY_COLUMNS} FROM treasuries ORDER BY kind, name");
        Ok(sqlx::query_as::<_, Treasury>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn find_treasury(&self, id: Uuid) -> Result<Option<Treasury>, AppError> {
        let sql = format!("SELECT {TREASURY_COLUMNS} FROM treasuries WHERE id = $1");
        Ok(sqlx::query_as::<_, Treasury>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn list_transactions(&self, treasury_id: Uuid) -> Result<Vec<TreasuryTransaction>, AppError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM treasury_transactions
             WHERE treasury_id = $1
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, TreasuryTransaction>(&sql)
            .bind(treasury_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn create_treasury(
        &self,
        name: &str,
        kind: TreasuryKind,
        description: Option<&str>,
    ) -> Result<Treasury, AppError> {
        let sql = format!(
            "INSERT INTO treasuries (name, kind, description)
             VALUES ($1, $2, $3)
             RETURNING {TREASURY_COLUMNS}"
        );
        let treasury = sqlx::query_as::<_, Treasury>(&sql)
            .bind(name)
            .bind(kind)
            .bind(description)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;
        Ok(treasury)
    }

    // ---
    // Razão de tesouraria
    // ---

    pub async fn lock_treasury<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Treasury>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {TREASURY_COLUMNS} FROM treasuries WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Treasury>(&sql).bind(id).fetch_optional(executor).await?)
    }

    // Tesouraria ativa do tipo (MAIN / SHIPPING), travada
    pub async fn lock_treasury_by_kind<'e, E>(
        &self,
        executor: E,
        kind: TreasuryKind,
    ) -> Result<Option<Treasury>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {TREASURY_COLUMNS} FROM treasuries
             WHERE kind = $1 AND is_active
             ORDER BY created_at ASC
             LIMIT 1
             FOR UPDATE"
        );
        Ok(sqlx::query_as::<_, Treasury>(&sql).bind(kind).fetch_optional(executor).await?)
    }

    pub async fn set_balance<'e, E>(&self, executor: E, id: Uuid, balance: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE treasuries SET current_balance = $2 WHERE id = $1")
            .bind(id)
            .bind(balance)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_transaction<'e, E>(
        &self,
        executor: E,
        request: &TreasuryEntryRequest<'_>,
        user_id: Uuid,
        balance_before: Decimal,
        balance_after: Decimal,
    ) -> Result<TreasuryTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO treasury_transactions (
                treasury_id, user_id, transaction_type, amount, balance_before, balance_after,
                reference_type, reference_id, description
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {TRANSACTION_COLUMNS}"
        );
        let transaction = sqlx::query_as::<_, TreasuryTransaction>(&sql)
            .bind(request.treasury_id)
            .bind(user_id)
            .bind(request.transaction_type)
            .bind(request.amount)
            .bind(balance_before)
            .bind(balance_after)
            .bind(request.reference_type)
            .bind(request.reference_id)
            .bind(request.description)
            .fetch_one(executor)
            .await?;
        Ok(transaction)
    }
}
