// src/db/sequence_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

// Contadores da tabela document_sequences
#[derive(Clone, Default)]
pub struct SequenceRepository;

impl SequenceRepository {
    pub fn new() -> Self {
        Self
    }

    /// Próximo valor do contador (prefixo, período). O UPSERT trava a linha
    /// até o fim da transação do chamador.
    pub async fn next_value<'e, E>(&self, executor: E, prefix: &str, period: &str) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: i32 = sqlx::query_scalar(
            "INSERT INTO document_sequences (prefix, period, last_value)
             VALUES ($1, $2, 1)
             ON CONFLICT (prefix, period)
             DO UPDATE SET last_value = document_sequences.last_value + 1
             RETURNING last_value",
        )
        .bind(prefix)
        .bind(period)
        .fetch_one(executor)
        .await?;
        Ok(value)
    }
}
