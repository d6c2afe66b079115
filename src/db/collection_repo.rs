// src/db/collection_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::collections::{
        AlertType, CollectionAlert, CollectionFollowUp, CollectionSettings, CollectionTask,
        ContactResult, CreateFollowUpPayload, OpenTaskForAlert, TaskPriority, TaskStatus,
        UpdateCollectionSettingsPayload,
    },
};

const TASK_COLUMNS: &str = "id, customer_id, sale_id, assigned_user_id, created_by_id, title, description, \
                            amount_to_collect, priority, status, due_date, completed_at, contact_attempts, \
                            last_contact_at, last_contact_result, notes, created_at, updated_at";

const FOLLOW_UP_COLUMNS: &str = "id, task_id, user_id, contact_type, contact_result, description, \
                                 promised_payment_date, promised_amount, next_follow_up_date, \
                                 next_follow_up_notes, created_at";

const ALERT_COLUMNS: &str = "id, user_id, task_id, customer_id, alert_type, title, message, priority, \
                             is_read, is_dismissed, read_at, created_at";

const SETTINGS_COLUMNS: &str = "alert_days_before_due, alert_days_after_due, auto_create_tasks, \
                                default_due_days, high_priority_threshold, max_contact_attempts, updated_at";

// Dados de uma tarefa nova, já com os padrões resolvidos
#[derive(Debug, Clone)]
pub struct NewCollectionTask<'a> {
    pub customer_id: Uuid,
    pub sale_id: Option<Uuid>,
    pub assigned_user_id: Uuid,
    pub created_by_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub amount_to_collect: Decimal,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Configurações
    // ---

    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<CollectionSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM collection_settings WHERE id");
        Ok(sqlx::query_as::<_, CollectionSettings>(&sql).fetch_one(executor).await?)
    }

    pub async fn update_settings(&self, input: &UpdateCollectionSettingsPayload) -> Result<CollectionSettings, AppError> {
        let sql = format!(
            "UPDATE collection_settings SET
                alert_days_before_due = $1, alert_days_after_due = $2, auto_create_tasks = $3,
                default_due_days = $4, high_priority_threshold = $5, max_contact_attempts = $6,
                updated_at = NOW()
             WHERE id
             RETURNING {SETTINGS_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CollectionSettings>(&sql)
            .bind(input.alert_days_before_due)
            .bind(input.alert_days_after_due)
            .bind(input.auto_create_tasks)
            .bind(input.default_due_days)
            .bind(input.high_priority_threshold)
            .bind(input.max_contact_attempts)
            .fetch_one(&self.pool)
            .await?)
    }

    // ---
    // Tarefas
    // ---

    pub async fn list_tasks(
        &self,
        status: Option<TaskStatus>,
        assigned_user_id: Option<Uuid>,
    ) -> Result<Vec<CollectionTask>, AppError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM collection_tasks
             WHERE ($1::task_status IS NULL OR status = $1)
               AND ($2::uuid IS NULL OR assigned_user_id = $2)
             ORDER BY due_date ASC, priority DESC"
        );
        Ok(sqlx::query_as::<_, CollectionTask>(&sql)
            .bind(status)
            .bind(assigned_user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn find_task(&self, id: Uuid) -> Result<Option<CollectionTask>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM collection_tasks WHERE id = $1");
        Ok(sqlx::query_as::<_, CollectionTask>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    pub async fn lock_task<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<CollectionTask>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {TASK_COLUMNS} FROM collection_tasks WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, CollectionTask>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn has_open_task_for_sale<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM collection_tasks
                WHERE sale_id = $1 AND status IN ('NEW', 'IN_PROGRESS', 'POSTPONED')
             )",
        )
        .bind(sale_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn insert_task<'e, E>(&self, executor: E, task: &NewCollectionTask<'_>) -> Result<CollectionTask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO collection_tasks (
                customer_id, sale_id, assigned_user_id, created_by_id, title, description,
                amount_to_collect, priority, due_date, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {TASK_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CollectionTask>(&sql)
            .bind(task.customer_id)
            .bind(task.sale_id)
            .bind(task.assigned_user_id)
            .bind(task.created_by_id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.amount_to_collect.round_dp(2))
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.notes)
            .fetch_one(executor)
            .await?)
    }

    pub async fn record_contact<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        result: ContactResult,
        new_status: TaskStatus,
    ) -> Result<CollectionTask, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE collection_tasks SET
                contact_attempts = contact_attempts + 1,
                last_contact_at = NOW(),
                last_contact_result = $2,
                status = $3,
                completed_at = CASE WHEN $3 = 'COMPLETED'::task_status THEN NOW() ELSE completed_at END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CollectionTask>(&sql)
            .bind(task_id)
            .bind(result)
            .bind(new_status)
            .fetch_one(executor)
            .await?)
    }

    pub async fn insert_follow_up<'e, E>(
        &self,
        executor: E,
        task_id: Uuid,
        user_id: Uuid,
        payload: &CreateFollowUpPayload,
    ) -> Result<CollectionFollowUp, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO collection_follow_ups (
                task_id, user_id, contact_type, contact_result, description, promised_payment_date,
                promised_amount, next_follow_up_date, next_follow_up_notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {FOLLOW_UP_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CollectionFollowUp>(&sql)
            .bind(task_id)
            .bind(user_id)
            .bind(payload.contact_type)
            .bind(payload.contact_result)
            .bind(&payload.description)
            .bind(payload.promised_payment_date)
            .bind(payload.promised_amount)
            .bind(payload.next_follow_up_date)
            .bind(payload.next_follow_up_notes.as_deref())
            .fetch_one(executor)
            .await?)
    }

    pub async fn list_follow_ups(&self, task_id: Uuid) -> Result<Vec<CollectionFollowUp>, AppError> {
        let sql = format!(
            "SELECT {FOLLOW_UP_COLUMNS} FROM collection_follow_ups
             WHERE task_id = $1
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, CollectionFollowUp>(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?)
    }

    // ---
    // Alertas
    // ---

    // Tarefas abertas + data do próximo retorno do follow-up mais recente
    pub async fn list_open_tasks_for_alerts(&self) -> Result<Vec<OpenTaskForAlert>, AppError> {
        Ok(sqlx::query_as::<_, OpenTaskForAlert>(
            "SELECT t.id, t.customer_id, t.assigned_user_id, t.title, t.priority, t.due_date,
                    (SELECT f.next_follow_up_date FROM collection_follow_ups f
                     WHERE f.task_id = t.id
                     ORDER BY f.created_at DESC
                     LIMIT 1) AS next_follow_up_date
             FROM collection_tasks t
             WHERE t.status IN ('NEW', 'IN_PROGRESS', 'POSTPONED')",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Insere o alerta; o índice diário único descarta repetições. Retorna as linhas inseridas.
    pub async fn insert_alert(
        &self,
        task: &OpenTaskForAlert,
        alert_type: AlertType,
        title: &str,
        message: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO collection_alerts (user_id, task_id, customer_id, alert_type, title, message, priority)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT DO NOTHING",
        )
        .bind(task.assigned_user_id)
        .bind(task.id)
        .bind(task.customer_id)
        .bind(alert_type)
        .bind(title)
        .bind(message)
        .bind(task.priority)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_alerts_for_user(&self, user_id: Uuid) -> Result<Vec<CollectionAlert>, AppError> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM collection_alerts
             WHERE user_id = $1 AND NOT is_dismissed
             ORDER BY is_read ASC, created_at DESC"
        );
        Ok(sqlx::query_as::<_, CollectionAlert>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    // Só o dono do alerta pode marcá-lo
    pub async fn mark_alert_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<CollectionAlert>, AppError> {
        let sql = format!(
            "UPDATE collection_alerts SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND user_id = $2
             RETURNING {ALERT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CollectionAlert>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn dismiss_alert(&self, id: Uuid, user_id: Uuid) -> Result<Option<CollectionAlert>, AppError> {
        let sql = format!(
            "UPDATE collection_alerts SET is_dismissed = TRUE
             WHERE id = $1 AND user_id = $2
             RETURNING {ALERT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, CollectionAlert>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }
}
