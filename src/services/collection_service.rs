// src/services/collection_service.rs

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{collection_repo::NewCollectionTask, CollectionRepository, PartyRepository, SalesRepository, UserRepository},
    models::{
        auth::User,
        collections::{
            classify_alerts, AlertScanResult, AlertType, CollectionAlert, CollectionSettings,
            CollectionTask, CollectionTaskDetail, CreateCollectionTaskPayload, CreateFollowUpPayload,
            OpenTaskForAlert, TaskListQuery, TaskPriority, TaskStatus, UpdateCollectionSettingsPayload,
        },
        sales::Sale,
    },
};

/// Prazo padrão de uma tarefa: hoje + dias configurados.
pub fn default_due_date(today: NaiveDate, settings: &CollectionSettings) -> NaiveDate {
    today + Duration::days(i64::from(settings.default_due_days.max(0)))
}

/// Venda de uma tarefa manual: precisa ser do mesmo cliente e não ter outra tarefa aberta.
pub fn check_task_sale(sale_customer_id: Option<Uuid>, customer_id: Uuid, has_open_task: bool) -> Result<(), AppError> {
    if sale_customer_id != Some(customer_id) {
        return Err(AppError::InvalidDocumentState("SALE_OF_ANOTHER_CUSTOMER".into()));
    }
    if has_open_task {
        return Err(AppError::InvalidDocumentState("OPEN_TASK_EXISTS".into()));
    }
    Ok(())
}

/// Responsável pela tarefa: existe e está ativo.
pub fn check_assignee(user: Option<User>) -> Result<User, AppError> {
    let user = user.ok_or(AppError::ResourceNotFound("user"))?;
    if !user.is_active {
        return Err(AppError::InvalidDocumentState("ASSIGNEE_INACTIVE".into()));
    }
    Ok(user)
}

/// Novo contato só em tarefa aberta e abaixo do limite de tentativas.
pub fn check_follow_up(status: TaskStatus, contact_attempts: i32, max_contact_attempts: i32) -> Result<(), AppError> {
    if !status.is_open() {
        return Err(AppError::InvalidDocumentState(format!("{status:?}").to_uppercase()));
    }
    if contact_attempts >= max_contact_attempts {
        return Err(AppError::InvalidDocumentState("MAX_CONTACT_ATTEMPTS".into()));
    }
    Ok(())
}

fn alert_text(alert_type: AlertType, task: &OpenTaskForAlert) -> (String, String) {
    match alert_type {
        AlertType::DueSoon => (
            format!("Due soon: {}", task.title),
            format!("Collection is due on {}.", task.due_date),
        ),
        AlertType::Overdue => (
            format!("Overdue: {}", task.title),
            format!("Collection was due on {}.", task.due_date),
        ),
        AlertType::FollowUpDue => (
            format!("Follow-up: {}", task.title),
            match task.next_follow_up_date {
                Some(date) => format!("A follow-up was scheduled for {date}."),
                None => "A follow-up is due.".to_string(),
            },
        ),
    }
}

#[derive(Clone)]
pub struct CollectionService {
    collection_repo: CollectionRepository,
    party_repo: PartyRepository,
    sales_repo: SalesRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl CollectionService {
    pub fn new(
        collection_repo: CollectionRepository,
        party_repo: PartyRepository,
        sales_repo: SalesRepository,
        user_repo: UserRepository,
        pool: PgPool,
    ) -> Self {
        Self { collection_repo, party_repo, sales_repo, user_repo, pool }
    }

    // ---
    // Configurações
    // ---

    pub async fn get_settings(&self) -> Result<CollectionSettings, AppError> {
        self.collection_repo.get_settings(&self.pool).await
    }

    pub async fn settings_in(&self, conn: &mut PgConnection) -> Result<CollectionSettings, AppError> {
        self.collection_repo.get_settings(conn).await
    }

    pub async fn update_settings(
        &self,
        payload: &UpdateCollectionSettingsPayload,
    ) -> Result<CollectionSettings, AppError> {
        self.collection_repo.update_settings(payload).await
    }

    // ---
    // Tarefas
    // ---

    pub async fn list_tasks(&self, query: &TaskListQuery) -> Result<Vec<CollectionTask>, AppError> {
        self.collection_repo.list_tasks(query.status, query.assigned_user_id).await
    }

    pub async fn get_task(&self, id: Uuid) -> Result<CollectionTaskDetail, AppError> {
        let task = self
            .collection_repo
            .find_task(id)
            .await?
            .ok_or(AppError::ResourceNotFound("collection_task"))?;
        let follow_ups = self.collection_repo.list_follow_ups(id).await?;
        Ok(CollectionTaskDetail { task, follow_ups })
    }

    pub async fn create_task(
        &self,
        payload: &CreateCollectionTaskPayload,
        user_id: Uuid,
    ) -> Result<CollectionTask, AppError> {
        let assignee = check_assignee(
            self.user_repo
                .find_by_id(payload.assigned_user_id.unwrap_or(user_id))
                .await?,
        )?;

        let mut tx = self.pool.begin().await?;

        self.party_repo
            .find_customer(&mut *tx, payload.customer_id)
            .await?
            .ok_or(AppError::ResourceNotFound("customer"))?;

        // A venda travada serializa tarefas concorrentes para ela
        if let Some(sale_id) = payload.sale_id {
            let sale = self
                .sales_repo
                .lock_sale(&mut *tx, sale_id)
                .await?
                .ok_or(AppError::ResourceNotFound("sale"))?;
            let has_open_task = self.collection_repo.has_open_task_for_sale(&mut *tx, sale.id).await?;
            check_task_sale(sale.customer_id, payload.customer_id, has_open_task)?;
        }

        let settings = self.collection_repo.get_settings(&mut *tx).await?;
        let today = Utc::now().date_naive();

        let new_task = NewCollectionTask {
            customer_id: payload.customer_id,
            sale_id: payload.sale_id,
            assigned_user_id: assignee.id,
            created_by_id: user_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            amount_to_collect: payload.amount_to_collect,
            priority: payload.priority.unwrap_or(TaskPriority::Medium),
            due_date: payload.due_date.unwrap_or_else(|| default_due_date(today, &settings)),
            notes: payload.notes.as_deref(),
        };
        let task = self.collection_repo.insert_task(&mut *tx, &new_task).await?;

        tx.commit().await?;
        Ok(task)
    }

    /// Tarefa automática para o saldo em aberto de uma venda.
    /// Não cria outra se a venda já tiver tarefa aberta.
    pub async fn create_task_for_sale(
        &self,
        conn: &mut PgConnection,
        sale: &Sale,
        settings: &CollectionSettings,
        user_id: Uuid,
    ) -> Result<Option<CollectionTask>, AppError> {
        let Some(customer_id) = sale.customer_id else {
            return Ok(None);
        };
        if !settings.auto_create_tasks || sale.remaining_amount.is_zero() {
            return Ok(None);
        }
        if self.collection_repo.has_open_task_for_sale(&mut *conn, sale.id).await? {
            return Ok(None);
        }

        let title = format!("Collect balance of {}", sale.invoice_number);
        let today = Utc::now().date_naive();
        let new_task = NewCollectionTask {
            customer_id,
            sale_id: Some(sale.id),
            assigned_user_id: user_id,
            created_by_id: user_id,
            title: &title,
            description: None,
            amount_to_collect: sale.remaining_amount,
            priority: TaskPriority::for_amount(sale.remaining_amount, settings.high_priority_threshold),
            due_date: sale.due_date.unwrap_or_else(|| default_due_date(today, settings)),
            notes: None,
        };
        let task = self.collection_repo.insert_task(&mut *conn, &new_task).await?;

        tracing::info!("Tarefa de cobrança {} criada para a venda {}", task.id, sale.invoice_number);
        Ok(Some(task))
    }

    /// Registra um contato; só vale para tarefas abertas que ainda não
    /// atingiram `max_contact_attempts`.
    pub async fn add_follow_up(
        &self,
        task_id: Uuid,
        payload: &CreateFollowUpPayload,
        user_id: Uuid,
    ) -> Result<CollectionTaskDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let task = self
            .collection_repo
            .lock_task(&mut *tx, task_id)
            .await?
            .ok_or(AppError::ResourceNotFound("collection_task"))?;

        let settings = self.collection_repo.get_settings(&mut *tx).await?;
        check_follow_up(task.status, task.contact_attempts, settings.max_contact_attempts)?;

        self.collection_repo
            .insert_follow_up(&mut *tx, task_id, user_id, payload)
            .await?;

        let new_status = payload.contact_result.next_task_status(task.status);
        self.collection_repo
            .record_contact(&mut *tx, task_id, payload.contact_result, new_status)
            .await?;

        tx.commit().await?;

        self.get_task(task_id).await
    }

    // ---
    // Alertas
    // ---

    pub async fn list_alerts(&self, user_id: Uuid) -> Result<Vec<CollectionAlert>, AppError> {
        self.collection_repo.list_alerts_for_user(user_id).await
    }

    /// Varre as tarefas abertas e grava os alertas do dia (sem duplicar).
    pub async fn scan_alerts(&self) -> Result<AlertScanResult, AppError> {
        let settings = self.get_settings().await?;
        let tasks = self.collection_repo.list_open_tasks_for_alerts().await?;
        let today = Utc::now().date_naive();

        let mut alerts_created = 0;
        for task in &tasks {
            for alert_type in classify_alerts(task.due_date, task.next_follow_up_date, today, &settings) {
                let (title, message) = alert_text(alert_type, task);
                alerts_created += self
                    .collection_repo
                    .insert_alert(task, alert_type, &title, &message)
                    .await?;
            }
        }

        tracing::info!("Varredura de cobrança: {} tarefas, {} alertas novos", tasks.len(), alerts_created);
        Ok(AlertScanResult { tasks_scanned: tasks.len(), alerts_created })
    }

    pub async fn mark_alert_read(&self, id: Uuid, user_id: Uuid) -> Result<CollectionAlert, AppError> {
        self.collection_repo
            .mark_alert_read(id, user_id)
            .await?
            .ok_or(AppError::ResourceNotFound("collection_alert"))
    }

    pub async fn dismiss_alert(&self, id: Uuid, user_id: Uuid) -> Result<CollectionAlert, AppError> {
        self.collection_repo
            .dismiss_alert(id, user_id)
            .await?
            .ok_or(AppError::ResourceNotFound("collection_alert"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings(default_due_days: i32) -> CollectionSettings {
        CollectionSettings {
            alert_days_before_due: 3,
            alert_days_after_due: 1,
            auto_create_tasks: true,
            default_due_days,
            high_priority_threshold: dec!(1000),
            max_contact_attempts: 5,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn due_date_defaults_to_configured_days() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 28).unwrap();
        assert_eq!(
            default_due_date(today, &settings(7)),
            NaiveDate::from_ymd_opt(2025, 2, 4).unwrap()
        );
    }

    #[test]
    fn alert_text_mentions_the_task() {
        let task = OpenTaskForAlert {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            assigned_user_id: Uuid::new_v4(),
            title: "Collect balance of INV-20250115-0001".into(),
            priority: TaskPriority::High,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            next_follow_up_date: None,
        };
        let (title, message) = alert_text(AlertType::Overdue, &task);
        assert_eq!(title, "Overdue: Collect balance of INV-20250115-0001");
        assert!(message.contains("2025-01-20"));
    }

    #[test]
    fn task_sale_must_belong_to_the_customer() {
        let customer = Uuid::new_v4();
        assert!(check_task_sale(Some(customer), customer, false).is_ok());

        let err = check_task_sale(Some(Uuid::new_v4()), customer, false).unwrap_err();
        assert!(matches!(err, AppError::InvalidDocumentState(ref s) if s == "SALE_OF_ANOTHER_CUSTOMER"));
        // Venda de balcão (sem cliente) também não serve
        assert!(check_task_sale(None, customer, false).is_err());
    }

    #[test]
    fn sale_with_open_task_gets_no_second_one() {
        let customer = Uuid::new_v4();
        let err = check_task_sale(Some(customer), customer, true).unwrap_err();
        assert_eq!(err.code(), "INVALID_DOCUMENT_STATE");
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    }

    fn user(is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            username: "seller".into(),
            email: "seller@vayon.local".into(),
            password_hash: String::new(),
            full_name: "Seller".into(),
            role: crate::models::auth::Role::Seller,
            is_active,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assignee_must_exist_and_be_active() {
        assert!(check_assignee(Some(user(true))).is_ok());
        assert!(matches!(check_assignee(None), Err(AppError::ResourceNotFound("user"))));
        assert!(matches!(
            check_assignee(Some(user(false))),
            Err(AppError::InvalidDocumentState(ref s)) if s == "ASSIGNEE_INACTIVE"
        ));
    }

    #[test]
    fn follow_ups_stop_at_the_attempt_limit() {
        assert!(check_follow_up(TaskStatus::New, 0, 5).is_ok());
        assert!(check_follow_up(TaskStatus::InProgress, 4, 5).is_ok());
        assert!(matches!(
            check_follow_up(TaskStatus::InProgress, 5, 5),
            Err(AppError::InvalidDocumentState(ref s)) if s == "MAX_CONTACT_ATTEMPTS"
        ));
        assert!(matches!(
            check_follow_up(TaskStatus::Completed, 0, 5),
            Err(AppError::InvalidDocumentState(ref s)) if s == "COMPLETED"
        ));
    }
}
