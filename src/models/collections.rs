// src/models/collections.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_money_amount, validate_not_negative};

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Prioridade das tarefas criadas automaticamente a partir de uma venda.
    pub fn for_amount(amount: Decimal, high_priority_threshold: Decimal) -> Self {
        if amount >= high_priority_threshold {
            TaskPriority::High
        } else {
            TaskPriority::Medium
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
    Postponed,
}

impl TaskStatus {
    pub fn is_open(self) -> bool {
        !matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Call,
    Message,
    Visit,
    Whatsapp,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contact_result", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactResult {
    Answered,
    NoAnswer,
    PromisedPayment,
    PartialPayment,
    FullPayment,
    Refused,
}

impl ContactResult {
    /// Status da tarefa depois de registrar um contato com este resultado.
    pub fn next_task_status(self, current: TaskStatus) -> TaskStatus {
        match self {
            ContactResult::PromisedPayment | ContactResult::PartialPayment => TaskStatus::InProgress,
            ContactResult::FullPayment => TaskStatus::Completed,
            _ => current,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    DueSoon,
    Overdue,
    FollowUpDue,
}

// --- CONFIGURAÇÕES ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSettings {
    #[schema(example = 3)]
    pub alert_days_before_due: i32,

    #[schema(example = 1)]
    pub alert_days_after_due: i32,

    pub auto_create_tasks: bool,

    #[schema(example = 7)]
    pub default_due_days: i32,

    #[schema(example = "1000.00")]
    pub high_priority_threshold: Decimal,

    #[schema(example = 5)]
    pub max_contact_attempts: i32,

    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionSettingsPayload {
    #[validate(range(min = 0, max = 90))]
    pub alert_days_before_due: i32,

    #[validate(range(min = 0, max = 90))]
    pub alert_days_after_due: i32,

    pub auto_create_tasks: bool,

    #[validate(range(min = 1, max = 365))]
    pub default_due_days: i32,

    #[validate(custom(function = "validate_not_negative"))]
    pub high_priority_threshold: Decimal,

    #[validate(range(min = 1, max = 100))]
    pub max_contact_attempts: i32,
}

/// Quais alertas uma tarefa aberta merece hoje.
pub fn classify_alerts(
    due_date: NaiveDate,
    next_follow_up: Option<NaiveDate>,
    today: NaiveDate,
    settings: &CollectionSettings,
) -> Vec<AlertType> {
    let mut alerts = Vec::new();

    let overdue_from = due_date + Duration::days(i64::from(settings.alert_days_after_due.max(1)));
    let due_soon_from = due_date - Duration::days(i64::from(settings.alert_days_before_due.max(0)));

    if today >= overdue_from {
        alerts.push(AlertType::Overdue);
    } else if today >= due_soon_from && today <= due_date {
        alerts.push(AlertType::DueSoon);
    }

    if next_follow_up.is_some_and(|d| d <= today) {
        alerts.push(AlertType::FollowUpDue);
    }

    alerts
}

// --- TAREFAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTask {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub sale_id: Option<Uuid>,
    pub assigned_user_id: Uuid,
    pub created_by_id: Uuid,

    #[schema(example = "Collect balance of INV-20250115-0001")]
    pub title: String,

    pub description: Option<String>,
    pub amount_to_collect: Decimal,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    pub completed_at: Option<DateTime<Utc>>,
    pub contact_attempts: i32,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub last_contact_result: Option<ContactResult>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFollowUp {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub contact_type: ContactType,
    pub contact_result: ContactResult,
    pub description: String,
    pub promised_payment_date: Option<NaiveDate>,
    pub promised_amount: Option<Decimal>,
    pub next_follow_up_date: Option<NaiveDate>,
    pub next_follow_up_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTaskDetail {
    #[serde(flatten)]
    pub task: CollectionTask,
    pub follow_ups: Vec<CollectionFollowUp>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionTaskPayload {
    pub customer_id: Uuid,
    pub sale_id: Option<Uuid>,

    // Padrão: o próprio usuário
    pub assigned_user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_money_amount"))]
    pub amount_to_collect: Decimal,

    pub priority: Option<TaskPriority>,

    // Padrão: hoje + defaultDueDays
    pub due_date: Option<NaiveDate>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowUpPayload {
    pub contact_type: ContactType,
    pub contact_result: ContactResult,

    #[validate(length(min = 1, message = "required"))]
    pub description: String,

    pub promised_payment_date: Option<NaiveDate>,

    #[validate(custom(function = "validate_money_amount"))]
    pub promised_amount: Option<Decimal>,

    pub next_follow_up_date: Option<NaiveDate>,
    pub next_follow_up_notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub assigned_user_id: Option<Uuid>,
}

// --- ALERTAS ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionAlert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub title: String,
    pub message: String,
    pub priority: TaskPriority,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertScanResult {
    pub tasks_scanned: usize,
    pub alerts_created: u64,
}

// Tarefa aberta com a data do próximo retorno (último follow-up)
#[derive(Debug, Clone, FromRow)]
pub struct OpenTaskForAlert {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub assigned_user_id: Uuid,
    pub title: String,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
    pub next_follow_up_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settings() -> CollectionSettings {
        CollectionSettings {
            alert_days_before_due: 3,
            alert_days_after_due: 1,
            auto_create_tasks: true,
            default_due_days: 7,
            high_priority_threshold: dec!(1000),
            max_contact_attempts: 5,
            updated_at: Utc::now(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn auto_task_priority_uses_threshold() {
        assert_eq!(TaskPriority::for_amount(dec!(999.99), dec!(1000)), TaskPriority::Medium);
        assert_eq!(TaskPriority::for_amount(dec!(1000), dec!(1000)), TaskPriority::High);
    }

    #[test]
    fn follow_up_results_move_the_task() {
        assert_eq!(
            ContactResult::PromisedPayment.next_task_status(TaskStatus::New),
            TaskStatus::InProgress
        );
        assert_eq!(
            ContactResult::PartialPayment.next_task_status(TaskStatus::Postponed),
            TaskStatus::InProgress
        );
        assert_eq!(
            ContactResult::FullPayment.next_task_status(TaskStatus::InProgress),
            TaskStatus::Completed
        );
        assert_eq!(ContactResult::NoAnswer.next_task_status(TaskStatus::New), TaskStatus::New);
        assert_eq!(
            ContactResult::Refused.next_task_status(TaskStatus::InProgress),
            TaskStatus::InProgress
        );
    }

    #[test]
    fn alert_window_before_and_after_due_date() {
        let s = settings();
        let due = d(2025, 3, 10);
        assert!(classify_alerts(due, None, d(2025, 3, 6), &s).is_empty());
        assert_eq!(classify_alerts(due, None, d(2025, 3, 7), &s), vec![AlertType::DueSoon]);
        assert_eq!(classify_alerts(due, None, d(2025, 3, 10), &s), vec![AlertType::DueSoon]);
        assert_eq!(classify_alerts(due, None, d(2025, 3, 11), &s), vec![AlertType::Overdue]);
        assert_eq!(classify_alerts(due, None, d(2025, 4, 1), &s), vec![AlertType::Overdue]);
    }

    #[test]
    fn follow_up_alert_is_independent() {
        let s = settings();
        let alerts = classify_alerts(d(2025, 5, 1), Some(d(2025, 3, 9)), d(2025, 3, 10), &s);
        assert_eq!(alerts, vec![AlertType::FollowUpDue]);
        assert!(classify_alerts(d(2025, 5, 1), Some(d(2025, 3, 11)), d(2025, 3, 10), &s).is_empty());
    }

    #[test]
    fn closed_tasks_are_not_open() {
        assert!(TaskStatus::New.is_open());
        assert!(TaskStatus::Postponed.is_open());
        assert!(!TaskStatus::Completed.is_open());
        assert!(!TaskStatus::Cancelled.is_open());
    }
}
