// src/services/numbering.rs

use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::{common::error::AppError, db::SequenceRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Sale,
    Purchase,
    Shipment,
    Manufacturing,
}

impl DocumentKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Sale => "INV",
            DocumentKind::Purchase => "PUR",
            DocumentKind::Shipment => "SH",
            DocumentKind::Manufacturing => "MFG",
        }
    }

    /// Faturas e ordens de fabricação numeram por dia, envios por mês.
    pub fn period(self, date: NaiveDate) -> String {
        match self {
            DocumentKind::Sale | DocumentKind::Purchase | DocumentKind::Manufacturing => {
                date.format("%Y%m%d").to_string()
            }
            DocumentKind::Shipment => date.format("%Y%m").to_string(),
        }
    }
}

pub fn format_number(prefix: &str, period: &str, value: i32) -> String {
    format!("{prefix}-{period}-{value:04}")
}

/// Aloca o próximo número dentro da transação do chamador.
pub async fn next_number(
    sequence_repo: &SequenceRepository,
    conn: &mut PgConnection,
    kind: DocumentKind,
    date: NaiveDate,
) -> Result<String, AppError> {
    let period = kind.period(date);
    let value = sequence_repo.next_value(conn, kind.prefix(), &period).await?;
    Ok(format_number(kind.prefix(), &period, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn invoice_numbers_use_the_day() {
        let period = DocumentKind::Sale.period(day());
        assert_eq!(format_number(DocumentKind::Sale.prefix(), &period, 1), "INV-20250115-0001");
        let period = DocumentKind::Purchase.period(day());
        assert_eq!(format_number(DocumentKind::Purchase.prefix(), &period, 42), "PUR-20250115-0042");
    }

    #[test]
    fn manufacturing_orders_use_mfg_and_the_day() {
        let kind = DocumentKind::Manufacturing;
        assert_eq!(format_number(kind.prefix(), &kind.period(day()), 3), "MFG-20250115-0003");
    }

    #[test]
    fn shipment_numbers_use_the_month() {
        let period = DocumentKind::Shipment.period(day());
        assert_eq!(format_number("SH", &period, 7), "SH-202501-0007");
    }

    #[test]
    fn consecutive_numbers_sort_in_order() {
        let period = DocumentKind::Sale.period(day());
        let numbers: Vec<String> = (1..=12).map(|n| format_number("INV", &period, n)).collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        assert_eq!(numbers, sorted);
        assert!(format_number("INV", &period, 9) < format_number("INV", &period, 10));
    }
}
