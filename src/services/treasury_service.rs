// src/services/treasury_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{exceeds_scale, MONEY_SCALE},
    },
    db::TreasuryRepository,
    models::treasury::{
        CreateTreasuryPayload, CreateTreasuryTransactionPayload, Treasury, TreasuryEntryRequest,
        TreasuryKind, TreasuryTransaction, TreasuryTransactionType,
    },
};

/// Saldo depois do lançamento. Retiradas maiores que o saldo são recusadas.
pub fn next_balance(
    treasury: &str,
    before: Decimal,
    transaction_type: TreasuryTransactionType,
    amount: Decimal,
) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity(amount));
    }
    if exceeds_scale(&amount, MONEY_SCALE) {
        return Err(AppError::PrecisionExceeded { value: amount, scale: MONEY_SCALE });
    }
    match transaction_type {
        TreasuryTransactionType::Deposit => Ok(before + amount),
        TreasuryTransactionType::Withdrawal if amount > before => Err(AppError::InsufficientBalance {
            treasury: treasury.to_string(),
            available: before,
            requested: amount,
        }),
        TreasuryTransactionType::Withdrawal => Ok(before - amount),
    }
}

#[derive(Clone)]
pub struct TreasuryService {
    treasury_repo: TreasuryRepository,
    pool: PgPool,
}

impl TreasuryService {
    pub fn new(treasury_repo: TreasuryRepository, pool: PgPool) -> Self {
        Self { treasury_repo, pool }
    }

    // ---
    // Razão de tesouraria
    // ---

    /// Lança na tesouraria dentro da transação do chamador.
    pub async fn apply_entry(
        &self,
        conn: &mut PgConnection,
        request: &TreasuryEntryRequest<'_>,
        user_id: Uuid,
    ) -> Result<TreasuryTransaction, AppError> {
        let treasury = self
            .treasury_repo
            .lock_treasury(&mut *conn, request.treasury_id)
            .await?
            .ok_or(AppError::ResourceNotFound("treasury"))?;

        self.post(conn, &treasury, request, user_id).await
    }

    /// Tesouraria ativa do tipo (MAIN / SHIPPING), já travada na transação.
    pub async fn resolve_kind(&self, conn: &mut PgConnection, kind: TreasuryKind) -> Result<Uuid, AppError> {
        let treasury = self
            .treasury_repo
            .lock_treasury_by_kind(conn, kind)
            .await?
            .ok_or(AppError::ResourceNotFound("treasury"))?;
        Ok(treasury.id)
    }

    // A linha da tesouraria já está travada aqui
    async fn post(
        &self,
        conn: &mut PgConnection,
        treasury: &Treasury,
        request: &TreasuryEntryRequest<'_>,
        user_id: Uuid,
    ) -> Result<TreasuryTransaction, AppError> {
        if !treasury.is_active {
            return Err(AppError::InactiveTreasury(treasury.name.clone()));
        }

        let before = treasury.current_balance;
        let after = next_balance(&treasury.name, before, request.transaction_type, request.amount)?;

        self.treasury_repo.set_balance(&mut *conn, treasury.id, after).await?;
        let transaction = self
            .treasury_repo
            .insert_transaction(&mut *conn, request, user_id, before, after)
            .await?;

        tracing::info!(
            "💰 Tesouraria {} {:?} {} ({} -> {})",
            treasury.id,
            request.transaction_type,
            request.amount,
            before,
            after
        );

        Ok(transaction)
    }

    // ---
    // Cadastro e lançamentos manuais
    // ---

    pub async fn list_treasuries(&self) -> Result<Vec<Treasury>, AppError> {
        self.treasury_repo.list_treasuries().await
    }

    pub async fn get_treasury(&self, id: Uuid) -> Result<Treasury, AppError> {
        self.treasury_repo
            .find_treasury(id)
            .await?
            .ok_or(AppError::ResourceNotFound("treasury"))
    }

    pub async fn create_treasury(&self, payload: &CreateTreasuryPayload) -> Result<Treasury, AppError> {
        self.treasury_repo
            .create_treasury(
                &payload.name,
                payload.kind.unwrap_or(TreasuryKind::Other),
                payload.description.as_deref(),
            )
            .await
    }

    pub async fn list_transactions(&self, treasury_id: Uuid) -> Result<Vec<TreasuryTransaction>, AppError> {
        self.get_treasury(treasury_id).await?;
        self.treasury_repo.list_transactions(treasury_id).await
    }

    pub async fn create_manual_transaction(
        &self,
        treasury_id: Uuid,
        payload: &CreateTreasuryTransactionPayload,
        user_id: Uuid,
    ) -> Result<TreasuryTransaction, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = TreasuryEntryRequest {
            treasury_id,
            transaction_type: payload.transaction_type,
            amount: payload.amount,
            reference_type: Some("MANUAL"),
            reference_id: None,
            description: payload.description.as_deref(),
        };
        let transaction = self.apply_entry(&mut *tx, &request, user_id).await?;

        tx.commit().await?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deposit_increases_balance() {
        let after = next_balance("Main", dec!(100), TreasuryTransactionType::Deposit, dec!(50.25)).unwrap();
        assert_eq!(after, dec!(150.25));
    }

    #[test]
    fn withdrawal_cannot_exceed_balance() {
        let after = next_balance("Main", dec!(100), TreasuryTransactionType::Withdrawal, dec!(100)).unwrap();
        assert_eq!(after, dec!(0));

        let err = next_balance("Main", dec!(100), TreasuryTransactionType::Withdrawal, dec!(100.01)).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientBalance { available, requested, .. }
                if available == dec!(100) && requested == dec!(100.01)
        ));
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(matches!(
            next_balance("Main", dec!(10), TreasuryTransactionType::Deposit, dec!(0)),
            Err(AppError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn sub_cent_entry_is_rejected() {
        // 0.004 viraria 0.00 na coluna e quebraria o CHECK amount > 0
        assert!(matches!(
            next_balance("Main", dec!(10), TreasuryTransactionType::Deposit, dec!(0.004)),
            Err(AppError::PrecisionExceeded { scale: 2, .. })
        ));
        assert!(matches!(
            next_balance("Main", dec!(10), TreasuryTransactionType::Withdrawal, dec!(5.555)),
            Err(AppError::PrecisionExceeded { .. })
        ));
        assert_eq!(
            next_balance("Main", dec!(10), TreasuryTransactionType::Deposit, dec!(0.50)).unwrap(),
            dec!(10.50)
        );
    }
}
