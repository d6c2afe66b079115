// src/services/purchase_service.rs

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, PartyRepository, PurchaseRepository, SequenceRepository},
    models::{
        inventory::{StockDirection, StockMovementReason, StockMovementRequest},
        purchases::{
            purchase_totals, CreatePurchasePayload, Purchase, PurchaseDetail, PurchaseItem, PurchaseStatus,
            ReceiveLinePayload, ReceivePurchasePayload, SupplierPaymentPayload,
        },
        sales::line_total,
        treasury::{TreasuryEntryRequest, TreasuryKind, TreasuryTransactionType},
    },
    services::{
        inventory_service::{sort_for_locking, InventoryService},
        numbering::{next_number, DocumentKind},
        sales_service::apply_payment_amount,
        treasury_service::TreasuryService,
    },
};

/// Quanto receber de cada item. Sem lista, recebe todo o pendente.
pub fn plan_receipt(
    items: &[PurchaseItem],
    requested: Option<&[ReceiveLinePayload]>,
) -> Result<Vec<(Uuid, Decimal)>, AppError> {
    let Some(lines) = requested else {
        return Ok(items
            .iter()
            .filter(|i| i.pending_quantity() > Decimal::ZERO)
            .map(|i| (i.id, i.pending_quantity()))
            .collect());
    };

    // Linhas repetidas para o mesmo item são somadas
    let mut wanted: HashMap<Uuid, Decimal> = HashMap::new();
    for line in lines {
        *wanted.entry(line.purchase_item_id).or_default() += line.quantity;
    }

    let mut plan = Vec::with_capacity(wanted.len());
    for item in items {
        let Some(quantity) = wanted.remove(&item.id) else {
            continue;
        };
        if quantity <= Decimal::ZERO {
            return Err(AppError::InvalidQuantity(quantity));
        }
        if quantity > item.pending_quantity() {
            return Err(AppError::OverReceipt {
                product: item.product_name.clone(),
                pending: item.pending_quantity(),
                received: quantity,
            });
        }
        plan.push((item.id, quantity));
    }

    // Sobrou id que não é desta compra
    if !wanted.is_empty() {
        return Err(AppError::ResourceNotFound("purchase_item"));
    }
    if plan.is_empty() {
        return Err(AppError::InvalidDocumentState("NOTHING_TO_RECEIVE".into()));
    }
    Ok(plan)
}

#[derive(Clone)]
pub struct PurchaseService {
    purchase_repo: PurchaseRepository,
    party_repo: PartyRepository,
    inventory_repo: InventoryRepository,
    sequence_repo: SequenceRepository,
    inventory_service: InventoryService,
    treasury_service: TreasuryService,
    pool: PgPool,
}

impl PurchaseService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        purchase_repo: PurchaseRepository,
        party_repo: PartyRepository,
        inventory_repo: InventoryRepository,
        sequence_repo: SequenceRepository,
        inventory_service: InventoryService,
        treasury_service: TreasuryService,
        pool: PgPool,
    ) -> Self {
        Self {
            purchase_repo,
            party_repo,
            inventory_repo,
            sequence_repo,
            inventory_service,
            treasury_service,
            pool,
        }
    }

    pub async fn list_purchases(&self) -> Result<Vec<Purchase>, AppError> {
        self.purchase_repo.list_purchases().await
    }

    pub async fn get_purchase(&self, id: Uuid) -> Result<PurchaseDetail, AppError> {
        let purchase = self
            .purchase_repo
            .find_purchase(&self.pool, id)
            .await?
            .ok_or(AppError::ResourceNotFound("purchase"))?;
        let items = self.purchase_repo.list_items(&self.pool, id).await?;
        Ok(PurchaseDetail { purchase, items })
    }

    /// Registra a compra (CONFIRMED). O estoque só entra no recebimento.
    pub async fn create_purchase(
        &self,
        payload: &CreatePurchasePayload,
        user_id: Uuid,
    ) -> Result<PurchaseDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        self.party_repo
            .find_supplier(&mut *tx, payload.supplier_id)
            .await?
            .ok_or(AppError::ResourceNotFound("supplier"))?;

        let mut lines = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let product = self
                .inventory_repo
                .find_product(&mut *tx, item.product_id)
                .await?
                .ok_or(AppError::ResourceNotFound("product"))?;
            lines.push((product.id, item.quantity, item.unit_cost, line_total(item.quantity, item.unit_cost, Decimal::ZERO)));
        }

        let line_totals: Vec<Decimal> = lines.iter().map(|(_, _, _, total)| *total).collect();
        let totals = purchase_totals(
            &line_totals,
            payload.discount_percentage,
            payload.tax_percentage,
            payload.shipping_cost,
            Decimal::ZERO,
        )?;

        let today = Utc::now().date_naive();
        let invoice_number = next_number(&self.sequence_repo, &mut tx, DocumentKind::Purchase, today).await?;
        let purchase = self
            .purchase_repo
            .insert_purchase(&mut *tx, &invoice_number, user_id, &totals, payload)
            .await?;

        for (product_id, quantity, unit_cost, total_cost) in lines {
            self.purchase_repo
                .insert_item(&mut *tx, purchase.id, product_id, quantity, unit_cost, total_cost)
                .await?;
        }

        let items = self.purchase_repo.list_items(&mut *tx, purchase.id).await?;
        tx.commit().await?;

        tracing::info!("Compra {} registrada: total {}", purchase.invoice_number, purchase.total_amount);
        Ok(PurchaseDetail { purchase, items })
    }

    /// Recebe mercadoria: entrada no estoque com custo médio e novo status.
    pub async fn receive_purchase(
        &self,
        id: Uuid,
        payload: &ReceivePurchasePayload,
        user_id: Uuid,
    ) -> Result<PurchaseDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let purchase = self
            .purchase_repo
            .lock_purchase(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("purchase"))?;

        if !purchase.status.accepts_receipt() {
            return Err(AppError::InvalidDocumentState("RECEIVED".into()));
        }

        let items = self.purchase_repo.list_items(&mut *tx, id).await?;
        let plan = plan_receipt(&items, payload.items.as_deref())?;

        let mut movements = Vec::with_capacity(plan.len());
        for (item_id, quantity) in &plan {
            let Some(item) = items.iter().find(|i| i.id == *item_id) else {
                continue;
            };

            self.purchase_repo.add_received_quantity(&mut *tx, item.id, *quantity).await?;

            movements.push(StockMovementRequest {
                product_id: item.product_id,
                direction: StockDirection::In,
                quantity: *quantity,
                reason: StockMovementReason::PurchaseReceipt,
                unit_cost: Some(item.unit_cost),
                unit_price: None,
                reference_type: Some("PURCHASE"),
                reference_id: Some(purchase.id),
                notes: payload.notes.as_deref(),
            });
        }

        sort_for_locking(&mut movements, |m| m.product_id);
        for request in &movements {
            let unit_cost = request.unit_cost.unwrap_or_default();
            self.inventory_service
                .receive_stock(&mut tx, request, unit_cost, user_id)
                .await?;
        }

        let items = self.purchase_repo.list_items(&mut *tx, id).await?;
        let pending: Decimal = items.iter().map(PurchaseItem::pending_quantity).sum();
        let purchase = self
            .purchase_repo
            .set_status(&mut *tx, id, PurchaseStatus::after_receipt(pending))
            .await?;

        tx.commit().await?;

        tracing::info!("Compra {} recebida: status {:?}", purchase.invoice_number, purchase.status);
        Ok(PurchaseDetail { purchase, items })
    }

    /// Pagamento ao fornecedor: retirada da tesouraria escolhida (padrão MAIN).
    pub async fn pay_supplier(
        &self,
        id: Uuid,
        payload: &SupplierPaymentPayload,
        user_id: Uuid,
    ) -> Result<Purchase, AppError> {
        let mut tx = self.pool.begin().await?;

        let purchase = self
            .purchase_repo
            .lock_purchase(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("purchase"))?;

        let (paid, remaining, status) =
            apply_payment_amount(purchase.total_amount, purchase.paid_amount, payload.amount)?;

        let treasury_id = match payload.treasury_id {
            Some(treasury_id) => treasury_id,
            None => self.treasury_service.resolve_kind(&mut tx, TreasuryKind::Main).await?,
        };
        let entry = TreasuryEntryRequest {
            treasury_id,
            transaction_type: TreasuryTransactionType::Withdrawal,
            amount: payload.amount,
            reference_type: Some("PURCHASE"),
            reference_id: Some(purchase.id),
            description: Some(payload.notes.as_deref().unwrap_or(&purchase.invoice_number)),
        };
        self.treasury_service.apply_entry(&mut tx, &entry, user_id).await?;

        let purchase = self
            .purchase_repo
            .apply_payment(&mut *tx, id, paid, remaining, status)
            .await?;

        tx.commit().await?;
        Ok(purchase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: Decimal, received: Decimal) -> PurchaseItem {
        PurchaseItem {
            id: Uuid::new_v4(),
            purchase_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            product_name: "Denim".into(),
            quantity,
            received_quantity: received,
            unit_cost: dec!(80),
            total_cost: quantity * dec!(80),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn without_lines_receives_everything_pending() {
        let items = vec![item(dec!(10), dec!(4)), item(dec!(5), dec!(5))];
        let plan = plan_receipt(&items, None).unwrap();
        assert_eq!(plan, vec![(items[0].id, dec!(6))]);
    }

    #[test]
    fn over_receipt_is_rejected() {
        let items = vec![item(dec!(10), dec!(4))];
        let lines = vec![ReceiveLinePayload { purchase_item_id: items[0].id, quantity: dec!(7) }];
        let err = plan_receipt(&items, Some(&lines)).unwrap_err();
        assert!(matches!(err, AppError::OverReceipt { pending, received, .. }
            if pending == dec!(6) && received == dec!(7)));
    }

    #[test]
    fn repeated_lines_are_summed() {
        let items = vec![item(dec!(10), dec!(0))];
        let lines = vec![
            ReceiveLinePayload { purchase_item_id: items[0].id, quantity: dec!(3) },
            ReceiveLinePayload { purchase_item_id: items[0].id, quantity: dec!(2) },
        ];
        assert_eq!(plan_receipt(&items, Some(&lines)).unwrap(), vec![(items[0].id, dec!(5))]);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let items = vec![item(dec!(10), dec!(0))];
        let lines = vec![ReceiveLinePayload { purchase_item_id: Uuid::new_v4(), quantity: dec!(1) }];
        assert!(matches!(
            plan_receipt(&items, Some(&lines)),
            Err(AppError::ResourceNotFound("purchase_item"))
        ));
    }

    #[test]
    fn fully_received_purchase_has_nothing_left() {
        let items = vec![item(dec!(5), dec!(5))];
        assert!(matches!(plan_receipt(&items, None), Err(AppError::InvalidDocumentState(_))));
    }
}
