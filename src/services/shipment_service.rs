// src/services/shipment_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SalesRepository, SequenceRepository, ShipmentRepository},
    models::{
        shipments::{
            collection_commission, CreateShipmentPayload, CreateShippingCompanyPayload, Shipment,
            ShipmentDetail, ShipmentListQuery, ShipmentStatus, ShippingCompany, UpdateShipmentStatusPayload,
        },
        treasury::{TreasuryEntryRequest, TreasuryKind, TreasuryTransactionType},
    },
    services::{
        numbering::{next_number, DocumentKind},
        treasury_service::TreasuryService,
    },
};

/// Valida a transição de status contra a tabela permitida.
/// Envio encerrado não aceita mais nenhuma mudança.
pub fn check_transition(from: ShipmentStatus, to: ShipmentStatus) -> Result<(), AppError> {
    if from.is_terminal() {
        return Err(AppError::InvalidDocumentState(from.as_str().to_string()));
    }
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidStatusTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

#[derive(Clone)]
pub struct ShipmentService {
    shipment_repo: ShipmentRepository,
    sales_repo: SalesRepository,
    sequence_repo: SequenceRepository,
    treasury_service: TreasuryService,
    pool: PgPool,
}

impl ShipmentService {
    pub fn new(
        shipment_repo: ShipmentRepository,
        sales_repo: SalesRepository,
        sequence_repo: SequenceRepository,
        treasury_service: TreasuryService,
        pool: PgPool,
    ) -> Self {
        Self {
            shipment_repo,
            sales_repo,
            sequence_repo,
            treasury_service,
            pool,
        }
    }

    // --- TRANSPORTADORAS ---

    pub async fn list_companies(&self) -> Result<Vec<ShippingCompany>, AppError> {
        self.shipment_repo.list_companies().await
    }

    pub async fn create_company(&self, payload: &CreateShippingCompanyPayload) -> Result<ShippingCompany, AppError> {
        self.shipment_repo.create_company(payload).await
    }

    // --- ENVIOS ---

    pub async fn list_shipments(&self, query: &ShipmentListQuery) -> Result<Vec<Shipment>, AppError> {
        self.shipment_repo.list_shipments(query.status).await
    }

    pub async fn get_shipment(&self, id: Uuid) -> Result<ShipmentDetail, AppError> {
        let shipment = self
            .shipment_repo
            .find_shipment(id)
            .await?
            .ok_or(AppError::ResourceNotFound("shipment"))?;
        let history = self.shipment_repo.list_history(id).await?;
        Ok(ShipmentDetail { shipment, history })
    }

    pub async fn create_shipment(
        &self,
        payload: &CreateShipmentPayload,
        user_id: Uuid,
    ) -> Result<ShipmentDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let commission = match payload.shipping_company_id {
            Some(company_id) => {
                let company = self
                    .shipment_repo
                    .find_company(&mut *tx, company_id)
                    .await?
                    .ok_or(AppError::ResourceNotFound("shipping_company"))?;
                collection_commission(payload.cod_amount, company.collection_commission)
            }
            None => Decimal::ZERO,
        };

        if let Some(sale_id) = payload.sale_id {
            self.sales_repo
                .find_sale(&mut *tx, sale_id)
                .await?
                .ok_or(AppError::ResourceNotFound("sale"))?;
        }

        let today = Utc::now().date_naive();
        let number = next_number(&self.sequence_repo, &mut tx, DocumentKind::Shipment, today).await?;
        let shipment = self
            .shipment_repo
            .insert_shipment(&mut *tx, &number, payload, commission)
            .await?;

        self.shipment_repo
            .insert_history(&mut *tx, shipment.id, user_id, None, shipment.status, payload.notes.as_deref())
            .await?;
        self.mirror_on_sale(&mut tx, &shipment).await?;

        tx.commit().await?;

        tracing::info!("🚚 Envio {} criado (COD {})", shipment.shipment_number, shipment.cod_amount);
        self.get_shipment(shipment.id).await
    }

    /// Move o envio pela tabela de status. A entrega com COD recolhe o valor
    /// na tesouraria SHIPPING e desconta a comissão da transportadora.
    pub async fn update_status(
        &self,
        id: Uuid,
        payload: &UpdateShipmentStatusPayload,
        user_id: Uuid,
    ) -> Result<ShipmentDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .shipment_repo
            .lock_shipment(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("shipment"))?;

        check_transition(current.status, payload.status)?;

        let mut shipment = self
            .shipment_repo
            .update_status(&mut *tx, id, payload.status, payload.tracking_number.as_deref())
            .await?;

        if shipment.status == ShipmentStatus::Delivered && shipment.cod_amount > Decimal::ZERO {
            shipment = self.collect_cod(&mut tx, &shipment, user_id).await?;
        }

        self.mirror_on_sale(&mut tx, &shipment).await?;
        self.shipment_repo
            .insert_history(
                &mut *tx,
                id,
                user_id,
                Some(current.status),
                shipment.status,
                payload.notes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🚚 Envio {}: {} -> {}",
            shipment.shipment_number,
            current.status.as_str(),
            shipment.status.as_str()
        );
        self.get_shipment(id).await
    }

    async fn collect_cod(
        &self,
        conn: &mut PgConnection,
        shipment: &Shipment,
        user_id: Uuid,
    ) -> Result<Shipment, AppError> {
        let collected = self
            .shipment_repo
            .mark_collected(&mut *conn, shipment.id, shipment.cod_amount)
            .await?;

        let treasury_id = self.treasury_service.resolve_kind(&mut *conn, TreasuryKind::Shipping).await?;
        let deposit = TreasuryEntryRequest {
            treasury_id,
            transaction_type: TreasuryTransactionType::Deposit,
            amount: shipment.cod_amount,
            reference_type: Some("SHIPMENT"),
            reference_id: Some(shipment.id),
            description: Some(&shipment.shipment_number),
        };
        self.treasury_service.apply_entry(&mut *conn, &deposit, user_id).await?;

        if shipment.collection_commission > Decimal::ZERO {
            let description = format!("Commission {}", shipment.shipment_number);
            let commission = TreasuryEntryRequest {
                treasury_id,
                transaction_type: TreasuryTransactionType::Withdrawal,
                amount: shipment.collection_commission,
                reference_type: Some("SHIPMENT"),
                reference_id: Some(shipment.id),
                description: Some(&description),
            };
            self.treasury_service.apply_entry(&mut *conn, &commission, user_id).await?;
        }

        Ok(collected)
    }

    // Status de envio da venda acompanha o do envio
    async fn mirror_on_sale(&self, conn: &mut PgConnection, shipment: &Shipment) -> Result<(), AppError> {
        if let Some(sale_id) = shipment.sale_id {
            self.sales_repo
                .set_shipping_status(&mut *conn, sale_id, shipment.status.as_str())
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_reports_both_states() {
        let err = check_transition(ShipmentStatus::Preparing, ShipmentStatus::Delivered).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidStatusTransition { ref from, ref to } if from == "PREPARING" && to == "DELIVERED"
        ));
    }

    #[test]
    fn closed_shipment_rejects_any_change() {
        for closed in [ShipmentStatus::Delivered, ShipmentStatus::Returned, ShipmentStatus::Cancelled] {
            let err = check_transition(closed, ShipmentStatus::InTransit).unwrap_err();
            assert!(matches!(err, AppError::InvalidDocumentState(ref state) if state == closed.as_str()));
        }
    }

    #[test]
    fn allowed_transition_passes() {
        assert!(check_transition(ShipmentStatus::Preparing, ShipmentStatus::PickedUp).is_ok());
    }
}
