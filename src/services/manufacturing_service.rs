// src/services/manufacturing_service.rs

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        manufacturing_repo::NewManufacturingOrder, InventoryRepository, ManufacturingRepository, SequenceRepository,
    },
    models::{
        inventory::{Product, StockDirection, StockMovementReason, StockMovementRequest},
        manufacturing::{
            line_cost, next_quality_rating, order_costs, CreateFactoryPayload, CreateManufacturingOrderPayload,
            Factory, FinishedProductLine, ManufacturingOrderDetail, ManufacturingOrder, ManufacturingStatus,
            QualityGrade, ReceiveFinishedLinePayload, ReceiveManufacturingPayload,
        },
        parties::search_term,
    },
    services::{
        inventory_service::{sort_for_locking, InventoryService},
        numbering::{next_number, DocumentKind},
    },
};

const REFERENCE_TYPE: &str = "MANUFACTURING";

/// Uma linha de produto pronto a registrar no recebimento.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedReceipt<'a> {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub grade: QualityGrade,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub notes: Option<&'a str>,
}

/// Casa as linhas enviadas com as da ordem. Cada linha aparece no máximo uma vez.
pub fn plan_finished_receipt<'a>(
    lines: &[FinishedProductLine],
    items: &'a [ReceiveFinishedLinePayload],
) -> Result<Vec<FinishedReceipt<'a>>, AppError> {
    let mut seen = HashSet::with_capacity(items.len());
    let mut plan = Vec::with_capacity(items.len());

    for item in items {
        if !seen.insert(item.finished_product_id) {
            return Err(AppError::InvalidDocumentState("DUPLICATE_LINE".into()));
        }
        let line = lines
            .iter()
            .find(|l| l.id == item.finished_product_id)
            .ok_or(AppError::ResourceNotFound("manufacturing_line"))?;

        plan.push(FinishedReceipt {
            line_id: line.id,
            product_id: line.product_id,
            quantity: item.quantity_received,
            grade: item.quality_grade.unwrap_or(QualityGrade::A),
            unit_cost: line.unit_cost,
            total_cost: line_cost(item.quantity_received, line.unit_cost),
            notes: item.notes.as_deref(),
        });
    }
    Ok(plan)
}

/// (linhas com problema de qualidade, quantidade total recebida)
pub fn receipt_quality(plan: &[FinishedReceipt<'_>]) -> (usize, Decimal) {
    let issues = plan.iter().filter(|r| r.grade.is_issue()).count();
    let received = plan.iter().map(|r| r.quantity).sum();
    (issues, received)
}

/// Produto de estoque ativo; serviço não vai para a fábrica.
fn check_stock_product(product: Option<Product>) -> Result<Product, AppError> {
    let product = product
        .filter(|p| p.is_active)
        .ok_or(AppError::ResourceNotFound("product"))?;
    if product.is_service {
        return Err(AppError::InvalidDocumentState("SERVICE_PRODUCT".into()));
    }
    Ok(product)
}

#[derive(Clone)]
pub struct ManufacturingService {
    manufacturing_repo: ManufacturingRepository,
    inventory_repo: InventoryRepository,
    sequence_repo: SequenceRepository,
    inventory_service: InventoryService,
    pool: PgPool,
}

impl ManufacturingService {
    pub fn new(
        manufacturing_repo: ManufacturingRepository,
        inventory_repo: InventoryRepository,
        sequence_repo: SequenceRepository,
        inventory_service: InventoryService,
        pool: PgPool,
    ) -> Self {
        Self {
            manufacturing_repo,
            inventory_repo,
            sequence_repo,
            inventory_service,
            pool,
        }
    }

    // ---
    // Fábricas
    // ---

    pub async fn list_factories(&self, search: Option<&str>) -> Result<Vec<Factory>, AppError> {
        self.manufacturing_repo
            .list_factories(search.and_then(search_term))
            .await
    }

    pub async fn create_factory(&self, payload: &CreateFactoryPayload, user_id: Uuid) -> Result<Factory, AppError> {
        let factory = self.manufacturing_repo.create_factory(payload, user_id).await?;
        tracing::info!("🏭 Fábrica {} cadastrada", factory.name);
        Ok(factory)
    }

    // ---
    // Ordens
    // ---

    pub async fn list_orders(
        &self,
        search: Option<&str>,
        status: Option<ManufacturingStatus>,
    ) -> Result<Vec<ManufacturingOrder>, AppError> {
        self.manufacturing_repo
            .list_orders(search.and_then(search_term), status)
            .await
    }

    pub async fn get_order(&self, id: Uuid) -> Result<ManufacturingOrderDetail, AppError> {
        let mut conn = self.pool.acquire().await?;
        let order = self
            .manufacturing_repo
            .find_order(&mut *conn, id)
            .await?
            .ok_or(AppError::ResourceNotFound("manufacturing_order"))?;
        self.detail(&mut conn, order).await
    }

    async fn detail(
        &self,
        conn: &mut PgConnection,
        order: ManufacturingOrder,
    ) -> Result<ManufacturingOrderDetail, AppError> {
        let raw_materials = self.manufacturing_repo.list_raw_materials(&mut *conn, order.id).await?;
        let finished_products = self
            .manufacturing_repo
            .list_finished_products(&mut *conn, order.id)
            .await?;
        Ok(ManufacturingOrderDetail { order, raw_materials, finished_products })
    }

    /// Abre a ordem já em produção: a matéria-prima sai do estoque ao custo atual.
    pub async fn create_order(
        &self,
        payload: &CreateManufacturingOrderPayload,
        user_id: Uuid,
    ) -> Result<ManufacturingOrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        self.manufacturing_repo
            .lock_factory(&mut *tx, payload.factory_id)
            .await?
            .filter(|f| f.is_active)
            .ok_or(AppError::ResourceNotFound("factory"))?;

        let mut raw_lines = Vec::with_capacity(payload.raw_materials.len());
        for line in &payload.raw_materials {
            let product = check_stock_product(self.inventory_repo.find_product(&mut *tx, line.product_id).await?)?;
            let total_cost = line_cost(line.quantity, product.cost_price);
            raw_lines.push((line, product.cost_price, total_cost));
        }

        let mut finished_lines = Vec::with_capacity(payload.finished_products.len());
        for line in &payload.finished_products {
            let product = check_stock_product(self.inventory_repo.find_product(&mut *tx, line.product_id).await?)?;
            finished_lines.push((line, product.cost_price));
        }

        let raw_totals: Vec<Decimal> = raw_lines.iter().map(|(_, _, total)| *total).collect();
        let (raw_materials_cost, total_cost) = order_costs(&raw_totals, payload.manufacturing_cost);

        let today = Utc::now().date_naive();
        let order_number = next_number(&self.sequence_repo, &mut tx, DocumentKind::Manufacturing, today).await?;
        let order_id = self
            .manufacturing_repo
            .insert_order(
                &mut *tx,
                &NewManufacturingOrder {
                    order_number: &order_number,
                    factory_id: payload.factory_id,
                    expected_delivery_date: payload.expected_delivery_date,
                    raw_materials_cost,
                    manufacturing_cost: payload.manufacturing_cost.round_dp(2),
                    total_cost,
                    notes: payload.notes.as_deref(),
                    created_by_id: user_id,
                },
            )
            .await?;

        let mut movements = Vec::with_capacity(raw_lines.len());
        for (line, unit_cost, total) in &raw_lines {
            self.manufacturing_repo
                .insert_raw_material(
                    &mut *tx,
                    order_id,
                    line.product_id,
                    line.quantity,
                    *unit_cost,
                    *total,
                    line.notes.as_deref(),
                )
                .await?;
            movements.push(StockMovementRequest {
                product_id: line.product_id,
                direction: StockDirection::Out,
                quantity: line.quantity,
                reason: StockMovementReason::ManufacturingOut,
                unit_cost: Some(*unit_cost),
                unit_price: None,
                reference_type: Some(REFERENCE_TYPE),
                reference_id: Some(order_id),
                notes: Some(order_number.as_str()),
            });
        }

        for (line, unit_cost) in &finished_lines {
            self.manufacturing_repo
                .insert_finished_product(
                    &mut *tx,
                    order_id,
                    line.product_id,
                    line.quantity,
                    *unit_cost,
                    line.notes.as_deref(),
                )
                .await?;
        }

        sort_for_locking(&mut movements, |m| m.product_id);
        for request in &movements {
            self.inventory_service.apply_stock_movement(&mut tx, request, user_id).await?;
        }

        let order = self
            .manufacturing_repo
            .find_order(&mut *tx, order_id)
            .await?
            .ok_or(AppError::ResourceNotFound("manufacturing_order"))?;
        let detail = self.detail(&mut tx, order).await?;
        tx.commit().await?;

        tracing::info!("🏭 Ordem {} enviada: custo total {}", order_number, total_cost);
        Ok(detail)
    }

    /// Recebe o produto pronto ao custo da linha, conclui a ordem e recalcula a nota da fábrica.
    pub async fn receive_order(
        &self,
        id: Uuid,
        payload: &ReceiveManufacturingPayload,
        user_id: Uuid,
    ) -> Result<ManufacturingOrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .manufacturing_repo
            .lock_order(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("manufacturing_order"))?;
        if !order.status.accepts_receipt() {
            return Err(AppError::InvalidDocumentState(order.status.as_str().into()));
        }

        let lines = self.manufacturing_repo.list_finished_products(&mut *tx, id).await?;
        let plan = plan_finished_receipt(&lines, &payload.items)?;

        let mut movements = Vec::with_capacity(plan.len());
        for receipt in &plan {
            self.manufacturing_repo
                .record_received(
                    &mut *tx,
                    receipt.line_id,
                    receipt.quantity,
                    receipt.grade,
                    receipt.total_cost,
                    receipt.notes,
                )
                .await?;
            if receipt.quantity > Decimal::ZERO {
                movements.push(StockMovementRequest {
                    product_id: receipt.product_id,
                    direction: StockDirection::In,
                    quantity: receipt.quantity,
                    reason: StockMovementReason::ManufacturingIn,
                    unit_cost: Some(receipt.unit_cost),
                    unit_price: None,
                    reference_type: Some(REFERENCE_TYPE),
                    reference_id: Some(order.id),
                    notes: Some(order.order_number.as_str()),
                });
            }
        }

        sort_for_locking(&mut movements, |m| m.product_id);
        for request in &movements {
            self.inventory_service.apply_stock_movement(&mut tx, request, user_id).await?;
        }

        let (issues, received) = receipt_quality(&plan);
        let factory = self
            .manufacturing_repo
            .lock_factory(&mut *tx, order.factory_id)
            .await?
            .ok_or(AppError::ResourceNotFound("factory"))?;
        let rating = next_quality_rating(factory.quality_rating, issues, received);
        self.manufacturing_repo
            .set_quality_rating(&mut *tx, factory.id, rating)
            .await?;

        self.manufacturing_repo
            .set_status(&mut *tx, id, ManufacturingStatus::Completed)
            .await?;

        let order = self
            .manufacturing_repo
            .find_order(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("manufacturing_order"))?;
        let detail = self.detail(&mut tx, order).await?;
        tx.commit().await?;

        tracing::info!(
            "✅ Ordem {} recebida: {} peças, nota da fábrica {} -> {}",
            detail.order.order_number,
            received,
            factory.quality_rating,
            rating
        );
        Ok(detail)
    }

    /// Cancela a ordem e devolve ao estoque a matéria-prima enviada.
    pub async fn cancel_order(&self, id: Uuid, user_id: Uuid) -> Result<ManufacturingOrderDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = self
            .manufacturing_repo
            .lock_order(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("manufacturing_order"))?;
        if !order.status.can_cancel() {
            return Err(AppError::InvalidDocumentState(order.status.as_str().into()));
        }

        let raw_materials = self.manufacturing_repo.list_raw_materials(&mut *tx, id).await?;
        let mut movements: Vec<StockMovementRequest> = raw_materials
            .iter()
            .filter(|r| r.quantity_sent > Decimal::ZERO)
            .map(|r| StockMovementRequest {
                product_id: r.product_id,
                direction: StockDirection::In,
                quantity: r.quantity_sent,
                reason: StockMovementReason::ManufacturingReturn,
                unit_cost: Some(r.unit_cost),
                unit_price: None,
                reference_type: Some(REFERENCE_TYPE),
                reference_id: Some(order.id),
                notes: Some(order.order_number.as_str()),
            })
            .collect();

        sort_for_locking(&mut movements, |m| m.product_id);
        for request in &movements {
            self.inventory_service.apply_stock_movement(&mut tx, request, user_id).await?;
        }

        self.manufacturing_repo
            .set_status(&mut *tx, id, ManufacturingStatus::Cancelled)
            .await?;

        let order = self
            .manufacturing_repo
            .find_order(&mut *tx, id)
            .await?
            .ok_or(AppError::ResourceNotFound("manufacturing_order"))?;
        let detail = self.detail(&mut tx, order).await?;
        tx.commit().await?;

        tracing::info!("Ordem {} cancelada, {} linhas devolvidas", detail.order.order_number, movements.len());
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(unit_cost: Decimal) -> FinishedProductLine {
        FinishedProductLine {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            product_name: "Shirt".into(),
            quantity_expected: dec!(50),
            quantity_received: Decimal::ZERO,
            quality_grade: QualityGrade::A,
            unit_cost,
            total_cost: Decimal::ZERO,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn receive(line_id: Uuid, quantity: Decimal, grade: Option<QualityGrade>) -> ReceiveFinishedLinePayload {
        ReceiveFinishedLinePayload {
            finished_product_id: line_id,
            quantity_received: quantity,
            quality_grade: grade,
            notes: None,
        }
    }

    fn product(is_active: bool, is_service: bool) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cotton".into(),
            description: None,
            sku: None,
            barcode: None,
            category_id: None,
            unit: "m".into(),
            cost_price: dec!(12.5),
            selling_price: dec!(20),
            wholesale_price: None,
            current_stock: dec!(100),
            min_stock: Decimal::ZERO,
            max_stock: Decimal::ZERO,
            brand: None,
            color: None,
            size: None,
            is_service,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn receipt_costs_each_line_at_its_unit_cost() {
        let lines = vec![line(dec!(35.50)), line(dec!(12))];
        let items = vec![
            receive(lines[0].id, dec!(40), None),
            receive(lines[1].id, dec!(0), Some(QualityGrade::B)),
        ];

        let plan = plan_finished_receipt(&lines, &items).unwrap();
        assert_eq!(plan[0].product_id, lines[0].product_id);
        assert_eq!(plan[0].grade, QualityGrade::A);
        assert_eq!(plan[0].total_cost, dec!(1420.00));
        assert_eq!(plan[1].total_cost, dec!(0));
        assert_eq!(receipt_quality(&plan), (1, dec!(40)));
    }

    #[test]
    fn receipt_rejects_foreign_and_repeated_lines() {
        let lines = vec![line(dec!(10))];

        let foreign = vec![receive(Uuid::new_v4(), dec!(1), None)];
        assert!(matches!(
            plan_finished_receipt(&lines, &foreign),
            Err(AppError::ResourceNotFound("manufacturing_line"))
        ));

        let repeated = vec![receive(lines[0].id, dec!(1), None), receive(lines[0].id, dec!(2), None)];
        assert!(matches!(
            plan_finished_receipt(&lines, &repeated),
            Err(AppError::InvalidDocumentState(state)) if state == "DUPLICATE_LINE"
        ));
    }

    #[test]
    fn only_active_stock_products_go_to_the_factory() {
        assert!(check_stock_product(Some(product(true, false))).is_ok());
        assert!(matches!(check_stock_product(None), Err(AppError::ResourceNotFound("product"))));
        assert!(matches!(
            check_stock_product(Some(product(false, false))),
            Err(AppError::ResourceNotFound("product"))
        ));
        assert!(matches!(
            check_stock_product(Some(product(true, true))),
            Err(AppError::InvalidDocumentState(state)) if state == "SERVICE_PRODUCT"
        ));
    }
}
