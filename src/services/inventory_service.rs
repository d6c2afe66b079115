// src/services/inventory_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{exceeds_scale, QUANTITY_SCALE},
    },
    db::InventoryRepository,
    models::inventory::{
        AdjustStockPayload, Category, CreateCategoryPayload, CreateProductPayload, Product,
        StockDirection, StockMovement, StockMovementReason, StockMovementRequest,
        UpdateProductPayload,
    },
    models::parties::search_term,
};

/// Saldo depois do movimento. Saídas maiores que o saldo são recusadas,
/// assim como quantidades com mais casas do que a coluna guarda.
pub fn next_stock(
    product: &str,
    before: Decimal,
    direction: StockDirection,
    quantity: Decimal,
) -> Result<Decimal, AppError> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity(quantity));
    }
    if exceeds_scale(&quantity, QUANTITY_SCALE) {
        return Err(AppError::PrecisionExceeded { value: quantity, scale: QUANTITY_SCALE });
    }
    match direction {
        StockDirection::In => Ok(before + quantity),
        StockDirection::Out if quantity > before => Err(AppError::InsufficientStock {
            product: product.to_string(),
            available: before,
            requested: quantity,
        }),
        StockDirection::Out => Ok(before - quantity),
    }
}

// Custo médio ponderado entre o estoque atual e a entrada
pub fn calculate_new_average_cost(
    current_qty: Decimal,
    current_avg: Decimal,
    incoming_qty: Decimal,
    incoming_cost: Decimal,
) -> Decimal {
    let total_current_value = current_qty * current_avg;
    let total_incoming_value = incoming_qty * incoming_cost;
    let new_total_qty = current_qty + incoming_qty;

    if new_total_qty <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (total_current_value + total_incoming_value) / new_total_qty
}

/// Ordena as linhas pelo produto antes de movimentar: transações concorrentes
/// travam as mesmas linhas de `products` sempre na mesma ordem.
pub fn sort_for_locking<T>(lines: &mut [T], product_id: impl Fn(&T) -> Uuid) {
    lines.sort_by_key(|line| product_id(line));
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // ---
    // Razão de estoque
    // ---

    /// Aplica um movimento dentro da transação do chamador:
    /// trava o produto, valida, grava o novo saldo e o histórico.
    pub async fn apply_stock_movement(
        &self,
        conn: &mut PgConnection,
        request: &StockMovementRequest<'_>,
        user_id: Uuid,
    ) -> Result<StockMovement, AppError> {
        let product = self
            .inventory_repo
            .lock_product(&mut *conn, request.product_id)
            .await?
            .ok_or(AppError::ResourceNotFound("product"))?;

        let before = product.current_stock;
        let after = next_stock(&product.name, before, request.direction, request.quantity)?;

        self.inventory_repo.set_stock(&mut *conn, product.id, after).await?;
        let movement = self
            .inventory_repo
            .insert_movement(&mut *conn, request, user_id, before, after)
            .await?;

        tracing::info!(
            "📦 Estoque {} {:?} {} ({} -> {})",
            product.id,
            request.direction,
            request.quantity,
            before,
            after
        );

        Ok(movement)
    }

    /// Entrada de compra: atualiza o custo médio antes do movimento.
    pub async fn receive_stock(
        &self,
        conn: &mut PgConnection,
        request: &StockMovementRequest<'_>,
        unit_cost: Decimal,
        user_id: Uuid,
    ) -> Result<StockMovement, AppError> {
        let product = self
            .inventory_repo
            .lock_product(&mut *conn, request.product_id)
            .await?
            .ok_or(AppError::ResourceNotFound("product"))?;

        let new_cost = calculate_new_average_cost(
            product.current_stock,
            product.cost_price,
            request.quantity,
            unit_cost,
        );
        self.inventory_repo.set_cost_price(&mut *conn, product.id, new_cost).await?;

        self.apply_stock_movement(conn, request, user_id).await
    }

    // ---
    // Catálogo
    // ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.inventory_repo.list_categories().await
    }

    pub async fn create_category(&self, payload: &CreateCategoryPayload) -> Result<Category, AppError> {
        self.inventory_repo.create_category(payload).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_products().await
    }

    pub async fn search_products(&self, q: &str) -> Result<Vec<Product>, AppError> {
        match search_term(q) {
            Some(term) => self.inventory_repo.search_products(term).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Product>, AppError> {
        self.inventory_repo.list_low_stock().await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.inventory_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::ResourceNotFound("product"))
    }

    pub async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        self.get_product(product_id).await?;
        self.inventory_repo.list_movements(product_id).await
    }

    /// Cria o produto e, se houver estoque inicial, lança um movimento INITIAL_STOCK.
    pub async fn create_product(&self, payload: &CreateProductPayload, user_id: Uuid) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self.inventory_repo.create_product(&mut *tx, payload).await?;

        if payload.initial_stock > Decimal::ZERO && !product.is_service {
            let request = StockMovementRequest {
                product_id: product.id,
                direction: StockDirection::In,
                quantity: payload.initial_stock,
                reason: StockMovementReason::InitialStock,
                unit_cost: Some(payload.cost_price),
                unit_price: None,
                reference_type: None,
                reference_id: None,
                notes: None,
            };
            self.apply_stock_movement(&mut *tx, &request, user_id).await?;
        }

        // Relê para devolver o saldo já atualizado
        let product = self
            .inventory_repo
            .find_product(&mut *tx, product.id)
            .await?
            .ok_or(AppError::ResourceNotFound("product"))?;

        tx.commit().await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        self.inventory_repo.update_product(id, payload).await
    }

    pub async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.inventory_repo.deactivate_product(id).await
    }

    /// Ajuste manual (INCREASE / DECREASE / SET).
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        payload: &AdjustStockPayload,
        user_id: Uuid,
    ) -> Result<StockMovement, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self
            .inventory_repo
            .lock_product(&mut *tx, product_id)
            .await?
            .ok_or(AppError::ResourceNotFound("product"))?;

        if product.is_service {
            return Err(AppError::InvalidDocumentState("SERVICE_PRODUCT".into()));
        }

        let (direction, quantity) = payload
            .mode
            .to_delta(product.current_stock, payload.quantity)
            .ok_or(AppError::ZeroAdjustment)?;

        let request = StockMovementRequest {
            product_id,
            direction,
            quantity,
            reason: StockMovementReason::Adjustment,
            unit_cost: None,
            unit_price: None,
            reference_type: Some("ADJUSTMENT"),
            reference_id: None,
            notes: payload.notes.as_deref(),
        };
        let movement = self.apply_stock_movement(&mut *tx, &request, user_id).await?;

        tx.commit().await?;
        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stock_in_adds_quantity() {
        assert_eq!(next_stock("Shirt", dec!(5), StockDirection::In, dec!(2.5)).unwrap(), dec!(7.5));
    }

    #[test]
    fn stock_out_cannot_go_negative() {
        assert_eq!(next_stock("Shirt", dec!(5), StockDirection::Out, dec!(5)).unwrap(), dec!(0));

        let err = next_stock("Shirt", dec!(5), StockDirection::Out, dec!(6)).unwrap_err();
        match err {
            AppError::InsufficientStock { product, available, requested } => {
                assert_eq!(product, "Shirt");
                assert_eq!(available, dec!(5));
                assert_eq!(requested, dec!(6));
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        assert!(matches!(
            next_stock("Shirt", dec!(5), StockDirection::In, dec!(0)),
            Err(AppError::InvalidQuantity(_))
        ));
        assert!(matches!(
            next_stock("Shirt", dec!(5), StockDirection::Out, dec!(-1)),
            Err(AppError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn sub_milli_quantity_never_reaches_the_ledger() {
        // 0.0004 viraria 0.000 na coluna e quebraria o CHECK quantity > 0
        assert!(matches!(
            next_stock("Shirt", dec!(5), StockDirection::In, dec!(0.0004)),
            Err(AppError::PrecisionExceeded { scale: 3, .. })
        ));
        assert!(matches!(
            next_stock("Shirt", dec!(5), StockDirection::Out, dec!(1.2345)),
            Err(AppError::PrecisionExceeded { .. })
        ));
        assert_eq!(next_stock("Shirt", dec!(5), StockDirection::Out, dec!(1.250)).unwrap(), dec!(3.75));
    }

    #[test]
    fn movements_are_locked_in_product_order() {
        let (a, b, c) = (Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3));
        let mut lines = vec![(c, dec!(1)), (a, dec!(2)), (b, dec!(3)), (a, dec!(4))];
        sort_for_locking(&mut lines, |l| l.0);
        assert_eq!(lines, vec![(a, dec!(2)), (a, dec!(4)), (b, dec!(3)), (c, dec!(1))]);
    }

    #[test]
    fn average_cost_is_weighted_by_quantity() {
        // 10 a 20 + 30 a 40 = 1400 / 40 = 35
        assert_eq!(calculate_new_average_cost(dec!(10), dec!(20), dec!(30), dec!(40)), dec!(35));
        // Sem estoque anterior, vale o custo de entrada
        assert_eq!(calculate_new_average_cost(dec!(0), dec!(99), dec!(4), dec!(12.5)), dec!(12.5));
        assert_eq!(calculate_new_average_cost(dec!(0), dec!(10), dec!(0), dec!(10)), dec!(0));
    }
}
