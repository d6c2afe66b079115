// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        inventory::{
            Category, CreateCategoryPayload, CreateProductPayload, Product, StockMovement,
            StockMovementRequest, UpdateProductPayload,
        },
        parties::{contains_pattern, SEARCH_LIMIT},
    },
};

const PRODUCT_COLUMNS: &str = "id, name, description, sku, barcode, category_id, unit, cost_price, \
                               selling_price, wholesale_price, current_stock, min_stock, max_stock, \
                               brand, color, size, is_service, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, product_id, user_id, direction, reason, quantity, quantity_before, \
                                quantity_after, unit_cost, unit_price, reference_type, reference_id, \
                                notes, created_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---
    // Funções de leitura são simples e usam a pool principal.

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, parent_id, is_active, created_at
             FROM categories WHERE is_active ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active ORDER BY name ASC");
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn search_products(&self, term: &str) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_active
               AND (name ILIKE $1 ESCAPE '\\' OR sku ILIKE $1 ESCAPE '\\' OR barcode ILIKE $1 ESCAPE '\\')
             ORDER BY name ASC
             LIMIT $2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(contains_pattern(term))
            .bind(SEARCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_active AND NOT is_service AND current_stock <= min_stock
             ORDER BY current_stock ASC, name ASC"
        );
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn list_movements(&self, product_id: Uuid) -> Result<Vec<StockMovement>, AppError> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements
             WHERE product_id = $1
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, StockMovement>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?)
    }

    // ---
    // Escrita
    // ---

    pub async fn create_category(&self, payload: &CreateCategoryPayload) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description, parent_id)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, parent_id, is_active, created_at",
        )
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(payload.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(category)
    }

    // Cria com estoque zero; o estoque inicial entra como movimento
    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        payload: &CreateProductPayload,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO products (
                name, description, sku, barcode, category_id, unit, cost_price, selling_price,
                wholesale_price, min_stock, max_stock, brand, color, size, is_service
             )
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'piece'), $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(&payload.name)
            .bind(payload.description.as_deref())
            .bind(payload.sku.as_deref())
            .bind(payload.barcode.as_deref())
            .bind(payload.category_id)
            .bind(payload.unit.as_deref())
            .bind(payload.cost_price)
            .bind(payload.selling_price)
            .bind(payload.wholesale_price)
            .bind(payload.min_stock)
            .bind(payload.max_stock)
            .bind(payload.brand.as_deref())
            .bind(payload.color.as_deref())
            .bind(payload.size.as_deref())
            .bind(payload.is_service)
            .fetch_one(executor)
            .await
            .map_err(map_unique_violation)?;
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        let sql = format!(
            "UPDATE products SET
                name = $2, description = $3, sku = $4, barcode = $5, category_id = $6, unit = $7,
                selling_price = $8, wholesale_price = $9, min_stock = $10, max_stock = $11,
                brand = $12, color = $13, size = $14, updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(&payload.name)
            .bind(payload.description.as_deref())
            .bind(payload.sku.as_deref())
            .bind(payload.barcode.as_deref())
            .bind(payload.category_id)
            .bind(&payload.unit)
            .bind(payload.selling_price)
            .bind(payload.wholesale_price)
            .bind(payload.min_stock)
            .bind(payload.max_stock)
            .bind(payload.brand.as_deref())
            .bind(payload.color.as_deref())
            .bind(payload.size.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or(AppError::ResourceNotFound("product"))
    }

    pub async fn deactivate_product(&self, id: Uuid) -> Result<Product, AppError> {
        let sql = format!(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ResourceNotFound("product"))
    }

    // ---
    // Razão de estoque
    // ---

    /// Trava a linha do produto até o fim da transação.
    pub async fn lock_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn set_stock<'e, E>(&self, executor: E, id: Uuid, new_stock: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET current_stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(new_stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_cost_price<'e, E>(&self, executor: E, id: Uuid, cost_price: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET cost_price = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(cost_price.round_dp(2))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        request: &StockMovementRequest<'_>,
        user_id: Uuid,
        quantity_before: Decimal,
        quantity_after: Decimal,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO stock_movements (
                product_id, user_id, direction, reason, quantity, quantity_before, quantity_after,
                unit_cost, unit_price, reference_type, reference_id, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {MOVEMENT_COLUMNS}"
        );
        let movement = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(request.product_id)
            .bind(user_id)
            .bind(request.direction)
            .bind(request.reason)
            .bind(request.quantity)
            .bind(quantity_before)
            .bind(quantity_after)
            .bind(request.unit_cost)
            .bind(request.unit_price)
            .bind(request.reference_type)
            .bind(request.reference_id)
            .bind(request.notes)
            .fetch_one(executor)
            .await?;
        Ok(movement)
    }
}
