// src/db/party_repo.rs
// Clientes, fornecedores e pagamentos de clientes

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::parties::{Customer, CustomerPayload, CustomerPayment, Supplier, SupplierPayload, contains_pattern, SEARCH_LIMIT},
};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, city, governorate, notes, \
                                is_active, created_by, created_at, updated_at";

const SUPPLIER_COLUMNS: &str = "id, name, phone, email, address, contact_person, payment_terms, \
                                notes, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct PartyRepository {
    pool: PgPool,
}

impl PartyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // CLIENTES
    // ---

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active ORDER BY name ASC");
        Ok(sqlx::query_as::<_, Customer>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn search_customers(&self, term: &str) -> Result<Vec<Customer>, AppError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE is_active AND (name ILIKE $1 ESCAPE '\\' OR phone ILIKE $1 ESCAPE '\\')
             ORDER BY name ASC
             LIMIT $2"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(contains_pattern(term))
            .bind(SEARCH_LIMIT)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn find_customer<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        Ok(sqlx::query_as::<_, Customer>(&sql).bind(id).fetch_optional(executor).await?)
    }

    // Usado pela venda: mesmo nome + mesmo telefone (ou ambos sem telefone)
    pub async fn find_customer_by_name_phone<'e, E>(
        &self,
        executor: E,
        name: &str,
        phone: Option<&str>,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers
             WHERE is_active AND name = $1 AND phone IS NOT DISTINCT FROM $2
             ORDER BY created_at ASC
             LIMIT 1"
        );
        Ok(sqlx::query_as::<_, Customer>(&sql)
            .bind(name)
            .bind(phone)
            .fetch_optional(executor)
            .await?)
    }

    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        payload: &CustomerPayload,
        created_by: Uuid,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO customers (name, phone, email, address, city, governorate, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(&payload.name)
            .bind(payload.phone.as_deref())
            .bind(payload.email.as_deref())
            .bind(payload.address.as_deref())
            .bind(payload.city.as_deref())
            .bind(payload.governorate.as_deref())
            .bind(payload.notes.as_deref())
            .bind(created_by)
            .fetch_one(executor)
            .await?;
        Ok(customer)
    }

    pub async fn update_customer(&self, id: Uuid, payload: &CustomerPayload) -> Result<Customer, AppError> {
        let sql = format!(
            "UPDATE customers SET
                name = $2, phone = $3, email = $4, address = $5,
                city = $6, governorate = $7, notes = $8, updated_at = NOW()
             WHERE id = $1
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(&payload.name)
            .bind(payload.phone.as_deref())
            .bind(payload.email.as_deref())
            .bind(payload.address.as_deref())
            .bind(payload.city.as_deref())
            .bind(payload.governorate.as_deref())
            .bind(payload.notes.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ResourceNotFound("customer"))
    }

    pub async fn deactivate_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        let sql = format!(
            "UPDATE customers SET is_active = FALSE, updated_at = NOW() WHERE id = $1
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ResourceNotFound("customer"))
    }

    pub async fn insert_customer_payment<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        sale_id: Option<Uuid>,
        user_id: Uuid,
        amount: Decimal,
        payment_method: &str,
        reference_number: Option<&str>,
        notes: Option<&str>,
    ) -> Result<CustomerPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, CustomerPayment>(
            "INSERT INTO customer_payments
                (customer_id, sale_id, user_id, amount, payment_method, reference_number, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, customer_id, sale_id, user_id, amount, payment_method,
                       reference_number, notes, payment_date",
        )
        .bind(customer_id)
        .bind(sale_id)
        .bind(user_id)
        .bind(amount)
        .bind(payment_method)
        .bind(reference_number)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(payment)
    }

    pub async fn list_customer_payments(&self, customer_id: Uuid) -> Result<Vec<CustomerPayment>, AppError> {
        let payments = sqlx::query_as::<_, CustomerPayment>(
            "SELECT id, customer_id, sale_id, user_id, amount, payment_method,
                    reference_number, notes, payment_date
             FROM customer_payments
             WHERE customer_id = $1
             ORDER BY payment_date DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    // ---
    // FORNECEDORES
    // ---

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE is_active ORDER BY name ASC");
        Ok(sqlx::query_as::<_, Supplier>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn find_supplier<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1");
        Ok(sqlx::query_as::<_, Supplier>(&sql).bind(id).fetch_optional(executor).await?)
    }

    pub async fn create_supplier(&self, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        let sql = format!(
            "INSERT INTO suppliers (name, phone, email, address, contact_person, payment_terms, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SUPPLIER_COLUMNS}"
        );
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&payload.name)
            .bind(payload.phone.as_deref())
            .bind(payload.email.as_deref())
            .bind(payload.address.as_deref())
            .bind(payload.contact_person.as_deref())
            .bind(payload.payment_terms.as_deref())
            .bind(payload.notes.as_deref())
            .fetch_one(&self.pool)
            .await?;
        Ok(supplier)
    }

    pub async fn update_supplier(&self, id: Uuid, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        let sql = format!(
            "UPDATE suppliers SET
                name = $2, phone = $3, email = $4, address = $5,
                contact_person = $6, payment_terms = $7, notes = $8, updated_at = NOW()
             WHERE id = $1
             RETURNING {SUPPLIER_COLUMNS}"
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(&payload.name)
            .bind(payload.phone.as_deref())
            .bind(payload.email.as_deref())
            .bind(payload.address.as_deref())
            .bind(payload.contact_person.as_deref())
            .bind(payload.payment_terms.as_deref())
            .bind(payload.notes.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ResourceNotFound("supplier"))
    }

    pub async fn deactivate_supplier(&self, id: Uuid) -> Result<Supplier, AppError> {
        let sql = format!(
            "UPDATE suppliers SET is_active = FALSE, updated_at = NOW() WHERE id = $1
             RETURNING {SUPPLIER_COLUMNS}"
        );
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ResourceNotFound("supplier"))
    }
}
