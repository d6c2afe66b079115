// src/services/party_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PartyRepository,
    models::parties::{search_term, Customer, CustomerPayload, CustomerPayment, Supplier, SupplierPayload},
};

#[derive(Clone)]
pub struct PartyService {
    party_repo: PartyRepository,
    pool: PgPool,
}

impl PartyService {
    pub fn new(party_repo: PartyRepository, pool: PgPool) -> Self {
        Self { party_repo, pool }
    }

    // --- CLIENTES ---

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        self.party_repo.list_customers().await
    }

    /// Autocomplete; termo curto devolve lista vazia.
    pub async fn search_customers(&self, q: &str) -> Result<Vec<Customer>, AppError> {
        match search_term(q) {
            Some(term) => self.party_repo.search_customers(term).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.party_repo
            .find_customer(&self.pool, id)
            .await?
            .ok_or(AppError::ResourceNotFound("customer"))
    }

    pub async fn create_customer(&self, payload: &CustomerPayload, user_id: Uuid) -> Result<Customer, AppError> {
        let customer = self
            .party_repo
            .create_customer(&self.pool, payload, user_id)
            .await?;
        tracing::info!("Cliente criado: {} ({})", customer.name, customer.id);
        Ok(customer)
    }

    pub async fn update_customer(&self, id: Uuid, payload: &CustomerPayload) -> Result<Customer, AppError> {
        self.party_repo.update_customer(id, payload).await
    }

    pub async fn deactivate_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.party_repo.deactivate_customer(id).await
    }

    pub async fn list_customer_payments(&self, customer_id: Uuid) -> Result<Vec<CustomerPayment>, AppError> {
        self.get_customer(customer_id).await?;
        self.party_repo.list_customer_payments(customer_id).await
    }

    // --- FORNECEDORES ---

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, AppError> {
        self.party_repo.list_suppliers().await
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<Supplier, AppError> {
        self.party_repo
            .find_supplier(&self.pool, id)
            .await?
            .ok_or(AppError::ResourceNotFound("supplier"))
    }

    pub async fn create_supplier(&self, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        self.party_repo.create_supplier(payload).await
    }

    pub async fn update_supplier(&self, id: Uuid, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        self.party_repo.update_supplier(id, payload).await
    }

    pub async fn deactivate_supplier(&self, id: Uuid) -> Result<Supplier, AppError> {
        self.party_repo.deactivate_supplier(id).await
    }
}
