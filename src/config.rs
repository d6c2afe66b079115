// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CollectionRepository, InventoryRepository, ManufacturingRepository, PartyRepository, PurchaseRepository,
        SalesRepository, SequenceRepository, SettingsRepository, ShipmentRepository, TreasuryRepository, UserRepository,
    },
    services::{
        auth::AuthService, collection_service::CollectionService, document_service::DocumentService,
        inventory_service::InventoryService, manufacturing_service::ManufacturingService,
        party_service::PartyService, purchase_service::PurchaseService,
        sales_service::SalesService, shipment_service::ShipmentService, treasury_service::TreasuryService,
    },
};

/// Configuração lida das variáveis de ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: SocketAddr,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    pub jwt_expiration_hours: i64,
    pub fonts_dir: PathBuf,
}

// Variável opcional com valor padrão; valor inválido é erro, não silêncio
fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{name} inválida: {raw}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            server_addr: var_or("SERVER_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            database_acquire_timeout: Duration::from_secs(var_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 3)?),
            jwt_expiration_hours: var_or("JWT_EXPIRATION_HOURS", 24)?,
            fonts_dir: var_or("FONTS_DIR", PathBuf::from("./fonts"))?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub settings_repo: SettingsRepository,
    pub party_service: PartyService,
    pub inventory_service: InventoryService,
    pub treasury_service: TreasuryService,
    pub sales_service: SalesService,
    pub purchase_service: PurchaseService,
    pub shipment_service: ShipmentService,
    pub collection_service: CollectionService,
    pub manufacturing_service: ManufacturingService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(config.database_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::with_pool(db_pool, config)
    }

    /// Monta o grafo de dependências sobre um pool já criado.
    pub fn with_pool(db_pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let party_repo = PartyRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let treasury_repo = TreasuryRepository::new(db_pool.clone());
        let sequence_repo = SequenceRepository::new();
        let sales_repo = SalesRepository::new(db_pool.clone());
        let purchase_repo = PurchaseRepository::new(db_pool.clone());
        let shipment_repo = ShipmentRepository::new(db_pool.clone());
        let collection_repo = CollectionRepository::new(db_pool.clone());
        let manufacturing_repo = ManufacturingRepository::new(db_pool.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
            db_pool.clone(),
        );
        let party_service = PartyService::new(party_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let treasury_service = TreasuryService::new(treasury_repo, db_pool.clone());
        let collection_service = CollectionService::new(
            collection_repo,
            party_repo.clone(),
            sales_repo.clone(),
            user_repo.clone(),
            db_pool.clone(),
        );

        let sales_service = SalesService::new(
            sales_repo.clone(),
            party_repo.clone(),
            inventory_repo.clone(),
            sequence_repo.clone(),
            inventory_service.clone(),
            treasury_service.clone(),
            collection_service.clone(),
            db_pool.clone(),
        );
        let manufacturing_service = ManufacturingService::new(
            manufacturing_repo,
            inventory_repo.clone(),
            sequence_repo.clone(),
            inventory_service.clone(),
            db_pool.clone(),
        );
        let purchase_service = PurchaseService::new(
            purchase_repo,
            party_repo,
            inventory_repo,
            sequence_repo.clone(),
            inventory_service.clone(),
            treasury_service.clone(),
            db_pool.clone(),
        );
        let shipment_service = ShipmentService::new(
            shipment_repo,
            sales_repo,
            sequence_repo,
            treasury_service.clone(),
            db_pool.clone(),
        );
        let document_service = DocumentService::new(
            sales_service.clone(),
            party_service.clone(),
            settings_repo.clone(),
            config.fonts_dir.clone(),
        );

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            settings_repo,
            party_service,
            inventory_service,
            treasury_service,
            sales_service,
            purchase_service,
            shipment_service,
            collection_service,
            manufacturing_service,
            document_service,
        })
    }
}
