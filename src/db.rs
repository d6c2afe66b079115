pub mod user_repo;
pub use user_repo::UserRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod party_repo;
pub use party_repo::PartyRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod treasury_repo;
pub use treasury_repo::TreasuryRepository;
pub mod sequence_repo;
pub use sequence_repo::SequenceRepository;
pub mod sales_repo;
pub use sales_repo::SalesRepository;
pub mod purchase_repo;
pub use purchase_repo::PurchaseRepository;
pub mod shipment_repo;
pub use shipment_repo::ShipmentRepository;
pub mod collection_repo;
pub use collection_repo::CollectionRepository;
pub mod manufacturing_repo;
pub use manufacturing_repo::ManufacturingRepository;
