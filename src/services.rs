pub mod auth;
pub mod collection_service;
pub mod document_service;
pub mod inventory_service;
pub mod manufacturing_service;
pub mod numbering;
pub mod party_service;
pub mod purchase_service;
pub mod sales_service;
pub mod shipment_service;
pub mod treasury_service;
