pub mod auth;
pub mod collections;
pub mod inventory;
pub mod manufacturing;
pub mod parties;
pub mod purchases;
pub mod rbac;
pub mod sales;
pub mod settings;
pub mod shipments;
pub mod treasury;
