pub mod error;
pub mod i18n;
pub mod validation;
