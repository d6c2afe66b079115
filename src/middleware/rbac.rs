// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::PermissionInfo,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
// Depende do auth_guard ter colocado o AuthenticatedUser nas extensions.
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        let required_perm = T::slug();

        if !user.0.role.grants(required_perm) {
            tracing::warn!(
                user_id = %user.0.id,
                role = ?user.0.role,
                permission = required_perm,
                "Acesso negado"
            );
            return Err(AppError::Forbidden(required_perm.to_string())
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---
// Cada permissão vira um tipo marcador e entra no catálogo global.
macro_rules! permission {
    ($name:ident, $slug:literal, $module:literal, $description:literal) => {
        pub struct $name;

        impl PermissionDef for $name {
            fn slug() -> &'static str {
                $slug
            }
        }

        inventory::submit! {
            PermissionInfo { slug: $slug, module: $module, description: $description }
        }
    };
}

permission!(PermUsersManage, "users:manage", "users", "Create and deactivate users");
permission!(PermSettingsWrite, "settings:write", "settings", "Edit business settings");

permission!(PermCustomersRead, "customers:read", "customers", "View customers");
permission!(PermCustomersWrite, "customers:write", "customers", "Create and edit customers, record payments");
permission!(PermSuppliersRead, "suppliers:read", "suppliers", "View suppliers");
permission!(PermSuppliersWrite, "suppliers:write", "suppliers", "Create and edit suppliers");

permission!(PermInventoryRead, "inventory:read", "inventory", "View products, categories and stock");
permission!(PermInventoryWrite, "inventory:write", "inventory", "Edit products and adjust stock");

permission!(PermTreasuryRead, "treasury:read", "treasury", "View treasuries and transactions");
permission!(PermTreasuryWrite, "treasury:write", "treasury", "Create treasuries and manual transactions");

permission!(PermSalesRead, "sales:read", "sales", "View sales invoices");
permission!(PermSalesWrite, "sales:write", "sales", "Create sales invoices");
permission!(PermPurchasesRead, "purchases:read", "purchases", "View purchase invoices");
permission!(PermPurchasesWrite, "purchases:write", "purchases", "Create, receive and pay purchases");

permission!(PermShipmentsRead, "shipments:read", "shipments", "View shipments and shipping companies");
permission!(PermShipmentsWrite, "shipments:write", "shipments", "Create shipments and update their status");
permission!(PermShippingCompaniesWrite, "shipping_companies:write", "shipments", "Register shipping companies");

permission!(PermCollectionsRead, "collections:read", "collections", "View collection tasks and alerts");
permission!(PermCollectionsWrite, "collections:write", "collections", "Manage collection tasks and follow-ups");
permission!(PermCollectionsSettings, "collections:settings", "collections", "Edit collection settings");

permission!(PermManufacturingRead, "manufacturing:read", "manufacturing", "View factories and manufacturing orders");
permission!(PermManufacturingWrite, "manufacturing:write", "manufacturing", "Register factories, send, receive and cancel manufacturing orders");

/// Todas as permissões registradas, ordenadas por módulo e slug.
pub fn permission_catalogue() -> Vec<&'static PermissionInfo> {
    let mut all: Vec<&'static PermissionInfo> = inventory::iter::<PermissionInfo>.into_iter().collect();
    all.sort_by_key(|p| (p.module, p.slug));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    #[test]
    fn catalogue_contains_every_declared_permission() {
        let slugs: Vec<&str> = permission_catalogue().iter().map(|p| p.slug).collect();
        assert!(slugs.contains(&PermSalesWrite::slug()));
        assert!(slugs.contains(&PermCollectionsSettings::slug()));
        let mut dedup = slugs.clone();
        dedup.dedup();
        assert_eq!(dedup.len(), slugs.len());
    }

    #[test]
    fn role_grants_only_name_catalogued_permissions() {
        use crate::models::auth::{SELLER_GRANTS, VIEWER_GRANTS};

        let slugs: Vec<&str> = permission_catalogue().iter().map(|p| p.slug).collect();
        for grant in SELLER_GRANTS.iter().chain(VIEWER_GRANTS) {
            assert!(slugs.contains(grant), "{grant} não existe no catálogo");
        }
    }

    #[test]
    fn manufacturing_is_admin_only() {
        for slug in [PermManufacturingRead::slug(), PermManufacturingWrite::slug()] {
            assert!(Role::Admin.grants(slug));
            assert!(!Role::Seller.grants(slug));
            assert!(!Role::Viewer.grants(slug));
        }
    }

    #[test]
    fn every_catalogued_permission_is_granted_to_admin() {
        for perm in permission_catalogue() {
            assert!(Role::Admin.grants(perm.slug), "{} não concedida ao ADMIN", perm.slug);
        }
    }
}
