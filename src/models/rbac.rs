// src/models/rbac.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::auth::Role;

// Entrada do catálogo global (registrada pela macro `permission!`)
#[derive(Debug)]
pub struct PermissionInfo {
    pub slug: &'static str,
    pub module: &'static str,
    pub description: &'static str,
}

inventory::collect!(PermissionInfo);

// O que sai na API: a permissão e quais papéis a recebem
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    #[schema(example = "sales:write")]
    pub slug: String,

    #[schema(example = "sales")]
    pub module: String,

    #[schema(example = "Create sales invoices")]
    pub description: String,

    pub granted_to: Vec<Role>,
}

impl From<&PermissionInfo> for PermissionEntry {
    fn from(info: &PermissionInfo) -> Self {
        Self {
            slug: info.slug.to_string(),
            module: info.module.to_string(),
            description: info.description.to_string(),
            granted_to: Role::ALL.into_iter().filter(|r| r.grants(info.slug)).collect(),
        }
    }
}
