// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::setup,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::change_password,
        handlers::auth::list_users,
        handlers::auth::create_user,
        handlers::auth::deactivate_user,

        // --- RBAC ---
        handlers::rbac::list_permissions,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Customers ---
        handlers::parties::list_customers,
        handlers::parties::search_customers,
        handlers::parties::create_customer,
        handlers::parties::get_customer,
        handlers::parties::update_customer,
        handlers::parties::deactivate_customer,
        handlers::parties::list_customer_payments,
        handlers::parties::record_customer_payment,

        // --- Suppliers ---
        handlers::parties::list_suppliers,
        handlers::parties::create_supplier,
        handlers::parties::get_supplier,
        handlers::parties::update_supplier,
        handlers::parties::deactivate_supplier,

        // --- INVENTORY ---
        handlers::inventory::list_categories,
        handlers::inventory::create_category,
        handlers::inventory::list_products,
        handlers::inventory::search_products,
        handlers::inventory::list_low_stock,
        handlers::inventory::create_product,
        handlers::inventory::get_product,
        handlers::inventory::update_product,
        handlers::inventory::deactivate_product,
        handlers::inventory::adjust_stock,
        handlers::inventory::list_movements,

        // --- Treasury ---
        handlers::treasury::list_treasuries,
        handlers::treasury::create_treasury,
        handlers::treasury::get_treasury,
        handlers::treasury::list_transactions,
        handlers::treasury::create_transaction,

        // --- Sales ---
        handlers::sales::list_sales,
        handlers::sales::create_sale,
        handlers::sales::get_sale,
        handlers::sales::get_sale_pdf,

        // --- Purchases ---
        handlers::purchases::list_purchases,
        handlers::purchases::create_purchase,
        handlers::purchases::get_purchase,
        handlers::purchases::receive_purchase,
        handlers::purchases::pay_supplier,

        // --- Shipments ---
        handlers::shipments::list_companies,
        handlers::shipments::create_company,
        handlers::shipments::list_shipments,
        handlers::shipments::create_shipment,
        handlers::shipments::get_shipment,
        handlers::shipments::update_shipment_status,

        // --- Collections ---
        handlers::collections::list_tasks,
        handlers::collections::create_task,
        handlers::collections::get_task,
        handlers::collections::add_follow_up,
        handlers::collections::list_alerts,
        handlers::collections::scan_alerts,
        handlers::collections::mark_alert_read,
        handlers::collections::dismiss_alert,
        handlers::collections::get_settings,
        handlers::collections::update_settings,

        // --- Manufacturing ---
        handlers::manufacturing::list_factories,
        handlers::manufacturing::create_factory,
        handlers::manufacturing::list_orders,
        handlers::manufacturing::create_order,
        handlers::manufacturing::get_order,
        handlers::manufacturing::receive_order,
        handlers::manufacturing::cancel_order,
    ),
    components(
        schemas(
            // Auth
            models::auth::Role,
            models::auth::User,
            models::auth::SetupAdminPayload,
            models::auth::LoginPayload,
            models::auth::CreateUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,

            // RBAC
            models::rbac::PermissionEntry,

            // Settings
            models::settings::BusinessSettings,
            models::settings::UpdateSettingsRequest,

            // Parties
            models::parties::Customer,
            models::parties::CustomerPayload,
            models::parties::CustomerPayment,
            models::parties::CreateCustomerPaymentPayload,
            models::parties::Supplier,
            models::parties::SupplierPayload,

            // Inventory
            models::inventory::StockDirection,
            models::inventory::StockMovementReason,
            models::inventory::AdjustmentMode,
            models::inventory::Category,
            models::inventory::CreateCategoryPayload,
            models::inventory::Product,
            models::inventory::CreateProductPayload,
            models::inventory::UpdateProductPayload,
            models::inventory::AdjustStockPayload,
            models::inventory::StockMovement,

            // Treasury
            models::treasury::TreasuryKind,
            models::treasury::TreasuryTransactionType,
            models::treasury::Treasury,
            models::treasury::TreasuryTransaction,
            models::treasury::CreateTreasuryPayload,
            models::treasury::CreateTreasuryTransactionPayload,

            // Sales
            models::sales::PaymentStatus,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleDetail,
            models::sales::SaleItemPayload,
            models::sales::CreateSalePayload,

            // Purchases
            models::purchases::PurchaseStatus,
            models::purchases::Purchase,
            models::purchases::PurchaseItem,
            models::purchases::PurchaseDetail,
            models::purchases::PurchaseItemPayload,
            models::purchases::CreatePurchasePayload,
            models::purchases::ReceiveLinePayload,
            models::purchases::ReceivePurchasePayload,
            models::purchases::SupplierPaymentPayload,

            // Shipments
            models::shipments::ShipmentStatus,
            models::shipments::CollectionStatus,
            models::shipments::ShippingCompany,
            models::shipments::CreateShippingCompanyPayload,
            models::shipments::Shipment,
            models::shipments::ShipmentStatusHistory,
            models::shipments::ShipmentDetail,
            models::shipments::CreateShipmentPayload,
            models::shipments::UpdateShipmentStatusPayload,

            // Collections
            models::collections::TaskPriority,
            models::collections::TaskStatus,
            models::collections::ContactType,
            models::collections::ContactResult,
            models::collections::AlertType,
            models::collections::CollectionSettings,
            models::collections::UpdateCollectionSettingsPayload,
            models::collections::CollectionTask,
            models::collections::CollectionFollowUp,
            models::collections::CollectionTaskDetail,
            models::collections::CreateCollectionTaskPayload,
            models::collections::CreateFollowUpPayload,
            models::collections::CollectionAlert,
            models::collections::AlertScanResult,

            // Manufacturing
            models::manufacturing::ManufacturingStatus,
            models::manufacturing::QualityGrade,
            models::manufacturing::Factory,
            models::manufacturing::CreateFactoryPayload,
            models::manufacturing::ManufacturingOrder,
            models::manufacturing::RawMaterialLine,
            models::manufacturing::FinishedProductLine,
            models::manufacturing::ManufacturingOrderDetail,
            models::manufacturing::ManufacturingLinePayload,
            models::manufacturing::CreateManufacturingOrderPayload,
            models::manufacturing::ReceiveFinishedLinePayload,
            models::manufacturing::ReceiveManufacturingPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Configuração inicial e Login"),
        (name = "Users", description = "Usuários e Perfil"),
        (name = "RBAC", description = "Catálogo de Permissões por Papel"),
        (name = "Settings", description = "Dados da Empresa"),
        (name = "Customers", description = "Clientes e Recebimentos"),
        (name = "Suppliers", description = "Fornecedores"),
        (name = "Inventory", description = "Produtos, Categorias e Movimentos de Estoque"),
        (name = "Treasury", description = "Caixas, Bancos e Lançamentos"),
        (name = "Sales", description = "Faturas de Venda"),
        (name = "Purchases", description = "Faturas de Compra, Recebimento e Pagamento"),
        (name = "Shipments", description = "Transportadoras e Envios"),
        (name = "Collections", description = "Cobrança: Tarefas, Contatos e Alertas"),
        (name = "Manufacturing", description = "Fábricas e Ordens de Fabricação")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/setup",
            "/api/customers/{id}/payments",
            "/api/inventory/products/{id}/adjust",
            "/api/sales/{id}/pdf",
            "/api/purchases/{id}/receive",
            "/api/shipments/{id}/status",
            "/api/collections/alerts/scan",
            "/api/manufacturing-orders/{id}/receive",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota ausente: {path}");
        }

        let schemes = doc.components.as_ref().map(|c| &c.security_schemes).unwrap();
        assert!(schemes.contains_key("api_jwt"));
    }
}
