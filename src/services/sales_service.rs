// src/services/sales_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::{
        error::AppError,
        validation::{exceeds_scale, MONEY_SCALE},
    },
    db::{sales_repo::NewSaleItem, InventoryRepository, PartyRepository, SalesRepository, SequenceRepository},
    models::{
        inventory::{StockDirection, StockMovementReason, StockMovementRequest},
        parties::{CreateCustomerPaymentPayload, CustomerPayload, CustomerPayment},
        sales::{line_total, CreateSalePayload, InvoiceTotals, PaymentStatus, Sale, SaleDetail, SaleListQuery},
        treasury::{TreasuryEntryRequest, TreasuryKind, TreasuryTransactionType},
    },
    services::{
        collection_service::{default_due_date, CollectionService},
        inventory_service::{sort_for_locking, InventoryService},
        numbering::{next_number, DocumentKind},
        treasury_service::TreasuryService,
    },
};

// Venda a prazo sem cliente identificado
fn customer_required() -> AppError {
    let mut errors = ValidationErrors::new();
    errors.add("customerId", ValidationError::new("customer_required"));
    AppError::ValidationError(errors)
}

/// Novo pago/restante/status depois de um recebimento. Recusa pagar além do saldo
/// e frações de centavo.
pub fn apply_payment_amount(
    total: Decimal,
    paid: Decimal,
    amount: Decimal,
) -> Result<(Decimal, Decimal, PaymentStatus), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidQuantity(amount));
    }
    if exceeds_scale(&amount, MONEY_SCALE) {
        return Err(AppError::PrecisionExceeded { value: amount, scale: MONEY_SCALE });
    }
    let remaining = total - paid;
    if amount > remaining {
        return Err(AppError::Overpayment { remaining });
    }
    let paid = paid + amount;
    Ok((paid, total - paid, PaymentStatus::derive(total, paid)))
}

// Linha resolvida contra o cadastro do produto
struct ResolvedLine<'a> {
    item: NewSaleItem<'a>,
    is_service: bool,
}

#[derive(Clone)]
pub struct SalesService {
    sales_repo: SalesRepository,
    party_repo: PartyRepository,
    inventory_repo: InventoryRepository,
    sequence_repo: SequenceRepository,
    inventory_service: InventoryService,
    treasury_service: TreasuryService,
    collection_service: CollectionService,
    pool: PgPool,
}

impl SalesService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sales_repo: SalesRepository,
        party_repo: PartyRepository,
        inventory_repo: InventoryRepository,
        sequence_repo: SequenceRepository,
        inventory_service: InventoryService,
        treasury_service: TreasuryService,
        collection_service: CollectionService,
        pool: PgPool,
    ) -> Self {
        Self {
            sales_repo,
            party_repo,
            inventory_repo,
            sequence_repo,
            inventory_service,
            treasury_service,
            collection_service,
            pool,
        }
    }

    pub async fn list_sales(&self, query: &SaleListQuery) -> Result<Vec<Sale>, AppError> {
        self.sales_repo.list_sales(query.payment_status, query.customer_id).await
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<SaleDetail, AppError> {
        let sale = self
            .sales_repo
            .find_sale(&self.pool, id)
            .await?
            .ok_or(AppError::ResourceNotFound("sale"))?;
        let items = self.sales_repo.list_items(&self.pool, id).await?;
        Ok(SaleDetail { sale, items })
    }

    // Cliente informado por id, ou procurado/cadastrado por nome + telefone
    async fn resolve_customer(
        &self,
        conn: &mut PgConnection,
        payload: &CreateSalePayload,
        user_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        if let Some(id) = payload.customer_id {
            let customer = self
                .party_repo
                .find_customer(&mut *conn, id)
                .await?
                .ok_or(AppError::ResourceNotFound("customer"))?;
            return Ok(Some(customer.id));
        }

        let Some(name) = payload.customer_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            return Ok(None);
        };
        let phone = payload.customer_phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

        if let Some(existing) = self
            .party_repo
            .find_customer_by_name_phone(&mut *conn, name, phone)
            .await?
        {
            return Ok(Some(existing.id));
        }

        let new_customer = CustomerPayload {
            name: name.to_string(),
            phone: phone.map(str::to_string),
            email: None,
            address: payload.shipping_address.clone(),
            city: payload.shipping_city.clone(),
            governorate: payload.shipping_governorate.clone(),
            notes: None,
        };
        let customer = self.party_repo.create_customer(&mut *conn, &new_customer, user_id).await?;
        tracing::info!("Cliente {} cadastrado pela venda", customer.id);
        Ok(Some(customer.id))
    }

    /// Cria a venda inteira numa transação: cliente, itens, baixa de estoque,
    /// entrada no caixa e, se ficar saldo, a tarefa de cobrança.
    pub async fn create_sale(&self, payload: &CreateSalePayload, user_id: Uuid) -> Result<SaleDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer_id = self.resolve_customer(&mut tx, payload, user_id).await?;

        // 1. Resolve as linhas (preço padrão e custo vêm do produto)
        let mut lines = Vec::with_capacity(payload.items.len());
        for item in &payload.items {
            let product = self
                .inventory_repo
                .find_product(&mut *tx, item.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or(AppError::ResourceNotFound("product"))?;

            let unit_price = item.unit_price.unwrap_or(product.selling_price);
            let total_price = line_total(item.quantity, unit_price, item.discount_amount);
            if total_price.is_sign_negative() && !total_price.is_zero() {
                return Err(AppError::InvalidDocumentState("NEGATIVE_LINE".into()));
            }

            lines.push(ResolvedLine {
                item: NewSaleItem {
                    product_id: product.id,
                    quantity: item.quantity,
                    unit_price,
                    discount_amount: item.discount_amount,
                    total_price,
                    cost_price: product.cost_price,
                    notes: item.notes.as_deref(),
                },
                is_service: product.is_service,
            });
        }

        // 2. Totais
        let line_totals: Vec<Decimal> = lines.iter().map(|l| l.item.total_price).collect();
        let totals = InvoiceTotals::compute(
            &line_totals,
            payload.discount_amount,
            payload.tax_amount,
            payload.shipping_cost,
            payload.paid_amount,
        )?;
        if totals.remaining_amount > Decimal::ZERO && customer_id.is_none() {
            return Err(customer_required());
        }

        let settings = self.collection_service.settings_in(&mut tx).await?;
        let today = Utc::now().date_naive();
        let due_date = match payload.due_date {
            Some(date) => Some(date),
            None if totals.remaining_amount > Decimal::ZERO => Some(default_due_date(today, &settings)),
            None => None,
        };

        // 3. Cabeçalho e itens
        let invoice_number = next_number(&self.sequence_repo, &mut tx, DocumentKind::Sale, today).await?;
        let sale = self
            .sales_repo
            .insert_sale(&mut *tx, &invoice_number, customer_id, user_id, due_date, &totals, payload)
            .await?;

        for line in &lines {
            self.sales_repo.insert_item(&mut *tx, sale.id, &line.item).await?;
        }

        // 4. Baixa de estoque (serviços não têm estoque), travando na ordem dos produtos
        let mut movements: Vec<StockMovementRequest> = lines
            .iter()
            .filter(|line| !line.is_service)
            .map(|line| StockMovementRequest {
                product_id: line.item.product_id,
                direction: StockDirection::Out,
                quantity: line.item.quantity,
                reason: StockMovementReason::Sale,
                unit_cost: Some(line.item.cost_price),
                unit_price: Some(line.item.unit_price),
                reference_type: Some("SALE"),
                reference_id: Some(sale.id),
                notes: Some(&invoice_number),
            })
            .collect();
        sort_for_locking(&mut movements, |m| m.product_id);
        for request in &movements {
            self.inventory_service.apply_stock_movement(&mut tx, request, user_id).await?;
        }

        // 5. Entrada no caixa principal
        if totals.paid_amount > Decimal::ZERO {
            let treasury_id = self.treasury_service.resolve_kind(&mut tx, TreasuryKind::Main).await?;
            let entry = TreasuryEntryRequest {
                treasury_id,
                transaction_type: TreasuryTransactionType::Deposit,
                amount: totals.paid_amount,
                reference_type: Some("SALE"),
                reference_id: Some(sale.id),
                description: Some(&invoice_number),
            };
            self.treasury_service.apply_entry(&mut tx, &entry, user_id).await?;
        }

        // 6. Cobrança automática do saldo
        self.collection_service
            .create_task_for_sale(&mut tx, &sale, &settings, user_id)
            .await?;

        let items = self.sales_repo.list_items(&mut *tx, sale.id).await?;
        tx.commit().await?;

        tracing::info!(
            "🧾 Venda {} criada: total {}, pago {}",
            sale.invoice_number,
            sale.total_amount,
            sale.paid_amount
        );

        Ok(SaleDetail { sale, items })
    }

    /// Pagamento de cliente, opcionalmente abatendo uma venda.
    pub async fn record_customer_payment(
        &self,
        customer_id: Uuid,
        payload: &CreateCustomerPaymentPayload,
        user_id: Uuid,
    ) -> Result<CustomerPayment, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self
            .party_repo
            .find_customer(&mut *tx, customer_id)
            .await?
            .ok_or(AppError::ResourceNotFound("customer"))?;

        if let Some(sale_id) = payload.sale_id {
            let sale = self
                .sales_repo
                .lock_sale(&mut *tx, sale_id)
                .await?
                .ok_or(AppError::ResourceNotFound("sale"))?;

            if sale.customer_id != Some(customer.id) {
                return Err(AppError::InvalidDocumentState("SALE_OF_ANOTHER_CUSTOMER".into()));
            }

            let (paid, remaining, status) =
                apply_payment_amount(sale.total_amount, sale.paid_amount, payload.amount)?;
            self.sales_repo
                .apply_payment(&mut *tx, sale.id, paid, remaining, status)
                .await?;
        }

        let payment = self
            .party_repo
            .insert_customer_payment(
                &mut *tx,
                customer.id,
                payload.sale_id,
                user_id,
                payload.amount,
                &payload.payment_method,
                payload.reference_number.as_deref(),
                payload.notes.as_deref(),
            )
            .await?;

        let treasury_id = self.treasury_service.resolve_kind(&mut tx, TreasuryKind::Main).await?;
        let description = format!("Payment from {}", customer.name);
        let entry = TreasuryEntryRequest {
            treasury_id,
            transaction_type: TreasuryTransactionType::Deposit,
            amount: payload.amount,
            reference_type: Some("CUSTOMER_PAYMENT"),
            reference_id: Some(payment.id),
            description: Some(&description),
        };
        self.treasury_service.apply_entry(&mut tx, &entry, user_id).await?;

        tx.commit().await?;
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn partial_then_full_payment() {
        let (paid, remaining, status) = apply_payment_amount(dec!(500), dec!(100), dec!(150)).unwrap();
        assert_eq!((paid, remaining, status), (dec!(250), dec!(250), PaymentStatus::Partial));

        let (paid, remaining, status) = apply_payment_amount(dec!(500), paid, remaining).unwrap();
        assert_eq!((paid, remaining, status), (dec!(500), dec!(0), PaymentStatus::Paid));
    }

    #[test]
    fn payment_above_balance_is_rejected() {
        let err = apply_payment_amount(dec!(500), dec!(450), dec!(60)).unwrap_err();
        assert!(matches!(err, AppError::Overpayment { remaining } if remaining == dec!(50)));
    }

    #[test]
    fn sub_cent_payment_is_rejected() {
        // 10.005 em 100.00 deixaria restante 89.995, que a coluna arredonda e o CHECK recusa
        let err = apply_payment_amount(dec!(100.00), dec!(0), dec!(10.005)).unwrap_err();
        assert!(matches!(err, AppError::PrecisionExceeded { scale: 2, .. }));

        let (paid, remaining, status) = apply_payment_amount(dec!(100.00), dec!(0), dec!(10.010)).unwrap();
        assert_eq!((paid, remaining, status), (dec!(10.01), dec!(89.99), PaymentStatus::Partial));
    }

    #[test]
    fn missing_customer_is_a_field_error() {
        let AppError::ValidationError(errors) = customer_required() else {
            panic!("esperava erro de validação");
        };
        assert!(errors.field_errors().contains_key("customerId"));
    }
}
