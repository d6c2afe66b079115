// src/services/document_service.rs

use std::path::{Path, PathBuf};

use genpdf::{elements, fonts::FontFamily, fonts::FontData, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::{parties::Customer, sales::SaleDetail, settings::BusinessSettings},
    services::{party_service::PartyService, sales_service::SalesService},
};

/// Carrega a família "Roboto" da pasta de fontes.
pub fn load_fonts(dir: &Path) -> Result<FontFamily<FontData>, AppError> {
    genpdf::fonts::from_files(dir, "Roboto", None)
        .map_err(|e| AppError::DocumentRender(format!("fonte não encontrada em {}: {e}", dir.display())))
}

fn money(value: Decimal, currency: &str) -> String {
    format!("{currency} {:.2}", value)
}

fn render_err(e: impl std::fmt::Display) -> AppError {
    AppError::DocumentRender(e.to_string())
}

#[derive(Clone)]
pub struct DocumentService {
    sales_service: SalesService,
    party_service: PartyService,
    settings_repo: SettingsRepository,
    fonts_dir: PathBuf,
}

impl DocumentService {
    pub fn new(
        sales_service: SalesService,
        party_service: PartyService,
        settings_repo: SettingsRepository,
        fonts_dir: PathBuf,
    ) -> Self {
        Self {
            sales_service,
            party_service,
            settings_repo,
            fonts_dir,
        }
    }

    /// Fatura de venda em PDF, com QR code do número da fatura.
    pub async fn sale_invoice_pdf(&self, sale_id: Uuid) -> Result<Vec<u8>, AppError> {
        // 1. Dados
        let detail = self.sales_service.get_sale(sale_id).await?;
        let settings = self.settings_repo.get_settings().await?;
        let customer = match detail.sale.customer_id {
            Some(id) => Some(self.party_service.get_customer(id).await?),
            None => None,
        };

        // 2. Renderização (CPU) fora do runtime async
        let fonts_dir = self.fonts_dir.clone();
        let pdf = tokio::task::spawn_blocking(move || {
            render_invoice(&fonts_dir, &detail, &settings, customer.as_ref())
        })
        .await
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("Task join error: {}", e)))??;

        tracing::info!("🖨️ PDF da venda {} gerado ({} bytes)", sale_id, pdf.len());
        Ok(pdf)
    }
}

fn render_invoice(
    fonts_dir: &Path,
    detail: &SaleDetail,
    settings: &BusinessSettings,
    customer: Option<&Customer>,
) -> Result<Vec<u8>, AppError> {
    let sale = &detail.sale;
    let currency = settings.currency.as_str();

    let mut doc = genpdf::Document::new(load_fonts(fonts_dir)?);
    doc.set_title(format!("Invoice {}", sale.invoice_number));
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);

    // --- CABEÇALHO ---
    doc.push(
        elements::Paragraph::new(settings.business_name.clone())
            .styled(style::Style::new().bold().with_font_size(18)),
    );
    for line in [&settings.address, &settings.phone, &settings.email].into_iter().flatten() {
        doc.push(elements::Paragraph::new(line.clone()).styled(style::Style::new().with_font_size(9)));
    }
    if let Some(tax_number) = &settings.tax_number {
        doc.push(
            elements::Paragraph::new(format!("Tax No: {tax_number}")).styled(style::Style::new().with_font_size(9)),
        );
    }

    doc.push(elements::Break::new(1.5));

    doc.push(
        elements::Paragraph::new(format!("INVOICE {}", sale.invoice_number))
            .styled(style::Style::new().bold().with_font_size(14)),
    );
    doc.push(elements::Paragraph::new(format!("Date: {}", sale.sale_date.format("%Y-%m-%d"))));
    if let Some(due) = sale.due_date {
        doc.push(elements::Paragraph::new(format!("Due: {due}")));
    }

    match customer {
        Some(c) => {
            doc.push(elements::Paragraph::new(format!("Customer: {}", c.name)));
            if let Some(phone) = &c.phone {
                doc.push(elements::Paragraph::new(format!("Phone: {phone}")));
            }
        }
        None => doc.push(elements::Paragraph::new("Customer: Walk-in")),
    }

    doc.push(elements::Break::new(2));

    // --- ITENS ---
    // Pesos: produto (4), qtd (1), unitário (2), desconto (2), total (2)
    let mut table = elements::TableLayout::new(vec![4, 1, 2, 2, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    let bold = style::Style::new().bold();
    table
        .row()
        .element(elements::Paragraph::new("Product").styled(bold))
        .element(elements::Paragraph::new("Qty").styled(bold))
        .element(elements::Paragraph::new("Unit").styled(bold))
        .element(elements::Paragraph::new("Discount").styled(bold))
        .element(elements::Paragraph::new("Total").styled(bold))
        .push()
        .map_err(render_err)?;

    for item in &detail.items {
        table
            .row()
            .element(elements::Paragraph::new(item.product_name.clone()))
            .element(elements::Paragraph::new(format!("{}", item.quantity.normalize())))
            .element(elements::Paragraph::new(money(item.unit_price, currency)))
            .element(elements::Paragraph::new(money(item.discount_amount, currency)))
            .element(elements::Paragraph::new(money(item.total_price, currency)))
            .push()
            .map_err(render_err)?;
    }

    doc.push(table);
    doc.push(elements::Break::new(2));

    // --- TOTAIS ---
    let totals = [
        ("Subtotal", sale.subtotal),
        ("Discount", sale.discount_amount),
        ("Tax", sale.tax_amount),
        ("Shipping", sale.shipping_cost),
        ("Paid", sale.paid_amount),
        ("Remaining", sale.remaining_amount),
    ];
    for (label, value) in totals {
        let mut p = elements::Paragraph::new(format!("{label}: {}", money(value, currency)));
        p.set_alignment(genpdf::Alignment::Right);
        doc.push(p);
    }
    let mut total = elements::Paragraph::new(format!("TOTAL: {}", money(sale.total_amount, currency)));
    total.set_alignment(genpdf::Alignment::Right);
    doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

    doc.push(elements::Break::new(2));

    // --- QR CODE ---
    let code = QrCode::new(sale.invoice_number.as_bytes()).map_err(render_err)?;
    let image_buffer = code.render::<Luma<u8>>().build();
    let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
    let qr = elements::Image::from_dynamic_image(dynamic_image)
        .map_err(render_err)?
        .with_scale(genpdf::Scale::new(0.5, 0.5));
    doc.push(qr);

    let mut buffer = Vec::new();
    doc.render(&mut buffer).map_err(render_err)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn missing_fonts_is_a_render_error() {
        match load_fonts(Path::new("/nonexistent/fonts")) {
            Err(err) => assert_eq!(err.code(), "DOCUMENT_RENDER_FAILED"),
            Ok(_) => panic!("fontes não deveriam existir"),
        }
    }

    #[test]
    fn money_uses_two_decimals() {
        assert_eq!(money(dec!(1250.5), "EGP"), "EGP 1250.50");
    }
}
