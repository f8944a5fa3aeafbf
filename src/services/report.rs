use csv::Writer;

use super::business::{credit_orders, invoice};
use super::types::*;
use errors::Error;
use models::*;
use types::*;

/// Exports for accounting
pub trait ReportService {
    /// Credit invoices of a business as CSV, newest first
    fn credit_invoices_csv(&self, business_id: BusinessId) -> ServiceResult<String>;
}

pub struct ReportServiceImpl {
    ctx: ServiceContext,
    caller: Caller,
}

impl ReportServiceImpl {
    pub fn new(ctx: ServiceContext, caller: Caller) -> Self {
        Self { ctx, caller }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CsvInvoice {
    invoice_number: String,
    order_number: String,
    invoice_date: String,
    due_date: Option<String>,
    amount: ProductPrice,
    status: PaymentStatus,
}

impl From<Invoice> for CsvInvoice {
    fn from(invoice: Invoice) -> Self {
        let date_format = "%Y-%m-%d";
        Self {
            invoice_number: invoice.invoice_number,
            order_number: invoice.order_number,
            invoice_date: invoice.invoice_date.format(date_format).to_string(),
            due_date: invoice.due_date.map(|d| d.format(date_format).to_string()),
            amount: invoice.amount,
            status: invoice.status,
        }
    }
}

fn into_csv(invoices: Vec<Invoice>) -> ServiceResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    for invoice in invoices {
        writer.serialize(CsvInvoice::from(invoice))?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}

impl ReportService for ReportServiceImpl {
    fn credit_invoices_csv(&self, business_id: BusinessId) -> ServiceResult<String> {
        debug!("Exporting credit invoices of business {} for user {}", business_id, self.caller.user_id);

        if !self.caller.is_admin() && self.caller.business_id != Some(business_id) {
            return Err(format_err!("User {} cannot read invoices of business {}", self.caller.user_id, business_id)
                .context(Error::Forbidden)
                .into());
        }

        let repo_factory = self.ctx.repo_factory.clone();
        let invoices = self.ctx.db_pool.run(move |conn| {
            let orders = credit_orders(&*repo_factory, conn, business_id)?;
            Ok(orders.iter().map(invoice).collect::<Vec<_>>())
        })?;

        info!("Exported {} credit invoices of business {}", invoices.len(), business_id);
        into_csv(invoices)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use errors::kind_of;
    use repos::product::tests::product;
    use services::cart::{CartService, CartServiceImpl};
    use services::order::{OrderService, OrderServiceImpl};
    use services::testing::*;

    #[test]
    fn credit_invoices_export() {
        let ctx = context();
        let mut rice = product("RICE-25", 1000);
        rice.b2b_base_price = ProductPrice(100.0);
        rice.b2b_bulk_tiers = tiers();
        let rice = stock_product(&ctx, rice);
        let (caller, business) = approved_business(&ctx, 50000.0);

        CartServiceImpl::new(ctx.clone(), caller.clone())
            .add_item(AddToCartPayload {
                product_id: rice.id,
                quantity: Quantity(100),
            })
            .unwrap();
        let placed = OrderServiceImpl::new(ctx.clone(), caller.clone())
            .place_b2b_order(B2bOrderRequest {
                delivery_locations: vec![],
                billing_address: None,
                scheduled_date: Utc::now() + Duration::days(2),
                scheduled_time_slot: None,
                po_number: None,
                payment_method: None,
                special_instructions: None,
            })
            .unwrap();

        let csv = ReportServiceImpl::new(ctx.clone(), caller)
            .credit_invoices_csv(business.id)
            .unwrap();
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "invoice_number,order_number,invoice_date,due_date,amount,status");
        assert!(lines[1].starts_with(&format!("INV-{},{},", placed.order_number, placed.order_number)));
        assert!(lines[1].contains(",10440"));
        assert!(lines[1].ends_with(",pending"));

        let e = ReportServiceImpl::new(ctx.clone(), Caller::b2b(UserId::new(), Some(BusinessId::new())))
            .credit_invoices_csv(business.id)
            .unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::Forbidden));

        let csv = ReportServiceImpl::new(ctx, Caller::admin(UserId::new()))
            .credit_invoices_csv(business.id)
            .unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
