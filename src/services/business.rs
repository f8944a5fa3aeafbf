use chrono::prelude::*;

use super::types::*;
use errors::{self, Error};
use models::*;
use repos::*;
use types::*;

/// Wholesale account profile, credit overview and address book
pub trait BusinessService {
    /// Files a registration for the calling user, pending review
    fn register(&self, payload: NewBusiness) -> ServiceResult<B2bBusiness>;
    fn profile(&self) -> ServiceResult<B2bBusiness>;
    /// Credit headroom, outstanding payments and the latest credit invoices
    fn credit_dashboard(&self) -> ServiceResult<CreditDashboard>;
    /// Active addresses, default first
    fn list_addresses(&self) -> ServiceResult<Vec<DeliveryAddress>>;
    fn add_address(&self, payload: NewDeliveryAddress) -> ServiceResult<DeliveryAddress>;
    fn update_address(&self, address_id: AddressId, payload: DeliveryAddressUpdate) -> ServiceResult<DeliveryAddress>;
    fn delete_address(&self, address_id: AddressId) -> ServiceResult<DeliveryAddress>;
}

pub struct BusinessServiceImpl {
    ctx: ServiceContext,
    caller: Caller,
}

const RECENT_INVOICES: usize = 10;

impl BusinessServiceImpl {
    pub fn new(ctx: ServiceContext, caller: Caller) -> Self {
        Self { ctx, caller }
    }

    fn business_id(&self) -> ServiceResult<BusinessId> {
        if self.caller.account_type != AccountType::B2b {
            return Err(format_err!("User {} is not a wholesale customer", self.caller.user_id)
                .context(Error::Forbidden)
                .into());
        }
        self.caller.business_id.ok_or_else(|| {
            format_err!("User {} has no registered business", self.caller.user_id)
                .context(Error::NotFound)
                .into()
        })
    }
}

/// Invoice for a credit order
pub fn invoice(order: &Order) -> Invoice {
    Invoice {
        invoice_number: format!("INV-{}", order.order_number),
        order_number: order.order_number.clone(),
        invoice_date: order.order_date,
        due_date: order.due_date,
        amount: order.total_amount,
        status: order.payment_status,
    }
}

/// Credit orders of a business that count against its ledger, newest first
pub fn credit_orders(repo_factory: &dyn ReposFactory, conn: RepoConnection, business_id: BusinessId) -> RepoResult<Vec<Order>> {
    let orders = repo_factory.create_order_repo(None).get(
        conn,
        OrderFilter {
            business_id: Some(business_id),
            payment_method: Some(PaymentMethod::Credit),
            ..Default::default()
        },
    )?;
    Ok(orders
        .into_iter()
        .filter(|order| order.order_status != OrderStatus::Cancelled)
        .collect())
}

impl BusinessService for BusinessServiceImpl {
    fn register(&self, payload: NewBusiness) -> ServiceResult<B2bBusiness> {
        debug!("Registering business {} for user {}", payload.business_name, self.caller.user_id);

        if self.caller.account_type != AccountType::B2b {
            return Err(format_err!("Only wholesale accounts can register a business")
                .context(Error::Forbidden)
                .into());
        }
        errors::validate(&payload)?;
        errors::validate(&payload.contact_person)?;
        errors::validate(&payload.business_address)?;

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let business = repo_factory.create_business_repo(Some(caller.clone())).create(
                conn,
                B2bBusiness {
                    id: BusinessId::new(),
                    user_id: caller.user_id,
                    business_name: payload.business_name,
                    business_type: payload.business_type,
                    gst_number: payload.gst_number,
                    pan_number: payload.pan_number,
                    registration_number: payload.registration_number,
                    contact_person: payload.contact_person,
                    business_address: payload.business_address,
                    account_status: BusinessStatus::Pending,
                    credit_limit: ProductPrice(0.0),
                    credit_period_days: 0,
                    available_credit: ProductPrice(0.0),
                    used_credit: ProductPrice(0.0),
                    approval_date: None,
                    approved_by: None,
                    rejection_reason: None,
                    created_at: Utc::now(),
                },
            )?;
            info!("Business {} registered by user {}, awaiting review", business.id, caller.user_id);
            Ok(business)
        })
    }

    fn profile(&self) -> ServiceResult<B2bBusiness> {
        debug!("Getting business profile of user {}", self.caller.user_id);

        let business_id = self.business_id()?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory
                .create_business_repo(Some(caller))
                .find(conn, business_id)?
                .ok_or_else(|| format_err!("Business {} not found", business_id).context(Error::NotFound).into())
        })
    }

    fn credit_dashboard(&self) -> ServiceResult<CreditDashboard> {
        debug!("Building credit dashboard for user {}", self.caller.user_id);

        let business_id = self.business_id()?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let business = repo_factory
                .create_business_repo(Some(caller))
                .find(conn, business_id)?
                .ok_or_else(|| format_err!("Business {} not found", business_id).context(Error::NotFound))?;

            let orders = credit_orders(&*repo_factory, conn, business.id)?;
            let now = Utc::now();

            let mut pending_amount = 0.0;
            let mut overdue_amount = 0.0;
            let mut pending_invoices = 0;
            for order in orders.iter().filter(|order| order.payment_status == PaymentStatus::Pending) {
                pending_amount += order.total_amount.0;
                pending_invoices += 1;
                if order.due_date.map(|due| due < now).unwrap_or(false) {
                    overdue_amount += order.total_amount.0;
                }
            }

            Ok(CreditDashboard {
                business_id: business.id,
                business_name: business.business_name.clone(),
                credit_info: CreditSummary {
                    total_limit: business.credit_limit,
                    available_credit: business.available_credit,
                    used_credit: business.used_credit,
                    credit_period_days: business.credit_period_days,
                },
                payment_summary: PaymentSummary {
                    pending_amount: ProductPrice(pending_amount).round(),
                    overdue_amount: ProductPrice(overdue_amount).round(),
                    pending_invoices,
                },
                recent_invoices: orders.iter().take(RECENT_INVOICES).map(invoice).collect(),
            })
        })
    }

    fn list_addresses(&self) -> ServiceResult<Vec<DeliveryAddress>> {
        debug!("Listing delivery addresses of user {}", self.caller.user_id);

        let business_id = self.business_id()?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory.create_address_repo(Some(caller)).get(
                conn,
                AddressFilter {
                    business_id: Some(business_id),
                    is_active: Some(true),
                    ..Default::default()
                },
            )
        })
    }

    fn add_address(&self, payload: NewDeliveryAddress) -> ServiceResult<DeliveryAddress> {
        debug!("Adding delivery address {} for user {}", payload.label, self.caller.user_id);

        let business_id = self.business_id()?;
        errors::validate(&payload)?;
        errors::validate(&payload.address)?;

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory.create_address_repo(Some(caller)).create(
                conn,
                DeliveryAddress {
                    id: AddressId::new(),
                    business_id,
                    label: payload.label,
                    address: payload.address,
                    contact_person: payload.contact_person,
                    contact_mobile: payload.contact_mobile,
                    is_default: payload.is_default,
                    is_active: true,
                    created_at: Utc::now(),
                },
            )
        })
    }

    fn update_address(&self, address_id: AddressId, payload: DeliveryAddressUpdate) -> ServiceResult<DeliveryAddress> {
        debug!("Updating delivery address {} for user {}", address_id, self.caller.user_id);

        self.business_id()?;
        if let Some(ref address) = payload.address {
            errors::validate(address)?;
        }

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory
                .create_address_repo(Some(caller))
                .update(conn, address_id, payload)
        })
    }

    fn delete_address(&self, address_id: AddressId) -> ServiceResult<DeliveryAddress> {
        debug!("Deleting delivery address {} for user {}", address_id, self.caller.user_id);

        self.business_id()?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let address = repo_factory.create_address_repo(Some(caller)).deactivate(conn, address_id)?;
            info!("Delivery address {} of business {} removed", address.id, address.business_id);
            Ok(address)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use errors::kind_of;
    use repos::product::tests::product;
    use services::admin::{AdminService, AdminServiceImpl};
    use services::cart::{CartService, CartServiceImpl};
    use services::order::{OrderService, OrderServiceImpl};
    use services::testing::*;

    fn registration() -> NewBusiness {
        NewBusiness {
            business_name: "Green Leaf Cafe".to_string(),
            business_type: BusinessType::Cafe,
            gst_number: "29GGGGG1314R9Z6".to_string(),
            pan_number: "GGGGG1314R".to_string(),
            registration_number: None,
            contact_person: ContactPerson {
                name: "Ravi".to_string(),
                email: "ravi@greenleaf.in".to_string(),
                mobile: "9123456780".to_string(),
            },
            business_address: retail_address(),
        }
    }

    #[test]
    fn registration_is_pending_and_validated() {
        let ctx = context();
        let caller = Caller::b2b(UserId::new(), None);
        let service = BusinessServiceImpl::new(ctx.clone(), caller.clone());

        let mut bad = registration();
        bad.gst_number = "not-a-gst".to_string();
        let e = service.register(bad).unwrap_err();
        match kind_of(&e) {
            Some(Error::Validate(_)) => {}
            other => panic!("unexpected error {:?}", other),
        }

        let mut bad = registration();
        bad.contact_person.email = "ravi".to_string();
        assert!(service.register(bad).is_err());

        let business = service.register(registration()).unwrap();
        assert_eq!(business.account_status, BusinessStatus::Pending);
        assert_eq!(business.available_credit, ProductPrice(0.0));

        let e = service.register(registration()).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::AlreadyExists));

        let profile = BusinessServiceImpl::new(ctx, Caller::b2b(caller.user_id, Some(business.id)))
            .profile()
            .unwrap();
        assert_eq!(profile.id, business.id);
    }

    #[test]
    fn retail_users_cannot_register() {
        let service = BusinessServiceImpl::new(context(), Caller::b2c(UserId::new()));
        let e = service.register(registration()).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::Forbidden));
    }

    #[test]
    fn address_book() {
        let ctx = context();
        let (caller, _) = approved_business(&ctx, 20000.0);
        let service = BusinessServiceImpl::new(ctx, caller);

        let kitchen = service
            .add_address(NewDeliveryAddress {
                label: "Central kitchen".to_string(),
                address: retail_address(),
                contact_person: Some("Ravi".to_string()),
                contact_mobile: Some("9123456780".to_string()),
                is_default: true,
            })
            .unwrap();
        let outlet = service
            .add_address(NewDeliveryAddress {
                label: "Outlet".to_string(),
                address: retail_address(),
                contact_person: None,
                contact_mobile: None,
                is_default: false,
            })
            .unwrap();

        let listed = service.list_addresses().unwrap();
        assert_eq!(listed.iter().map(|a| a.id).collect::<Vec<_>>(), vec![kitchen.id, outlet.id]);

        let mut bad = retail_address();
        bad.pincode = "0123".to_string();
        assert!(service
            .update_address(
                outlet.id,
                DeliveryAddressUpdate {
                    address: Some(bad),
                    ..Default::default()
                }
            )
            .is_err());

        service.delete_address(kitchen.id).unwrap();
        let listed = service.list_addresses().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, outlet.id);
    }

    #[test]
    fn empty_dashboard() {
        let ctx = context();
        let (caller, business) = approved_business(&ctx, 20000.0);
        let dashboard = BusinessServiceImpl::new(ctx, caller).credit_dashboard().unwrap();

        assert_eq!(dashboard.business_id, business.id);
        assert_eq!(dashboard.credit_info.total_limit, ProductPrice(20000.0));
        assert_eq!(dashboard.credit_info.credit_period_days, 15);
        assert_eq!(dashboard.payment_summary.pending_invoices, 0);
        assert!(dashboard.recent_invoices.is_empty());
    }

    #[test]
    fn dashboard_splits_pending_and_overdue() {
        let ctx = context();
        let mut rice = product("RICE-25", 1000);
        rice.b2b_base_price = ProductPrice(100.0);
        rice.b2b_bulk_tiers = tiers();
        let rice = stock_product(&ctx, rice);
        let (caller, _) = approved_business(&ctx, 50000.0);

        let mut placed = vec![];
        for _ in 0..3 {
            CartServiceImpl::new(ctx.clone(), caller.clone())
                .add_item(AddToCartPayload {
                    product_id: rice.id,
                    quantity: Quantity(100),
                })
                .unwrap();
            let order = OrderServiceImpl::new(ctx.clone(), caller.clone())
                .place_b2b_order(B2bOrderRequest {
                    delivery_locations: vec![],
                    billing_address: None,
                    scheduled_date: Utc::now() + Duration::days(2),
                    scheduled_time_slot: None,
                    po_number: None,
                    payment_method: Some(PaymentMethod::Credit),
                    special_instructions: None,
                })
                .unwrap();
            placed.push(order.order_id);
        }

        let (overdue, settled) = (placed[0], placed[1]);
        ctx.db_pool
            .run(|conn| {
                for order in conn.orders.iter_mut().filter(|o| o.id == overdue || o.id == settled) {
                    order.due_date = Some(Utc::now() - Duration::days(1));
                }
                Ok(())
            })
            .unwrap();
        AdminServiceImpl::new(ctx.clone(), Caller::admin(UserId::new()))
            .mark_order_paid(settled)
            .unwrap();

        let dashboard = BusinessServiceImpl::new(ctx, caller).credit_dashboard().unwrap();

        // each order is 100 * 80 + 18% GST + 1000 delivery
        assert_eq!(dashboard.payment_summary.pending_invoices, 2);
        assert_eq!(dashboard.payment_summary.pending_amount, ProductPrice(20880.0));
        assert_eq!(dashboard.payment_summary.overdue_amount, ProductPrice(10440.0));
        assert_eq!(dashboard.credit_info.used_credit, ProductPrice(20880.0));
        assert_eq!(dashboard.recent_invoices.len(), 3);
    }
}
