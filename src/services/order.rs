use chrono::prelude::*;
use chrono::Duration;

use super::cart::{load_cart, merge_into_cart, unit_price};
use super::types::*;
use errors::{self, Error};
use models::*;
use order_number;
use pricing::CartTotals;
use repos::*;
use types::*;

/// Checkout and the customer's view of their orders
pub trait OrderService {
    /// Turns the retail cart into an order
    fn place_b2c_order(&self, payload: B2cOrderRequest) -> ServiceResult<OrderPlaced>;
    /// Turns the wholesale cart into a scheduled order, optionally on credit
    fn place_b2b_order(&self, payload: B2bOrderRequest) -> ServiceResult<OrderPlaced>;
    /// Caller's orders of the caller's channel, newest first
    fn list_orders(&self, page: Option<u32>, limit: Option<u32>) -> ServiceResult<Page<Order>>;
    fn get_order(&self, order_id: OrderId) -> ServiceResult<Order>;
    /// Cancels a placed order, returning stock and credit
    fn cancel_order(&self, order_id: OrderId, reason: Option<String>) -> ServiceResult<Order>;
    /// Copies the lines of a past order into the wholesale cart at current prices
    fn reorder(&self, order_id: OrderId) -> ServiceResult<ReorderReport>;
    /// Status changes, latest first
    fn order_history(&self, order_id: OrderId) -> ServiceResult<Vec<OrderDiff>>;
}

pub struct OrderServiceImpl {
    ctx: ServiceContext,
    caller: Caller,
}

impl OrderServiceImpl {
    pub fn new(ctx: ServiceContext, caller: Caller) -> Self {
        Self { ctx, caller }
    }

    fn ensure_account(&self, account_type: AccountType) -> ServiceResult<()> {
        if self.caller.account_type != account_type {
            return Err(format_err!("Operation requires a {} account", account_type)
                .context(Error::Forbidden)
                .into());
        }
        Ok(())
    }

    fn business_id(&self) -> ServiceResult<BusinessId> {
        self.caller.business_id.ok_or_else(|| {
            format_err!("User {} has no registered business", self.caller.user_id)
                .context(Error::Forbidden)
                .into()
        })
    }
}

const ORDER_NUMBER_ATTEMPTS: usize = 1000;

fn next_order_number(repo: &dyn OrderRepo, conn: RepoConnection, order_type: AccountType, now: DateTime<Utc>) -> RepoResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let number = order_number::generate(order_type, now);
        let taken = repo.get(
            conn,
            OrderFilter {
                order_number: Some(number.clone()),
                ..Default::default()
            },
        )?;
        if taken.is_empty() {
            return Ok(number);
        }
    }
    error!("Could not find a free {} order number for {}", order_type, now.format("%Y%m%d"));
    Err(format_err!("No free order numbers left for {}", now.format("%Y%m%d"))
        .context(Error::AlreadyExists)
        .into())
}

/// Non-empty cart of the caller with the product of every line
fn checkout_lines(
    repo_factory: &dyn ReposFactory,
    conn: RepoConnection,
    caller: &Caller,
    now: DateTime<Utc>,
) -> RepoResult<(Cart, Vec<(CartItem, Product)>)> {
    let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));
    let product_repo = repo_factory.create_product_repo(None);

    let cart = match load_cart(&*cart_repo, conn, caller, now)? {
        Some(ref cart) if !cart.items.is_empty() => cart.clone(),
        _ => {
            return Err(format_err!("Cart of user {} is empty", caller.user_id)
                .context(Error::EmptyCart)
                .into())
        }
    };

    let mut lines = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let product = product_repo
            .find(conn, item.product_id)?
            .filter(|product| product.is_available())
            .ok_or_else(|| format_err!("Product {} is no longer available", item.product_id).context(Error::NotFound))?;
        lines.push((item.clone(), product));
    }
    Ok((cart, lines))
}

fn ensure_minimum(totals: &CartTotals, minimum: f64) -> RepoResult<()> {
    if totals.subtotal.0 < minimum {
        warn!("Order subtotal {} is below the minimum of {}", totals.subtotal, minimum);
        return Err(format_err!("Minimum order value is {}", minimum)
            .context(Error::MinimumOrderValue)
            .into());
    }
    Ok(())
}

/// Takes the ordered units out of stock and turns the cart lines into order lines
fn take_stock(
    repo_factory: &dyn ReposFactory,
    conn: RepoConnection,
    channel: AccountType,
    lines: &[(CartItem, Product)],
    delivery_location_id: Option<AddressId>,
) -> RepoResult<Vec<OrderItem>> {
    let product_repo = repo_factory.create_product_repo(None);

    let mut items = Vec::with_capacity(lines.len());
    for (item, product) in lines {
        product_repo.take_stock(conn, product.id, channel, item.quantity)?;
        items.push(OrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            applied_tier: item.applied_tier.clone(),
            item_total: item.item_total().round(),
            delivery_location_id,
        });
    }
    Ok(items)
}

fn close_cart(repo_factory: &dyn ReposFactory, conn: RepoConnection, caller: &Caller, mut cart: Cart) -> RepoResult<()> {
    cart.items.clear();
    repo_factory.create_cart_repo(Some(caller.clone())).save(conn, cart)?;
    Ok(())
}

/// Fills in label and street of locations picked from the business's address book
fn resolve_locations(
    repo_factory: &dyn ReposFactory,
    conn: RepoConnection,
    business_id: BusinessId,
    requested: Vec<DeliveryLocation>,
) -> RepoResult<Vec<DeliveryLocation>> {
    let address_repo = repo_factory.create_address_repo(None);
    let book = address_repo.get(
        conn,
        AddressFilter {
            business_id: Some(business_id),
            is_active: Some(true),
            ..Default::default()
        },
    )?;

    if requested.is_empty() {
        // Listing puts the default address first
        return Ok(book
            .into_iter()
            .find(|address| address.is_default)
            .map(|address| DeliveryLocation {
                location_id: Some(address.id),
                label: Some(address.label),
                address_line1: Some(address.address.address_line1),
            })
            .into_iter()
            .collect());
    }

    let mut out = Vec::with_capacity(requested.len());
    for location in requested {
        match location.location_id {
            Some(id) => {
                let address = book
                    .iter()
                    .find(|address| address.id == id)
                    .ok_or_else(|| format_err!("Delivery address {} not found", id).context(Error::NotFound))?;
                out.push(DeliveryLocation {
                    location_id: Some(id),
                    label: location.label.or_else(|| Some(address.label.clone())),
                    address_line1: location
                        .address_line1
                        .or_else(|| Some(address.address.address_line1.clone())),
                });
            }
            None => out.push(location),
        }
    }
    Ok(out)
}

fn credit_due_date(business: &B2bBusiness, scheduled_date: DateTime<Utc>) -> DateTime<Utc> {
    scheduled_date + Duration::days(i64::from(business.credit_period_days))
}

impl OrderService for OrderServiceImpl {
    fn place_b2c_order(&self, payload: B2cOrderRequest) -> ServiceResult<OrderPlaced> {
        debug!("Placing retail order for user {}", self.caller.user_id);

        self.ensure_account(AccountType::B2c)?;
        errors::validate(&payload)?;
        errors::validate(&payload.delivery_address)?;
        if payload.delivery_slot == Some(DeliverySlot::Scheduled) && payload.scheduled_date.is_none() {
            return Err(Error::Validate("Scheduled delivery needs a delivery date".to_string()).into());
        }

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let now = Utc::now();
            let (cart, lines) = checkout_lines(&*repo_factory, conn, &caller, now)?;

            let totals = CartTotals::compute(
                &config,
                AccountType::B2c,
                lines.iter().map(|(item, _)| (item.unit_price, item.quantity)),
            );
            ensure_minimum(&totals, config.b2c.min_order_value)?;

            let items = take_stock(&*repo_factory, conn, AccountType::B2c, &lines, None)?;

            let order_repo = repo_factory.create_order_repo(Some(caller.clone()));
            let order_number = next_order_number(&*repo_factory.create_order_repo(None), conn, AccountType::B2c, now)?;
            let payment_method = payload.payment_method.unwrap_or_default();

            let order = order_repo.create(
                conn,
                Order {
                    id: OrderId::new(),
                    order_number,
                    user_id: caller.user_id,
                    business_id: None,
                    order_type: AccountType::B2c,
                    po_number: None,
                    order_date: now,
                    delivery_info: DeliveryInfo::Retail {
                        address: payload.delivery_address,
                        slot: payload.delivery_slot,
                        scheduled_date: payload.scheduled_date,
                        instructions: payload.delivery_instructions,
                    },
                    payment_method,
                    payment_status: PaymentStatus::Pending,
                    order_status: OrderStatus::Placed,
                    subtotal: totals.subtotal,
                    gst_amount: totals.gst_amount,
                    delivery_charges: totals.delivery_charges,
                    total_amount: totals.total_amount,
                    credit_used: ProductPrice(0.0),
                    due_date: None,
                    special_instructions: None,
                    items,
                    created_at: now,
                    updated_at: now,
                },
            )?;

            repo_factory
                .create_order_diff_repo()
                .create(conn, history_entry(&order, caller.user_id, Some("Order placed".to_string())))?;
            close_cart(&*repo_factory, conn, &caller, cart)?;

            info!(
                "Retail order {} placed by user {} for {}",
                order.order_number, caller.user_id, order.total_amount
            );

            let estimated_delivery = match payload.delivery_slot {
                Some(DeliverySlot::Scheduled) => payload.scheduled_date,
                Some(slot) => slot.lead_time().map(|lead| now + lead),
                None => None,
            };

            Ok(OrderPlaced {
                order_id: order.id,
                order_number: order.order_number,
                order_type: AccountType::B2c,
                total_amount: order.total_amount,
                payment_method,
                estimated_delivery,
                credit_due_date: None,
                scheduled_deliveries: vec![],
            })
        })
    }

    fn place_b2b_order(&self, payload: B2bOrderRequest) -> ServiceResult<OrderPlaced> {
        debug!("Placing wholesale order for user {}", self.caller.user_id);

        self.ensure_account(AccountType::B2b)?;
        let business_id = self.business_id()?;
        errors::validate(&payload)?;
        if let Some(ref billing_address) = payload.billing_address {
            errors::validate(billing_address)?;
        }

        let earliest = Utc::now() + Duration::hours(self.ctx.config.b2b.min_schedule_lead_hours);
        if payload.scheduled_date < earliest {
            warn!(
                "Wholesale delivery for user {} requested for {}, earliest is {}",
                self.caller.user_id, payload.scheduled_date, earliest
            );
            return Err(Error::Validate(format!(
                "Delivery must be scheduled at least {} hours in advance",
                self.ctx.config.b2b.min_schedule_lead_hours
            ))
            .into());
        }

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let now = Utc::now();
            let business_repo = repo_factory.create_business_repo(None);
            let business = business_repo
                .find(conn, business_id)?
                .ok_or_else(|| format_err!("Business {} not found", business_id).context(Error::NotFound))?;
            if business.account_status != BusinessStatus::Approved {
                warn!("Business {} is {}, refusing order", business.id, business.account_status);
                return Err(format_err!("Business account is {}", business.account_status)
                    .context(Error::Forbidden)
                    .into());
            }

            let (cart, lines) = checkout_lines(&*repo_factory, conn, &caller, now)?;

            let totals = CartTotals::compute(
                &config,
                AccountType::B2b,
                lines.iter().map(|(item, _)| (item.unit_price, item.quantity)),
            );
            ensure_minimum(&totals, config.b2b.min_order_value)?;

            let payment_method = payload.payment_method.unwrap_or(PaymentMethod::Credit);
            let (credit_used, due_date) = if payment_method == PaymentMethod::Credit {
                business_repo.debit_credit(conn, business.id, totals.total_amount)?;
                (totals.total_amount, Some(credit_due_date(&business, payload.scheduled_date)))
            } else {
                (ProductPrice(0.0), None)
            };

            let locations = resolve_locations(&*repo_factory, conn, business.id, payload.delivery_locations)?;
            let items = take_stock(
                &*repo_factory,
                conn,
                AccountType::B2b,
                &lines,
                locations.first().and_then(|location| location.location_id),
            )?;

            let order_repo = repo_factory.create_order_repo(Some(caller.clone()));
            let order_number = next_order_number(&*repo_factory.create_order_repo(None), conn, AccountType::B2b, now)?;

            let order = order_repo.create(
                conn,
                Order {
                    id: OrderId::new(),
                    order_number,
                    user_id: caller.user_id,
                    business_id: Some(business.id),
                    order_type: AccountType::B2b,
                    po_number: payload.po_number,
                    order_date: now,
                    delivery_info: DeliveryInfo::Wholesale {
                        locations: locations.clone(),
                        billing_address: payload.billing_address.or_else(|| Some(business.business_address.clone())),
                        scheduled_date: payload.scheduled_date,
                        scheduled_time_slot: payload.scheduled_time_slot.clone(),
                    },
                    payment_method,
                    payment_status: PaymentStatus::Pending,
                    order_status: OrderStatus::Placed,
                    subtotal: totals.subtotal,
                    gst_amount: totals.gst_amount,
                    delivery_charges: totals.delivery_charges,
                    total_amount: totals.total_amount,
                    credit_used,
                    due_date,
                    special_instructions: payload.special_instructions,
                    items,
                    created_at: now,
                    updated_at: now,
                },
            )?;

            repo_factory
                .create_order_diff_repo()
                .create(conn, history_entry(&order, caller.user_id, Some("Order placed".to_string())))?;
            close_cart(&*repo_factory, conn, &caller, cart)?;

            info!(
                "Wholesale order {} placed by business {} for {} ({})",
                order.order_number, business.id, order.total_amount, payment_method_name(payment_method)
            );

            let scheduled_deliveries = if locations.is_empty() {
                vec![ScheduledDelivery {
                    location: None,
                    delivery_date: payload.scheduled_date,
                    time_slot: payload.scheduled_time_slot.clone(),
                }]
            } else {
                let scheduled_date = payload.scheduled_date;
                let scheduled_time_slot = &payload.scheduled_time_slot;
                locations
                    .into_iter()
                    .map(|location| ScheduledDelivery {
                        location: location.label,
                        delivery_date: scheduled_date,
                        time_slot: scheduled_time_slot.clone(),
                    })
                    .collect()
            };

            Ok(OrderPlaced {
                order_id: order.id,
                order_number: order.order_number,
                order_type: AccountType::B2b,
                total_amount: order.total_amount,
                payment_method,
                estimated_delivery: Some(payload.scheduled_date),
                credit_due_date: due_date,
                scheduled_deliveries,
            })
        })
    }

    fn list_orders(&self, page: Option<u32>, limit: Option<u32>) -> ServiceResult<Page<Order>> {
        debug!("Listing orders of user {}", self.caller.user_id);

        let pagination = Pagination::new(page, limit, 10);
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let orders = repo_factory.create_order_repo(Some(caller.clone())).get(
                conn,
                OrderFilter {
                    user_id: Some(caller.user_id),
                    order_type: Some(caller.account_type),
                    ..Default::default()
                },
            )?;
            Ok(pagination.apply(orders))
        })
    }

    fn get_order(&self, order_id: OrderId) -> ServiceResult<Order> {
        debug!("Getting order {} for user {}", order_id, self.caller.user_id);

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| find_order(&*repo_factory, conn, &caller, order_id))
    }

    fn cancel_order(&self, order_id: OrderId, reason: Option<String>) -> ServiceResult<Order> {
        debug!("Cancelling order {} for user {}", order_id, self.caller.user_id);

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let order = find_order(&*repo_factory, conn, &caller, order_id)?;
            if order.order_status != OrderStatus::Placed {
                warn!("Order {} is {}, refusing to cancel", order.order_number, order.order_status);
                return Err(format_err!("Order is already {}", order.order_status)
                    .context(Error::InvalidState)
                    .into());
            }

            let comment = reason.unwrap_or_else(|| "Cancelled by customer".to_string());
            cancel_in(&*repo_factory, conn, order, caller.user_id, comment)
        })
    }

    fn reorder(&self, order_id: OrderId) -> ServiceResult<ReorderReport> {
        debug!("Reordering order {} for user {}", order_id, self.caller.user_id);

        self.ensure_account(AccountType::B2b)?;
        self.business_id()?;

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let order = find_order(&*repo_factory, conn, &caller, order_id)?;
            let product_repo = repo_factory.create_product_repo(None);
            let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));

            let now = Utc::now();
            let mut cart = match load_cart(&*cart_repo, conn, &caller, now)? {
                Some(cart) => cart,
                None => cart_repo.create(
                    conn,
                    Cart {
                        id: CartId::new(),
                        user_id: caller.user_id,
                        account_type: caller.account_type,
                        business_id: caller.business_id,
                        expires_at: now,
                        created_at: now,
                        items: vec![],
                    },
                )?,
            };
            cart.expires_at = now + Duration::hours(config.b2b.cart_ttl_hours);

            let mut report = ReorderReport::default();
            for item in &order.items {
                let product = match product_repo.find(conn, item.product_id)? {
                    Some(ref product) if product.is_available() => product.clone(),
                    _ => {
                        report.unavailable_items.push(UnavailableItem {
                            product: item.product_name.clone(),
                            reason: "Product no longer available".to_string(),
                        });
                        continue;
                    }
                };

                if product.b2b_reserved_stock < item.quantity.0 {
                    report.unavailable_items.push(UnavailableItem {
                        product: product.name.clone(),
                        reason: "Insufficient stock".to_string(),
                    });
                    continue;
                }

                match merge_into_cart(&mut cart, &caller, &product, item.quantity) {
                    Ok(line) => {
                        let (current_price, _) = unit_price(AccountType::B2b, &product, item.quantity);
                        if current_price != item.unit_price {
                            report.price_changes.push(PriceChange {
                                product: product.name.clone(),
                                old_price: item.unit_price,
                                new_price: current_price,
                            });
                        }
                        debug!("Reorder put {} units of {} into cart line {}", item.quantity, product.name, line.id);
                        report.items_added.push(product.name.clone());
                    }
                    Err(e) => {
                        let reason = match errors::kind_of(&e) {
                            Some(Error::InsufficientStock) => "Insufficient stock".to_string(),
                            Some(Error::Validate(message)) => message,
                            _ => return Err(e),
                        };
                        report.unavailable_items.push(UnavailableItem {
                            product: product.name.clone(),
                            reason,
                        });
                    }
                }
            }

            cart_repo.save(conn, cart)?;
            info!(
                "Reorder of {} added {} lines, {} unavailable",
                order.order_number,
                report.items_added.len(),
                report.unavailable_items.len()
            );
            Ok(report)
        })
    }

    fn order_history(&self, order_id: OrderId) -> ServiceResult<Vec<OrderDiff>> {
        debug!("Getting history of order {} for user {}", order_id, self.caller.user_id);

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let order = find_order(&*repo_factory, conn, &caller, order_id)?;
            repo_factory
                .create_order_diff_repo()
                .get(conn, OrderDiffFilter { parent: Some(order.id) })
        })
    }
}

fn payment_method_name(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cod => "cash on delivery",
        PaymentMethod::Credit => "credit",
        PaymentMethod::Online => "online",
    }
}

/// Returns the order's stock and unsettled credit, marks it cancelled and records `comment` in its history
pub fn cancel_in(
    repo_factory: &dyn ReposFactory,
    conn: RepoConnection,
    order: Order,
    committer: UserId,
    comment: String,
) -> RepoResult<Order> {
    let product_repo = repo_factory.create_product_repo(None);
    for item in &order.items {
        product_repo.return_stock(conn, item.product_id, order.order_type, item.quantity)?;
    }

    // Settled credit was already handed back on payment
    let unsettled = order.payment_status == PaymentStatus::Pending;
    if let (true, true, Some(business_id)) = (order.is_credit(), unsettled, order.business_id) {
        repo_factory
            .create_business_repo(None)
            .restore_credit(conn, business_id, order.credit_used)?;
    }

    let order = repo_factory
        .create_order_repo(None)
        .update(
            conn,
            OrderUpdater {
                mask: OrderFilter::by_id(order.id),
                data: OrderUpdateData {
                    order_status: Some(OrderStatus::Cancelled),
                    ..Default::default()
                },
            },
        )?
        .pop()
        .ok_or_else(|| format_err!("Order {} not found", order.id).context(Error::NotFound))?;

    repo_factory
        .create_order_diff_repo()
        .create(conn, history_entry(&order, committer, Some(comment)))?;

    info!("Order {} cancelled by user {}", order.order_number, committer);
    Ok(order)
}

/// Order visible to the caller
pub fn find_order(repo_factory: &dyn ReposFactory, conn: RepoConnection, caller: &Caller, order_id: OrderId) -> RepoResult<Order> {
    repo_factory
        .create_order_repo(Some(caller.clone()))
        .find(conn, order_id)?
        .ok_or_else(|| format_err!("Order {} not found", order_id).context(Error::NotFound).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::kind_of;
    use repos::product::tests::product;
    use services::cart::{CartService, CartServiceImpl};
    use services::testing::*;

    fn retail_request() -> B2cOrderRequest {
        B2cOrderRequest {
            delivery_address: retail_address(),
            delivery_slot: Some(DeliverySlot::ThirtyMinutes),
            scheduled_date: None,
            delivery_instructions: None,
            payment_method: None,
        }
    }

    fn wholesale_request(payment_method: PaymentMethod) -> B2bOrderRequest {
        B2bOrderRequest {
            delivery_locations: vec![],
            billing_address: None,
            scheduled_date: Utc::now() + Duration::days(2),
            scheduled_time_slot: Some("06:00-09:00".to_string()),
            po_number: Some("PO-881".to_string()),
            payment_method: Some(payment_method),
            special_instructions: None,
        }
    }

    fn product_stock(ctx: &ServiceContext, id: ProductId) -> Product {
        ctx.db_pool
            .run(|conn| ctx.repo_factory.create_product_repo(None).find(conn, id))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn retail_checkout_takes_stock_and_clears_cart() {
        let ctx = context();
        let milk = stock_product(&ctx, product("MILK-1", 100));
        let caller = Caller::b2c(UserId::new());

        CartServiceImpl::new(ctx.clone(), caller.clone())
            .add_item(AddToCartPayload {
                product_id: milk.id,
                quantity: Quantity(2),
            })
            .unwrap();

        let service = OrderServiceImpl::new(ctx.clone(), caller.clone());
        let placed = service.place_b2c_order(retail_request()).unwrap();

        assert!(placed.order_number.starts_with("ORD"));
        assert_eq!(placed.total_amount, ProductPrice(135.0));
        assert_eq!(placed.payment_method, PaymentMethod::Cod);
        assert!(placed.estimated_delivery.is_some());

        let after = product_stock(&ctx, milk.id);
        assert_eq!(after.b2c_reserved_stock, 28);
        assert_eq!(after.total_stock, 98);
        assert_eq!(after.b2b_reserved_stock, 70);

        let cart = CartServiceImpl::new(ctx.clone(), caller.clone()).get_cart().unwrap();
        assert!(cart.items.is_empty());

        let e = service.place_b2c_order(retail_request()).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::EmptyCart));

        let history = service.order_history(placed.order_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, OrderStatus::Placed);
    }

    #[test]
    fn retail_minimum_leaves_store_untouched() {
        let ctx = context();
        let mut salt = product("SALT-1", 100);
        salt.b2c_selling_price = ProductPrice(20.0);
        let salt = stock_product(&ctx, salt);
        let caller = Caller::b2c(UserId::new());

        CartServiceImpl::new(ctx.clone(), caller.clone())
            .add_item(AddToCartPayload {
                product_id: salt.id,
                quantity: Quantity(4),
            })
            .unwrap();

        let e = OrderServiceImpl::new(ctx.clone(), caller.clone())
            .place_b2c_order(retail_request())
            .unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::MinimumOrderValue));

        assert_eq!(product_stock(&ctx, salt.id).b2c_reserved_stock, 30);
        let cart = CartServiceImpl::new(ctx.clone(), caller).get_cart().unwrap();
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn wholesale_credit_order_and_cancellation() {
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

        let service = OrderServiceImpl::new(ctx.clone(), caller.clone());
        let request = wholesale_request(PaymentMethod::Credit);
        let scheduled = request.scheduled_date;
        let placed = service.place_b2b_order(request).unwrap();

        // 100 * 80 = 8000, GST 1440, delivery 1000
        assert!(placed.order_number.starts_with("B2B"));
        assert_eq!(placed.total_amount, ProductPrice(10440.0));
        assert_eq!(placed.credit_due_date, Some(scheduled + Duration::days(15)));
        assert_eq!(placed.scheduled_deliveries.len(), 1);

        let ledger = ctx
            .db_pool
            .run(|conn| ctx.repo_factory.create_business_repo(None).find(conn, business.id))
            .unwrap()
            .unwrap();
        assert_eq!(ledger.available_credit, ProductPrice(39560.0));
        assert_eq!(ledger.used_credit, ProductPrice(10440.0));
        assert_eq!(product_stock(&ctx, rice.id).b2b_reserved_stock, 600);

        let cancelled = service
            .cancel_order(placed.order_id, Some("Menu changed".to_string()))
            .unwrap();
        assert_eq!(cancelled.order_status, OrderStatus::Cancelled);

        let ledger = ctx
            .db_pool
            .run(|conn| ctx.repo_factory.create_business_repo(None).find(conn, business.id))
            .unwrap()
            .unwrap();
        assert_eq!(ledger.available_credit, ProductPrice(50000.0));
        assert_eq!(ledger.used_credit, ProductPrice(0.0));
        assert_eq!(product_stock(&ctx, rice.id).b2b_reserved_stock, 700);

        let e = service.cancel_order(placed.order_id, None).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::InvalidState));

        let history = service.order_history(placed.order_id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, OrderStatus::Cancelled);
        assert_eq!(history[0].comment, Some("Menu changed".to_string()));
    }

    #[test]
    fn wholesale_credit_shortfall_rolls_back() {
        let ctx = context();
        let mut rice = product("RICE-25", 1000);
        rice.b2b_base_price = ProductPrice(100.0);
        let rice = stock_product(&ctx, rice);
        let (caller, _) = approved_business(&ctx, 10000.0);

        CartServiceImpl::new(ctx.clone(), caller.clone())
            .add_item(AddToCartPayload {
                product_id: rice.id,
                quantity: Quantity(200),
            })
            .unwrap();

        let service = OrderServiceImpl::new(ctx.clone(), caller.clone());
        let e = service.place_b2b_order(wholesale_request(PaymentMethod::Credit)).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::InsufficientCredit));
        assert_eq!(product_stock(&ctx, rice.id).b2b_reserved_stock, 700);

        let placed = service.place_b2b_order(wholesale_request(PaymentMethod::Cod)).unwrap();
        assert_eq!(placed.credit_due_date, None);
    }

    #[test]
    fn wholesale_needs_lead_time() {
        let ctx = context();
        let (caller, _) = approved_business(&ctx, 10000.0);
        let mut request = wholesale_request(PaymentMethod::Credit);
        request.scheduled_date = Utc::now() + Duration::hours(3);

        let e = OrderServiceImpl::new(ctx, caller).place_b2b_order(request).unwrap_err();
        match kind_of(&e) {
            Some(Error::Validate(_)) => {}
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn reorder_reports_missing_products_and_price_changes() {
        let ctx = context();
        let mut rice = product("RICE-25", 1000);
        rice.b2b_base_price = ProductPrice(100.0);
        rice.b2b_bulk_tiers = tiers();
        let rice = stock_product(&ctx, rice);
        let mut dal = product("DAL-5", 1000);
        dal.b2b_base_price = ProductPrice(120.0);
        let dal = stock_product(&ctx, dal);
        let (caller, _) = approved_business(&ctx, 100000.0);

        let cart = CartServiceImpl::new(ctx.clone(), caller.clone());
        for &(id, quantity) in &[(rice.id, 60), (dal.id, 50)] {
            cart.add_item(AddToCartPayload {
                product_id: id,
                quantity: Quantity(quantity),
            })
            .unwrap();
        }
        let service = OrderServiceImpl::new(ctx.clone(), caller.clone());
        let placed = service.place_b2b_order(wholesale_request(PaymentMethod::Cod)).unwrap();

        ctx.db_pool
            .run(|conn| {
                let repo = ctx.repo_factory.create_product_repo(None);
                repo.delete(conn, dal.id)?;
                repo.update(
                    conn,
                    ProductUpdater {
                        mask: ProductFilter::by_id(rice.id),
                        data: ProductUpdate {
                            b2b_bulk_tiers: Some(vec![BulkTier {
                                min_qty: Quantity(50),
                                max_qty: None,
                                price_per_unit: ProductPrice(75.0),
                            }]),
                            ..Default::default()
                        },
                    },
                )
            })
            .unwrap();

        let report = service.reorder(placed.order_id).unwrap();
        assert_eq!(report.items_added, vec![rice.name.clone()]);
        assert_eq!(
            report.unavailable_items,
            vec![UnavailableItem {
                product: dal.name.clone(),
                reason: "Product no longer available".to_string(),
            }]
        );
        assert_eq!(
            report.price_changes,
            vec![PriceChange {
                product: rice.name.clone(),
                old_price: ProductPrice(80.0),
                new_price: ProductPrice(75.0),
            }]
        );

        let view = cart.get_cart().unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, Quantity(60));
        assert_eq!(view.items[0].unit_price, ProductPrice(75.0));
    }

    #[test]
    fn orders_are_private() {
        let ctx = context();
        let milk = stock_product(&ctx, product("MILK-1", 100));
        let owner = Caller::b2c(UserId::new());

        CartServiceImpl::new(ctx.clone(), owner.clone())
            .add_item(AddToCartPayload {
                product_id: milk.id,
                quantity: Quantity(2),
            })
            .unwrap();
        let placed = OrderServiceImpl::new(ctx.clone(), owner.clone())
            .place_b2c_order(retail_request())
            .unwrap();

        let stranger = OrderServiceImpl::new(ctx.clone(), Caller::b2c(UserId::new()));
        let e = stranger.get_order(placed.order_id).unwrap_err();
        assert_eq!(kind_of(&e), Some(Error::Forbidden));
        assert_eq!(stranger.list_orders(None, None).unwrap().total, 0);

        let mine = OrderServiceImpl::new(ctx.clone(), owner).list_orders(None, None).unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.limit, 10);
        assert_eq!(mine.items[0].id, placed.order_id);
    }
}
