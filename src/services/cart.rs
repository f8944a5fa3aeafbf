use chrono::prelude::*;
use chrono::Duration;

use super::types::*;
use config::Config;
use errors::Error;
use models::*;
use pricing::{self, CartTotals, NextTierInfo};
use repos::{CartRepo, DbPool, ProductRepo, RepoConnection, RepoResult, ReposFactory};
use types::*;

/// Service that provides operations for interacting with user carts
pub trait CartService {
    /// Get caller's cart with totals
    fn get_cart(&self) -> ServiceResult<CartView>;
    /// Put a product into the cart, merging with an existing line
    fn add_item(&self, payload: AddToCartPayload) -> ServiceResult<CartItemChanged>;
    /// Set line to desired quantity
    fn update_item(&self, cart_item_id: CartItemId, payload: CartQuantityPayload) -> ServiceResult<CartItemChanged>;
    /// Delete line from caller's cart
    fn remove_item(&self, cart_item_id: CartItemId) -> ServiceResult<CartView>;
    /// Clear caller's cart
    fn clear_cart(&self) -> ServiceResult<CartView>;
}

/// Default implementation of user cart service
pub struct CartServiceImpl {
    ctx: ServiceContext,
    caller: Caller,
}

impl CartServiceImpl {
    pub fn new(ctx: ServiceContext, caller: Caller) -> Self {
        Self { ctx, caller }
    }
}

fn cart_ttl(config: &Config, account_type: AccountType) -> Duration {
    match account_type {
        AccountType::B2c => Duration::minutes(config.b2c.cart_ttl_minutes),
        AccountType::B2b => Duration::hours(config.b2b.cart_ttl_hours),
    }
}

/// Caller's cart. Lines of an expired cart are dropped on read.
pub fn load_cart(repo: &dyn CartRepo, conn: RepoConnection, caller: &Caller, now: DateTime<Utc>) -> RepoResult<Option<Cart>> {
    match repo.find_for_user(conn, caller.user_id, caller.account_type)? {
        Some(mut cart) => {
            if cart.is_expired(now) && !cart.items.is_empty() {
                info!(
                    "Cart {} of user {} expired at {}, dropping {} lines",
                    cart.id,
                    caller.user_id,
                    cart.expires_at,
                    cart.items.len()
                );
                cart.items.clear();
                cart = repo.save(conn, cart)?;
            }
            Ok(Some(cart))
        }
        None => Ok(None),
    }
}

/// Caller's cart ready to be modified, created on first use. Expiry restarts on every open.
fn open_cart(repo: &dyn CartRepo, conn: RepoConnection, config: &Config, caller: &Caller, now: DateTime<Utc>) -> RepoResult<Cart> {
    let expires_at = now + cart_ttl(config, caller.account_type);

    match load_cart(repo, conn, caller, now)? {
        Some(mut cart) => {
            cart.expires_at = expires_at;
            Ok(cart)
        }
        None => {
            debug!("Creating {} cart for user {}", caller.account_type, caller.user_id);
            repo.create(
                conn,
                Cart {
                    id: CartId::new(),
                    user_id: caller.user_id,
                    account_type: caller.account_type,
                    business_id: caller.business_id,
                    expires_at,
                    created_at: now,
                    items: vec![],
                },
            )
        }
    }
}

/// Unit price and tier label for `quantity` of `product` in the caller's channel
pub fn unit_price(account_type: AccountType, product: &Product, quantity: Quantity) -> (ProductPrice, Option<String>) {
    match account_type {
        AccountType::B2c => (product.b2c_selling_price, None),
        AccountType::B2b => {
            let price = pricing::calculate_b2b_price(product.b2b_base_price, quantity, &product.b2b_bulk_tiers);
            (price.unit_price, price.applied_tier)
        }
    }
}

fn upsell(account_type: AccountType, product: &Product, quantity: Quantity) -> Option<NextTierInfo> {
    match account_type {
        AccountType::B2c => None,
        AccountType::B2b => pricing::next_tier_info(quantity, &product.b2b_bulk_tiers),
    }
}

fn find_product(repo: &dyn ProductRepo, conn: RepoConnection, id: ProductId) -> RepoResult<Product> {
    repo.find(conn, id)?
        .filter(|product| product.is_available())
        .ok_or_else(|| format_err!("Product {} is not available", id).context(Error::NotFound).into())
}

fn ensure_stock(product: &Product, channel: AccountType, quantity: Quantity) -> RepoResult<()> {
    let available = product.reserved_stock(channel);
    if available < quantity.0 {
        warn!(
            "Only {} units of {} left for {}, requested {}",
            available, product.name, channel, quantity
        );
        return Err(format_err!("Only {} units of {} are available", available, product.name)
            .context(Error::InsufficientStock)
            .into());
    }
    Ok(())
}

fn invalid_quantity(message: String) -> RepoResult<()> {
    warn!("{}", message);
    Err(Error::Validate(message).into())
}

/// Checks the channel's quantity rules for the final quantity of a line
fn check_line_quantity(account_type: AccountType, product: &Product, quantity: Quantity) -> RepoResult<()> {
    match account_type {
        AccountType::B2c => {
            if quantity < product.b2c_min_quantity.max(Quantity(1)) || quantity > product.b2c_max_quantity {
                return invalid_quantity(format!(
                    "Quantity of {} must be between {} and {}",
                    product.name,
                    product.b2c_min_quantity.max(Quantity(1)),
                    product.b2c_max_quantity
                ));
            }
        }
        AccountType::B2b => {
            if quantity < product.b2b_min_order_qty {
                return invalid_quantity(format!(
                    "Minimum order quantity for {} is {}",
                    product.name, product.b2b_min_order_qty
                ));
            }
            if let Some(max) = product.b2b_max_order_qty {
                if quantity > max {
                    return invalid_quantity(format!("Maximum order quantity for {} is {}", product.name, max));
                }
            }
        }
    }
    ensure_stock(product, account_type, quantity)
}

fn ensure_channel(caller: &Caller) -> RepoResult<()> {
    if caller.account_type == AccountType::B2b && caller.business_id.is_none() {
        return Err(format_err!("User {} has no registered business", caller.user_id)
            .context(Error::Forbidden)
            .into());
    }
    Ok(())
}

/// Assembles the cart view with product names, totals and, for wholesale callers, credit headroom
pub fn cart_view(
    repo_factory: &dyn ReposFactory,
    conn: RepoConnection,
    config: &Config,
    caller: &Caller,
    cart: Option<Cart>,
) -> RepoResult<CartView> {
    let product_repo = repo_factory.create_product_repo(None);
    let cart_id = cart.as_ref().map(|cart| cart.id);
    let items = cart.map(|cart| cart.items).unwrap_or_default();

    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let product_name = product_repo
            .find(conn, item.product_id)?
            .map(|product| product.name)
            .unwrap_or_default();
        lines.push(CartLine {
            cart_item_id: item.id,
            product_id: item.product_id,
            product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            applied_tier: item.applied_tier.clone(),
            item_total: item.item_total(),
        });
    }

    let totals = CartTotals::compute(config, caller.account_type, items.iter().map(|item| (item.unit_price, item.quantity)));

    let (gst_18, credit_info) = match (caller.account_type, caller.business_id) {
        (AccountType::B2b, Some(business_id)) => {
            let business = repo_factory.create_business_repo(None).find(conn, business_id)?;
            let credit_info = business.map(|business| CreditInfo {
                credit_available: business.available_credit,
                credit_after_order: ProductPrice(business.available_credit.0 - totals.total_amount.0).round(),
            });
            (Some(totals.gst_amount), credit_info)
        }
        (AccountType::B2b, None) => (Some(totals.gst_amount), None),
        (AccountType::B2c, _) => (None, None),
    };

    Ok(CartView {
        cart_id,
        account_type: caller.account_type,
        items: lines,
        summary: CartSummary {
            total_items: totals.total_items,
            subtotal: totals.subtotal,
            delivery_charges: totals.delivery_charges,
            gst_18,
            total_amount: totals.total_amount,
        },
        credit_info,
    })
}

/// Merges `quantity` units of a product into the cart, pricing the merged line for the caller's channel
pub fn merge_into_cart(cart: &mut Cart, caller: &Caller, product: &Product, quantity: Quantity) -> RepoResult<CartItem> {
    let merged = Quantity(
        cart.item_for_product_mut(product.id)
            .map(|item| item.quantity.0)
            .unwrap_or(0)
            + quantity.0,
    );
    check_line_quantity(caller.account_type, product, merged)?;

    let (unit_price, applied_tier) = unit_price(caller.account_type, product, merged);

    let item = match cart.item_for_product_mut(product.id) {
        Some(item) => {
            item.quantity = merged;
            item.unit_price = unit_price;
            item.applied_tier = applied_tier;
            item.clone()
        }
        None => {
            let item = CartItem {
                id: CartItemId::new(),
                product_id: product.id,
                quantity: merged,
                unit_price,
                applied_tier,
            };
            cart.items.push(item.clone());
            item
        }
    };
    Ok(item)
}

impl CartServiceImpl {
    fn pool(&self) -> &DbPool {
        &self.ctx.db_pool
    }
}

impl CartService for CartServiceImpl {
    fn get_cart(&self) -> ServiceResult<CartView> {
        debug!("Getting {} cart for user {}", self.caller.account_type, self.caller.user_id);

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.pool().run(move |conn| {
            let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));
            let cart = load_cart(&*cart_repo, conn, &caller, Utc::now())?;
            cart_view(&*repo_factory, conn, &config, &caller, cart)
        })
    }

    fn add_item(&self, payload: AddToCartPayload) -> ServiceResult<CartItemChanged> {
        debug!(
            "Adding {} units of product {} into {} cart of user {}",
            payload.quantity, payload.product_id, self.caller.account_type, self.caller.user_id
        );

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.pool().run(move |conn| {
            ensure_channel(&caller)?;

            if caller.account_type == AccountType::B2c
                && (payload.quantity.0 < 1 || payload.quantity.0 > config.b2c.max_quantity_per_add)
            {
                invalid_quantity(format!("Quantity must be between 1 and {}", config.b2c.max_quantity_per_add))?;
            }

            let product_repo = repo_factory.create_product_repo(None);
            let product = find_product(&*product_repo, conn, payload.product_id)?;
            if caller.account_type == AccountType::B2b && payload.quantity < product.b2b_min_order_qty {
                invalid_quantity(format!(
                    "Minimum order quantity for {} is {}",
                    product.name, product.b2b_min_order_qty
                ))?;
            }

            let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));
            let now = Utc::now();
            let mut cart = open_cart(&*cart_repo, conn, &config, &caller, now)?;

            let item = merge_into_cart(&mut cart, &caller, &product, payload.quantity)?;
            cart_repo.save(conn, cart)?;

            info!(
                "Cart line {} of user {} now holds {} units of {} at {}",
                item.id, caller.user_id, item.quantity, product.name, item.unit_price
            );
            Ok(CartItemChanged::new(&item, upsell(caller.account_type, &product, item.quantity)))
        })
    }

    fn update_item(&self, cart_item_id: CartItemId, payload: CartQuantityPayload) -> ServiceResult<CartItemChanged> {
        debug!(
            "Setting quantity of cart line {} of user {} to {}",
            cart_item_id, self.caller.user_id, payload.value
        );

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();
        let quantity = payload.value;

        self.pool().run(move |conn| {
            let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));
            let mut cart = load_cart(&*cart_repo, conn, &caller, Utc::now())?
                .ok_or_else(|| format_err!("Cart line {} not found", cart_item_id).context(Error::NotFound))?;

            let product_id = cart
                .item(cart_item_id)
                .map(|item| item.product_id)
                .ok_or_else(|| format_err!("Cart line {} not found", cart_item_id).context(Error::NotFound))?;

            let product_repo = repo_factory.create_product_repo(None);
            let product = find_product(&*product_repo, conn, product_id)?;
            check_line_quantity(caller.account_type, &product, quantity)?;

            let (unit_price, applied_tier) = unit_price(caller.account_type, &product, quantity);
            let item = {
                let item = cart
                    .item_for_product_mut(product_id)
                    .ok_or_else(|| format_err!("Cart line {} not found", cart_item_id).context(Error::NotFound))?;
                item.quantity = quantity;
                item.unit_price = unit_price;
                item.applied_tier = applied_tier;
                item.clone()
            };
            cart_repo.save(conn, cart)?;

            Ok(CartItemChanged::new(&item, upsell(caller.account_type, &product, quantity)))
        })
    }

    fn remove_item(&self, cart_item_id: CartItemId) -> ServiceResult<CartView> {
        debug!("Removing cart line {} of user {}", cart_item_id, self.caller.user_id);

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.pool().run(move |conn| {
            let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));
            let mut cart = load_cart(&*cart_repo, conn, &caller, Utc::now())?
                .ok_or_else(|| format_err!("Cart line {} not found", cart_item_id).context(Error::NotFound))?;

            let before = cart.items.len();
            cart.items.retain(|item| item.id != cart_item_id);
            if cart.items.len() == before {
                return Err(format_err!("Cart line {} not found", cart_item_id)
                    .context(Error::NotFound)
                    .into());
            }

            let cart = cart_repo.save(conn, cart)?;
            cart_view(&*repo_factory, conn, &config, &caller, Some(cart))
        })
    }

    fn clear_cart(&self) -> ServiceResult<CartView> {
        debug!("Clearing {} cart of user {}", self.caller.account_type, self.caller.user_id);

        let repo_factory = self.ctx.repo_factory.clone();
        let config = self.ctx.config.clone();
        let caller = self.caller.clone();

        self.pool().run(move |conn| {
            let cart_repo = repo_factory.create_cart_repo(Some(caller.clone()));
            let cart = match load_cart(&*cart_repo, conn, &caller, Utc::now())? {
                Some(mut cart) => {
                    cart.items.clear();
                    Some(cart_repo.save(conn, cart)?)
                }
                None => None,
            };
            cart_view(&*repo_factory, conn, &config, &caller, cart)
        })
    }
}
