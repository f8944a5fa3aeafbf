extern crate chrono;
extern crate grocery_lib as lib;
#[macro_use]
extern crate maplit;

use chrono::{Duration, Utc};

use lib::config::Config;
use lib::errors::{kind_of, Error};
use lib::models::*;
use lib::repos::DbPool;
use lib::services::*;
use lib::types::*;

fn context() -> ServiceContext {
    ServiceContext::new(DbPool::new(), Config::default())
}

fn address() -> PostalAddress {
    PostalAddress {
        address_line1: "12 MG Road".to_string(),
        address_line2: None,
        city: "Bengaluru".to_string(),
        state: "KA".to_string(),
        pincode: "560001".to_string(),
    }
}

/// Basmati rice sold at 120 retail and 100 wholesale, 90 from 10 units and 80 from 50
fn stocked_rice(ctx: &ServiceContext, admin: &Caller) -> Product {
    let catalog = CatalogServiceImpl::new(ctx.clone(), admin.clone());
    let staples = catalog
        .create_category(NewCategory {
            name: "Staples".to_string(),
            description: Some("Rice, flour and pulses".to_string()),
            image_url: None,
        })
        .unwrap();

    catalog
        .create_product(NewProduct {
            sku: "RICE-BAS-5".to_string(),
            name: "Basmati Rice 5kg".to_string(),
            category_id: staples.id,
            subcategory_id: None,
            brand: Some("India Gate".to_string()),
            description: None,
            unit: "bag".to_string(),
            quantity_per_unit: Some(5.0),
            is_vegetarian: true,
            expiry_date: None,
            b2c_mrp: ProductPrice(160.0),
            b2c_selling_price: ProductPrice(120.0),
            b2c_min_quantity: None,
            b2c_max_quantity: None,
            b2b_base_price: ProductPrice(100.0),
            b2b_min_order_qty: Quantity(25),
            b2b_max_order_qty: None,
            b2b_bulk_tiers: vec![
                BulkTier {
                    min_qty: Quantity(10),
                    max_qty: Some(Quantity(49)),
                    price_per_unit: ProductPrice(90.0),
                },
                BulkTier {
                    min_qty: Quantity(50),
                    max_qty: None,
                    price_per_unit: ProductPrice(80.0),
                },
            ],
            total_stock: 1000,
            b2c_reserved_stock: None,
            b2b_reserved_stock: None,
        })
        .unwrap()
}

fn registration() -> NewBusiness {
    NewBusiness {
        business_name: "Spice Route Kitchens".to_string(),
        business_type: BusinessType::Restaurant,
        gst_number: "29AAGCS1234F1Z5".to_string(),
        pan_number: "AAGCS1234F".to_string(),
        registration_number: None,
        contact_person: ContactPerson {
            name: "Priya Nair".to_string(),
            email: "priya@spiceroute.in".to_string(),
            mobile: "9845012345".to_string(),
        },
        business_address: address(),
    }
}

#[test]
fn retail_customer_checks_out() {
    let ctx = context();
    let admin = Caller::admin(UserId::new());
    let rice = stocked_rice(&ctx, &admin);
    let shopper = Caller::b2c(UserId::new());

    let cart = CartServiceImpl::new(ctx.clone(), shopper.clone());
    let line = cart
        .add_item(AddToCartPayload {
            product_id: rice.id,
            quantity: Quantity(2),
        })
        .unwrap();
    assert_eq!(line.unit_price, ProductPrice(120.0));
    assert_eq!(line.applied_tier, None);
    assert_eq!(line.next_tier_info, None);

    let e = cart
        .update_item(line.cart_item_id, SetterPayload { value: Quantity(11) })
        .unwrap_err();
    match kind_of(&e) {
        Some(Error::Validate(_)) => {}
        other => panic!("unexpected error {:?}", other),
    }

    let view = cart.get_cart().unwrap();
    assert_eq!(view.summary.subtotal, ProductPrice(240.0));
    assert_eq!(view.summary.delivery_charges, ProductPrice(0.0));
    assert_eq!(view.summary.gst_18, None);
    assert_eq!(view.credit_info, None);

    let orders = OrderServiceImpl::new(ctx.clone(), shopper.clone());
    let placed = orders
        .place_b2c_order(B2cOrderRequest {
            delivery_address: address(),
            delivery_slot: Some(DeliverySlot::OneHour),
            scheduled_date: None,
            delivery_instructions: Some("Leave at the gate".to_string()),
            payment_method: None,
        })
        .unwrap();
    assert!(placed.order_number.starts_with("ORD"));
    assert_eq!(placed.total_amount, ProductPrice(240.0));

    let page = orders.list_orders(None, None).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].order_status, OrderStatus::Placed);

    match CatalogServiceImpl::new(ctx.clone(), shopper)
        .get_product(rice.id, AccountType::B2c)
        .unwrap()
    {
        ProductView::B2c(view) => assert_eq!(view.available_stock, 298),
        other => panic!("unexpected view {:?}", other),
    }
}

#[test]
fn wholesale_buyer_orders_on_credit() {
    let ctx = context();
    let admin = Caller::admin(UserId::new());
    let rice = stocked_rice(&ctx, &admin);

    let user_id = UserId::new();
    let business = BusinessServiceImpl::new(ctx.clone(), Caller::b2b(user_id, None))
        .register(registration())
        .unwrap();
    assert_eq!(business.account_status, BusinessStatus::Pending);

    let back_office = AdminServiceImpl::new(ctx.clone(), admin.clone());
    back_office
        .review_registration(
            business.id,
            ReviewDecision::Approve {
                credit_limit: ProductPrice(50000.0),
                credit_period_days: 30,
            },
        )
        .unwrap();

    let buyer = Caller::b2b(user_id, Some(business.id));
    let cart = CartServiceImpl::new(ctx.clone(), buyer.clone());

    let e = cart
        .add_item(AddToCartPayload {
            product_id: rice.id,
            quantity: Quantity(20),
        })
        .unwrap_err();
    match kind_of(&e) {
        Some(Error::Validate(_)) => {}
        other => panic!("unexpected error {:?}", other),
    }

    let line = cart
        .add_item(AddToCartPayload {
            product_id: rice.id,
            quantity: Quantity(30),
        })
        .unwrap();
    assert_eq!(line.unit_price, ProductPrice(90.0));
    assert_eq!(line.applied_tier, Some("Tier: 10-49 units".to_string()));
    let hint = line.next_tier_info.unwrap();
    assert_eq!(hint.quantity_needed, Quantity(20));
    assert_eq!(hint.price_per_unit, ProductPrice(80.0));

    let line = cart
        .update_item(line.cart_item_id, SetterPayload { value: Quantity(100) })
        .unwrap();
    assert_eq!(line.unit_price, ProductPrice(80.0));
    assert_eq!(line.item_total, ProductPrice(8000.0));
    assert_eq!(line.next_tier_info, None);

    let view = cart.get_cart().unwrap();
    let expected = hashmap! {
        "subtotal" => view.summary.subtotal,
        "delivery" => view.summary.delivery_charges,
        "total" => view.summary.total_amount,
    };
    assert_eq!(
        expected,
        hashmap! {
            "subtotal" => ProductPrice(8000.0),
            "delivery" => ProductPrice(1000.0),
            "total" => ProductPrice(10440.0),
        }
    );
    assert_eq!(view.summary.gst_18, Some(ProductPrice(1440.0)));

    let orders = OrderServiceImpl::new(ctx.clone(), buyer.clone());
    let placed = orders
        .place_b2b_order(B2bOrderRequest {
            delivery_locations: vec![],
            billing_address: None,
            scheduled_date: Utc::now() + Duration::days(3),
            scheduled_time_slot: Some("07:00-10:00".to_string()),
            po_number: Some("SRK-0042".to_string()),
            payment_method: None,
            special_instructions: None,
        })
        .unwrap();
    assert!(placed.order_number.starts_with("B2B"));
    assert_eq!(placed.payment_method, PaymentMethod::Credit);
    assert!(placed.credit_due_date.is_some());

    let accounts = BusinessServiceImpl::new(ctx.clone(), buyer.clone());
    let dashboard = accounts.credit_dashboard().unwrap();
    assert_eq!(dashboard.credit_info.available_credit, ProductPrice(39560.0));
    assert_eq!(dashboard.payment_summary.pending_amount, ProductPrice(10440.0));
    assert_eq!(dashboard.recent_invoices.len(), 1);

    back_office.mark_order_paid(placed.order_id).unwrap();
    let dashboard = accounts.credit_dashboard().unwrap();
    assert_eq!(dashboard.credit_info.available_credit, ProductPrice(50000.0));
    assert_eq!(dashboard.payment_summary.pending_invoices, 0);

    // Cancelling a settled order must not hand the credit back twice
    orders.cancel_order(placed.order_id, None).unwrap();
    let profile = accounts.profile().unwrap();
    assert_eq!(profile.available_credit, ProductPrice(50000.0));
    assert_eq!(profile.used_credit, ProductPrice(0.0));
}

#[test]
fn unapproved_business_cannot_check_out() {
    let ctx = context();
    let admin = Caller::admin(UserId::new());
    let rice = stocked_rice(&ctx, &admin);

    let user_id = UserId::new();
    let business = BusinessServiceImpl::new(ctx.clone(), Caller::b2b(user_id, None))
        .register(registration())
        .unwrap();
    let buyer = Caller::b2b(user_id, Some(business.id));

    CartServiceImpl::new(ctx.clone(), buyer.clone())
        .add_item(AddToCartPayload {
            product_id: rice.id,
            quantity: Quantity(100),
        })
        .unwrap();

    let e = OrderServiceImpl::new(ctx.clone(), buyer)
        .place_b2b_order(B2bOrderRequest {
            delivery_locations: vec![],
            billing_address: None,
            scheduled_date: Utc::now() + Duration::days(3),
            scheduled_time_slot: None,
            po_number: None,
            payment_method: Some(PaymentMethod::Cod),
            special_instructions: None,
        })
        .unwrap_err();
    assert_eq!(kind_of(&e), Some(Error::Forbidden));

    match CatalogServiceImpl::new(ctx, admin)
        .get_product(rice.id, AccountType::B2b)
        .unwrap()
    {
        ProductView::B2b(view) => assert_eq!(view.available_stock, 700),
        other => panic!("unexpected view {:?}", other),
    }
}
