//! Fixtures shared by the service unit tests

use chrono::prelude::*;

use super::types::*;
use config::Config;
use models::*;
use repos::business::tests::business;
use repos::{BusinessReview, DbPool};
use types::*;

pub fn context() -> ServiceContext {
    ServiceContext::new(DbPool::new(), Config::default())
}

pub fn tiers() -> Vec<BulkTier> {
    vec![
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
    ]
}

pub fn stock_product(ctx: &ServiceContext, product: Product) -> Product {
    ctx.db_pool
        .run(|conn| ctx.repo_factory.create_product_repo(None).create(conn, product))
        .unwrap()
}

/// Wholesale caller whose business is approved with the given limit and a 15 day period
pub fn approved_business(ctx: &ServiceContext, credit_limit: f64) -> (Caller, B2bBusiness) {
    let user_id = UserId::new();
    let pending = business(user_id, "27AAPFU0939F1ZV");

    let approved = ctx
        .db_pool
        .run(|conn| {
            let repo = ctx.repo_factory.create_business_repo(None);
            repo.create(conn, pending.clone())?;
            repo.review(
                conn,
                pending.id,
                BusinessReview::Approved {
                    credit_limit: ProductPrice(credit_limit),
                    credit_period_days: 15,
                    approved_by: UserId::new(),
                    approval_date: Utc::now(),
                },
            )
        })
        .unwrap();

    (Caller::b2b(user_id, Some(approved.id)), approved)
}

pub fn retail_address() -> PostalAddress {
    PostalAddress {
        address_line1: "7 Linking Road".to_string(),
        address_line2: Some("Bandra West".to_string()),
        city: "Mumbai".to_string(),
        state: "MH".to_string(),
        pincode: "400050".to_string(),
    }
}
