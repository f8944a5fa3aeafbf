//! Price resolution for both sales channels.
//!
//! The wholesale side resolves a unit price from a product's bulk tiers: among all tiers
//! whose inclusive `[min_qty, max_qty]` band contains the quantity, the one with the highest
//! `min_qty` wins. When nothing matches, the base price applies and no tier label is reported.
//! The rest of this module holds the order-level arithmetic (delivery bands, GST, totals).

use failure::Error as FailureError;

use config::Config;
use errors::Error;
use models::{AccountType, BulkTier};
use types::*;

/// Unit price resolved for a quantity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierPrice {
    pub unit_price: ProductPrice,
    pub applied_tier: Option<String>,
}

/// Upsell hint pointing at the next cheaper band
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NextTierInfo {
    pub quantity_needed: Quantity,
    pub price_per_unit: ProductPrice,
    /// Difference between the current total and the total at the next tier's minimum, never negative
    pub savings: ProductPrice,
}

/// Full answer for one priced line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierQuote {
    pub unit_price: ProductPrice,
    pub applied_tier: Option<String>,
    pub item_total: ProductPrice,
    pub next_tier_info: Option<NextTierInfo>,
}

pub fn calculate_b2b_price(base_price: ProductPrice, quantity: Quantity, tiers: &[BulkTier]) -> TierPrice {
    let mut sorted = tiers.iter().collect::<Vec<_>>();
    // Stable, so equal thresholds keep their table order
    sorted.sort_by(|a, b| b.min_qty.cmp(&a.min_qty));

    match sorted.into_iter().find(|tier| tier.contains(quantity)) {
        Some(tier) => TierPrice {
            unit_price: tier.price_per_unit,
            applied_tier: Some(tier.label()),
        },
        None => TierPrice {
            unit_price: base_price,
            applied_tier: None,
        },
    }
}

pub fn next_tier_info(quantity: Quantity, tiers: &[BulkTier]) -> Option<NextTierInfo> {
    if tiers.is_empty() {
        return None;
    }

    let mut sorted = tiers.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.min_qty.cmp(&b.min_qty));

    let current = calculate_b2b_price(ProductPrice(0.0), quantity, tiers);

    sorted.into_iter().find(|tier| quantity < tier.min_qty).map(|tier| {
        let current_total = current.unit_price.times(quantity);
        let next_total = tier.price_per_unit.times(tier.min_qty);
        let savings = current_total.0 - next_total.0;

        NextTierInfo {
            quantity_needed: Quantity(tier.min_qty.0 - quantity.0),
            price_per_unit: tier.price_per_unit,
            savings: ProductPrice(if savings > 0.0 { savings } else { 0.0 }),
        }
    })
}

pub fn quote(base_price: ProductPrice, quantity: Quantity, tiers: &[BulkTier]) -> TierQuote {
    let TierPrice { unit_price, applied_tier } = calculate_b2b_price(base_price, quantity, tiers);

    TierQuote {
        unit_price,
        applied_tier,
        item_total: unit_price.times(quantity),
        next_tier_info: next_tier_info(quantity, tiers),
    }
}

/// Rejects tables the resolver would silently ignore: empty or inverted bands and free units.
pub fn validate_tiers(tiers: &[BulkTier]) -> Result<(), FailureError> {
    for tier in tiers {
        if tier.min_qty.0 == 0 {
            return Err(format_err!("Tier minimum must be at least 1")
                .context(Error::Validate(tier.label()))
                .into());
        }
        if let Some(max) = tier.max_qty {
            if max < tier.min_qty {
                return Err(format_err!("Tier maximum {} is below its minimum {}", max, tier.min_qty)
                    .context(Error::Validate(tier.label()))
                    .into());
            }
        }
        if tier.price_per_unit.0 <= 0.0 {
            return Err(format_err!("Tier price must be positive")
                .context(Error::Validate(tier.label()))
                .into());
        }
    }
    Ok(())
}

pub fn b2c_delivery_charges(config: &Config, subtotal: ProductPrice) -> ProductPrice {
    if subtotal.0 > config.b2c.free_delivery_above {
        ProductPrice(0.0)
    } else {
        ProductPrice(config.b2c.delivery_charge)
    }
}

pub fn b2b_delivery_charges(config: &Config, subtotal: ProductPrice) -> ProductPrice {
    let b2b = &config.b2b;
    if subtotal.0 > b2b.free_delivery_above {
        ProductPrice(0.0)
    } else if subtotal.0 >= b2b.reduced_delivery_from {
        ProductPrice(b2b.reduced_delivery_charge)
    } else {
        ProductPrice(b2b.standard_delivery_charge)
    }
}

pub fn gst_amount(config: &Config, subtotal: ProductPrice) -> ProductPrice {
    ProductPrice(subtotal.0 * config.b2b.gst_rate).round()
}

/// Percentage off the maximum retail price, rounded to two decimals
pub fn discount_percentage(mrp: ProductPrice, selling_price: ProductPrice) -> f64 {
    if mrp.0 <= 0.0 {
        return 0.0;
    }
    let discount = (mrp.0 - selling_price.0) / mrp.0 * 100.0;
    (discount * 100.0).round() / 100.0
}

/// Order-level totals for a set of priced lines
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartTotals {
    pub total_items: u32,
    pub subtotal: ProductPrice,
    pub delivery_charges: ProductPrice,
    pub gst_amount: ProductPrice,
    pub total_amount: ProductPrice,
}

impl CartTotals {
    pub fn compute<I>(config: &Config, account_type: AccountType, lines: I) -> Self
    where
        I: IntoIterator<Item = (ProductPrice, Quantity)>,
    {
        let mut total_items = 0;
        let mut subtotal = 0.0;
        for (unit_price, quantity) in lines {
            total_items += quantity.0;
            subtotal += unit_price.times(quantity).0;
        }
        let subtotal = ProductPrice(subtotal).round();
        if total_items == 0 {
            return Self::default();
        }

        let (delivery_charges, gst_amount) = match account_type {
            AccountType::B2c => (b2c_delivery_charges(config, subtotal), ProductPrice(0.0)),
            AccountType::B2b => (b2b_delivery_charges(config, subtotal), gst_amount(config, subtotal)),
        };

        Self {
            total_items,
            subtotal,
            delivery_charges,
            gst_amount,
            total_amount: ProductPrice(subtotal.0 + delivery_charges.0 + gst_amount.0).round(),
        }
    }
}
