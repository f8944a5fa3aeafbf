use chrono::prelude::*;

use super::AccountType;
use pricing::NextTierInfo;
use types::*;

/// Line of a cart. The unit price is fixed when the line is added or updated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: ProductPrice,
    pub applied_tier: Option<String>,
}

impl CartItem {
    pub fn item_total(&self) -> ProductPrice {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub account_type: AccountType,
    pub business_id: Option<BusinessId>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_for_product_mut(&mut self, product_id: ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.product_id == product_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddToCartPayload {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

pub type CartQuantityPayload = super::SetterPayload<Quantity>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: ProductPrice,
    pub applied_tier: Option<String>,
    pub item_total: ProductPrice,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub total_items: u32,
    pub subtotal: ProductPrice,
    pub delivery_charges: ProductPrice,
    /// Present for wholesale carts only
    pub gst_18: Option<ProductPrice>,
    pub total_amount: ProductPrice,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditInfo {
    pub credit_available: ProductPrice,
    pub credit_after_order: ProductPrice,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: Option<CartId>,
    pub account_type: AccountType,
    pub items: Vec<CartLine>,
    pub summary: CartSummary,
    pub credit_info: Option<CreditInfo>,
}

/// Result of adding a product or changing its quantity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItemChanged {
    pub cart_item_id: CartItemId,
    pub quantity: Quantity,
    pub unit_price: ProductPrice,
    pub applied_tier: Option<String>,
    pub item_total: ProductPrice,
    pub next_tier_info: Option<NextTierInfo>,
}

impl CartItemChanged {
    pub fn new(item: &CartItem, next_tier_info: Option<NextTierInfo>) -> Self {
        Self {
            cart_item_id: item.id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            applied_tier: item.applied_tier.clone(),
            item_total: item.item_total(),
            next_tier_info,
        }
    }
}
