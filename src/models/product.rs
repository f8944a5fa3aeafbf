use chrono::prelude::*;

use super::AccountType;
use types::*;

/// A quantity band with its own per-unit price. `max_qty` of `None` means the band is unbounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkTier {
    pub min_qty: Quantity,
    #[serde(default)]
    pub max_qty: Option<Quantity>,
    pub price_per_unit: ProductPrice,
}

impl BulkTier {
    pub fn contains(&self, quantity: Quantity) -> bool {
        quantity >= self.min_qty && self.max_qty.map(|max| quantity <= max).unwrap_or(true)
    }

    pub fn label(&self) -> String {
        // a zero maximum reads as open-ended in labels
        match self.max_qty {
            Some(max) if max.0 > 0 => format!("Tier: {}-{} units", self.min_qty, max),
            _ => format!("Tier: {}-∞ units", self.min_qty),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProductStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub unit: String,
    pub quantity_per_unit: f64,
    pub is_vegetarian: bool,
    pub expiry_date: Option<NaiveDate>,
    pub b2c_mrp: ProductPrice,
    pub b2c_selling_price: ProductPrice,
    pub b2c_min_quantity: Quantity,
    pub b2c_max_quantity: Quantity,
    pub b2b_base_price: ProductPrice,
    pub b2b_min_order_qty: Quantity,
    pub b2b_max_order_qty: Option<Quantity>,
    pub b2b_bulk_tiers: Vec<BulkTier>,
    pub total_stock: u32,
    pub b2c_reserved_stock: u32,
    pub b2b_reserved_stock: u32,
    pub status: ProductStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product can be put into a cart
    pub fn is_available(&self) -> bool {
        !self.is_deleted && self.status == ProductStatus::Active
    }

    /// Stock set aside for the given sales channel
    pub fn reserved_stock(&self, channel: AccountType) -> u32 {
        match channel {
            AccountType::B2c => self.b2c_reserved_stock,
            AccountType::B2b => self.b2b_reserved_stock,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = "1", max = "64"))]
    pub sku: String,
    #[validate(length(min = "1", max = "200"))]
    pub name: String,
    pub category_id: CategoryId,
    pub subcategory_id: Option<SubcategoryId>,
    pub brand: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = "1"))]
    pub unit: String,
    pub quantity_per_unit: Option<f64>,
    #[serde(default)]
    pub is_vegetarian: bool,
    pub expiry_date: Option<NaiveDate>,
    pub b2c_mrp: ProductPrice,
    pub b2c_selling_price: ProductPrice,
    pub b2c_min_quantity: Option<Quantity>,
    pub b2c_max_quantity: Option<Quantity>,
    pub b2b_base_price: ProductPrice,
    pub b2b_min_order_qty: Quantity,
    pub b2b_max_order_qty: Option<Quantity>,
    #[serde(default)]
    pub b2b_bulk_tiers: Vec<BulkTier>,
    pub total_stock: u32,
    pub b2c_reserved_stock: Option<u32>,
    pub b2b_reserved_stock: Option<u32>,
}

/// Partial product update. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub quantity_per_unit: Option<f64>,
    pub is_vegetarian: Option<bool>,
    pub expiry_date: Option<NaiveDate>,
    pub b2c_mrp: Option<ProductPrice>,
    pub b2c_selling_price: Option<ProductPrice>,
    pub b2c_min_quantity: Option<Quantity>,
    pub b2c_max_quantity: Option<Quantity>,
    pub b2b_base_price: Option<ProductPrice>,
    pub b2b_min_order_qty: Option<Quantity>,
    pub b2b_max_order_qty: Option<Option<Quantity>>,
    pub b2b_bulk_tiers: Option<Vec<BulkTier>>,
    pub total_stock: Option<u32>,
    pub b2c_reserved_stock: Option<u32>,
    pub b2b_reserved_stock: Option<u32>,
    pub status: Option<ProductStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSearch {
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub search: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct B2cProductView {
    pub product_id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub sku: String,
    pub unit: String,
    pub mrp: ProductPrice,
    pub selling_price: ProductPrice,
    pub discount_percentage: f64,
    pub max_quantity: Quantity,
    pub in_stock: bool,
    pub available_stock: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct B2bProductView {
    pub product_id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub sku: String,
    pub unit: String,
    pub base_price: ProductPrice,
    pub min_order_qty: Quantity,
    pub max_order_qty: Option<Quantity>,
    pub bulk_tiers: Vec<BulkTier>,
    pub in_stock: bool,
    pub available_stock: u32,
}

/// Product as presented to a given account type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductView {
    B2c(B2cProductView),
    B2b(B2bProductView),
}
