use std::fmt;
use std::str::FromStr;

use chrono::prelude::*;
use chrono::Duration;

use super::{AccountType, PostalAddress};
use errors::Error;
use types::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Set on order creation
    #[serde(rename = "placed")]
    Placed,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "dispatched")]
    Dispatched,
    #[serde(rename = "delivered")]
    Delivered,
    /// Only placed orders can be cancelled by the customer
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Position along the fulfilment path, `None` for cancelled
    fn stage(self) -> Option<u8> {
        use self::OrderStatus::*;

        match self {
            Placed => Some(0),
            Confirmed => Some(1),
            Processing => Some(2),
            Dispatched => Some(3),
            Delivered => Some(4),
            Cancelled => None,
        }
    }

    /// Fulfilment only moves forward. Anything not yet delivered can still be cancelled.
    pub fn can_become(self, next: OrderStatus) -> bool {
        match (self.stage(), next.stage()) {
            (Some(current), Some(next)) => next > current,
            (Some(_), None) => self != OrderStatus::Delivered,
            (None, _) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::OrderStatus::*;

        let s = match self {
            Placed => "placed",
            Confirmed => "confirmed",
            Processing => "processing",
            Dispatched => "dispatched",
            Delivered => "delivered",
            Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use self::OrderStatus::*;

        Ok(match s {
            "placed" => Placed,
            "confirmed" => Confirmed,
            "processing" => Processing,
            "dispatched" => Dispatched,
            "delivered" => Delivered,
            "cancelled" => Cancelled,
            _ => return Err(Error::ParseError),
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cod")]
    Cod,
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "online")]
    Online,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cod
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Express delivery windows offered to retail customers
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DeliverySlot {
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1hr")]
    OneHour,
    #[serde(rename = "scheduled")]
    Scheduled,
}

impl DeliverySlot {
    /// Time until arrival for express slots
    pub fn lead_time(&self) -> Option<Duration> {
        match self {
            DeliverySlot::FifteenMinutes => Some(Duration::minutes(15)),
            DeliverySlot::ThirtyMinutes => Some(Duration::minutes(30)),
            DeliverySlot::OneHour => Some(Duration::hours(1)),
            DeliverySlot::Scheduled => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryLocation {
    pub location_id: Option<AddressId>,
    pub label: Option<String>,
    pub address_line1: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryInfo {
    Retail {
        address: PostalAddress,
        slot: Option<DeliverySlot>,
        scheduled_date: Option<DateTime<Utc>>,
        instructions: Option<String>,
    },
    Wholesale {
        locations: Vec<DeliveryLocation>,
        billing_address: Option<PostalAddress>,
        scheduled_date: DateTime<Utc>,
        scheduled_time_slot: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: Quantity,
    pub unit_price: ProductPrice,
    pub applied_tier: Option<String>,
    pub item_total: ProductPrice,
    pub delivery_location_id: Option<AddressId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub business_id: Option<BusinessId>,
    pub order_type: AccountType,
    pub po_number: Option<String>,
    pub order_date: DateTime<Utc>,
    pub delivery_info: DeliveryInfo,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub subtotal: ProductPrice,
    pub gst_amount: ProductPrice,
    pub delivery_charges: ProductPrice,
    pub total_amount: ProductPrice,
    pub credit_used: ProductPrice,
    pub due_date: Option<DateTime<Utc>>,
    pub special_instructions: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity.0).sum()
    }

    pub fn is_credit(&self) -> bool {
        self.payment_method == PaymentMethod::Credit
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct B2cOrderRequest {
    pub delivery_address: PostalAddress,
    pub delivery_slot: Option<DeliverySlot>,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[validate(length(max = "500"))]
    pub delivery_instructions: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct B2bOrderRequest {
    #[serde(default)]
    pub delivery_locations: Vec<DeliveryLocation>,
    pub billing_address: Option<PostalAddress>,
    pub scheduled_date: DateTime<Utc>,
    pub scheduled_time_slot: Option<String>,
    #[validate(length(max = "64"))]
    pub po_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(length(max = "1000"))]
    pub special_instructions: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDelivery {
    pub location: Option<String>,
    pub delivery_date: DateTime<Utc>,
    pub time_slot: Option<String>,
}

/// Outcome of a successful checkout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: String,
    pub order_type: AccountType,
    pub total_amount: ProductPrice,
    pub payment_method: PaymentMethod,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub credit_due_date: Option<DateTime<Utc>>,
    pub scheduled_deliveries: Vec<ScheduledDelivery>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnavailableItem {
    pub product: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub product: String,
    pub old_price: ProductPrice,
    pub new_price: ProductPrice,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReorderReport {
    pub items_added: Vec<String>,
    pub unavailable_items: Vec<UnavailableItem>,
    pub price_changes: Vec<PriceChange>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminOrderFilter {
    pub order_type: Option<AccountType>,
    pub order_status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
