use chrono::prelude::*;
use regex::Regex;

use types::*;

lazy_static! {
    pub static ref PINCODE: Regex = Regex::new(r"^[1-9][0-9]{5}$").unwrap();
    pub static ref MOBILE_NUMBER: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct PostalAddress {
    #[validate(length(min = "1"))]
    pub address_line1: String,
    pub address_line2: Option<String>,
    #[validate(length(min = "1"))]
    pub city: String,
    #[validate(length(min = "1"))]
    pub state: String,
    #[validate(regex = "PINCODE")]
    pub pincode: String,
}

/// Drop point registered by a business for wholesale deliveries
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub id: AddressId,
    pub business_id: BusinessId,
    pub label: String,
    pub address: PostalAddress,
    pub contact_person: Option<String>,
    pub contact_mobile: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDeliveryAddress {
    #[validate(length(min = "1", max = "100"))]
    pub label: String,
    pub address: PostalAddress,
    pub contact_person: Option<String>,
    pub contact_mobile: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddressUpdate {
    pub label: Option<String>,
    pub address: Option<PostalAddress>,
    pub contact_person: Option<String>,
    pub contact_mobile: Option<String>,
    pub is_default: Option<bool>,
}
