use std::fmt;

use chrono::prelude::*;
use regex::Regex;

use super::address::{PostalAddress, MOBILE_NUMBER};
use super::order::PaymentStatus;
use types::*;

lazy_static! {
    static ref GST_NUMBER: Regex = Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").unwrap();
    static ref PAN_NUMBER: Regex = Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap();
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BusinessType {
    Restaurant,
    Hotel,
    RetailStore,
    Office,
    Cafe,
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BusinessStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "approved")]
    Approved,
    #[serde(rename = "rejected")]
    Rejected,
}

impl fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BusinessStatus::Pending => write!(f, "pending"),
            BusinessStatus::Approved => write!(f, "approved"),
            BusinessStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct ContactPerson {
    #[validate(length(min = "1"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(regex = "MOBILE_NUMBER")]
    pub mobile: String,
}

/// Wholesale customer account with its credit ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct B2bBusiness {
    pub id: BusinessId,
    pub user_id: UserId,
    pub business_name: String,
    pub business_type: BusinessType,
    pub gst_number: String,
    pub pan_number: String,
    pub registration_number: Option<String>,
    pub contact_person: ContactPerson,
    pub business_address: PostalAddress,
    pub account_status: BusinessStatus,
    pub credit_limit: ProductPrice,
    pub credit_period_days: u32,
    pub available_credit: ProductPrice,
    pub used_credit: ProductPrice,
    pub approval_date: Option<DateTime<Utc>>,
    pub approved_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewBusiness {
    #[validate(length(min = "1", max = "200"))]
    pub business_name: String,
    pub business_type: BusinessType,
    #[validate(regex = "GST_NUMBER")]
    pub gst_number: String,
    #[validate(regex = "PAN_NUMBER")]
    pub pan_number: String,
    pub registration_number: Option<String>,
    pub contact_person: ContactPerson,
    pub business_address: PostalAddress,
}

/// Administrator's verdict on a pending registration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve {
        credit_limit: ProductPrice,
        credit_period_days: u32,
    },
    Reject {
        rejection_reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub total_limit: ProductPrice,
    pub available_credit: ProductPrice,
    pub used_credit: ProductPrice,
    pub credit_period_days: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub pending_amount: ProductPrice,
    pub overdue_amount: ProductPrice,
    pub pending_invoices: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub order_number: String,
    pub invoice_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub amount: ProductPrice,
    pub status: PaymentStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditDashboard {
    pub business_id: BusinessId,
    pub business_name: String,
    pub credit_info: CreditSummary,
    pub payment_summary: PaymentSummary,
    pub recent_invoices: Vec<Invoice>,
}
