use chrono::prelude::*;
use rand::{thread_rng, Rng};

use models::AccountType;

fn prefix(order_type: AccountType) -> &'static str {
    match order_type {
        AccountType::B2c => "ORD",
        AccountType::B2b => "B2B",
    }
}

/// Human readable order number: channel prefix, order date and three random digits.
pub fn generate(order_type: AccountType, now: DateTime<Utc>) -> String {
    let suffix: u32 = thread_rng().gen_range(0, 1000);
    format!("{}{}{:03}", prefix(order_type), now.format("%Y%m%d"), suffix)
}
