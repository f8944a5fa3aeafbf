//! Reads `{"base_price": .., "quantity": .., "tiers": [..]}` from stdin and prints the resolved quote.

extern crate env_logger;
extern crate failure;
extern crate grocery_lib;
#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

use std::io;
use std::process::exit;

use failure::Error as FailureError;

use grocery_lib::models::BulkTier;
use grocery_lib::pricing;
use grocery_lib::types::{ProductPrice, Quantity};

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    base_price: ProductPrice,
    quantity: Quantity,
    #[serde(default)]
    tiers: Vec<BulkTier>,
}

fn run() -> Result<String, FailureError> {
    let request: QuoteRequest = serde_json::from_reader(io::stdin())?;
    debug!("Quoting {:?}", request);

    pricing::validate_tiers(&request.tiers)?;
    let quote = pricing::quote(request.base_price, request.quantity, &request.tiers);
    Ok(serde_json::to_string_pretty(&quote)?)
}

fn main() {
    env_logger::init();

    match run() {
        Ok(out) => println!("{}", out),
        Err(e) => {
            error!("Failed to quote: {}", e);
            eprintln!("{}", e);
            exit(1);
        }
    }
}
