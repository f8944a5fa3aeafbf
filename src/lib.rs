extern crate chrono;
extern crate config as config_crate;
extern crate csv;
#[macro_use]
extern crate derive_more;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate rand;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate uuid;
extern crate validator;
#[macro_use]
extern crate validator_derive;

#[cfg(test)]
#[macro_use]
extern crate maplit;

pub mod acl;
pub mod config;
pub mod errors;
pub mod models;
pub mod order_number;
pub mod pricing;
pub mod repos;
pub mod services;
pub mod types;
