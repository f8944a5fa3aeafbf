pub mod types;
pub use self::types::*;

pub mod admin;
pub use self::admin::*;

pub mod business;
pub use self::business::*;

pub mod cart;
pub use self::cart::*;

pub mod catalog;
pub use self::catalog::*;

pub mod order;
pub use self::order::*;

pub mod report;
pub use self::report::*;

#[cfg(test)]
pub mod testing;
