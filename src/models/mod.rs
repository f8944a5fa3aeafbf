pub mod address;
pub use self::address::*;

pub mod business;
pub use self::business::*;

pub mod cart;
pub use self::cart::*;

pub mod catalog;
pub use self::catalog::*;

pub mod common;
pub use self::common::*;

pub mod order;
pub use self::order::*;

pub mod order_diff;
pub use self::order_diff::*;

pub mod product;
pub use self::product::*;

pub mod user;
pub use self::user::*;
