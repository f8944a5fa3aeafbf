pub mod types;
pub use self::types::*;

pub mod address;
pub use self::address::{AddressFilter, AddressRepo, AddressRepoImpl};

pub mod business;
pub use self::business::{BusinessFilter, BusinessRepo, BusinessRepoImpl, BusinessReview};

pub mod cart;
pub use self::cart::{CartFilter, CartRepo, CartRepoImpl};

pub mod category;
pub use self::category::{CategoryFilter, CategoryRepo, CategoryRepoImpl, SubcategoryFilter};

pub mod order;
pub use self::order::{OrderFilter, OrderRepo, OrderRepoImpl, OrderUpdateData, OrderUpdater};

pub mod order_diff;
pub use self::order_diff::{OrderDiffFilter, OrderDiffRepo, OrderDiffRepoImpl};

pub mod product;
pub use self::product::{ProductFilter, ProductRepo, ProductRepoImpl, ProductUpdater};

use models::Caller;

/// Hands out repos bound to a caller, or unrestricted ones when `caller` is `None`
pub trait ReposFactory: Send + Sync {
    fn create_product_repo(&self, caller: Option<Caller>) -> Box<dyn ProductRepo>;
    fn create_cart_repo(&self, caller: Option<Caller>) -> Box<dyn CartRepo>;
    fn create_order_repo(&self, caller: Option<Caller>) -> Box<dyn OrderRepo>;
    fn create_order_diff_repo(&self) -> Box<dyn OrderDiffRepo>;
    fn create_business_repo(&self, caller: Option<Caller>) -> Box<dyn BusinessRepo>;
    fn create_address_repo(&self, caller: Option<Caller>) -> Box<dyn AddressRepo>;
    fn create_category_repo(&self, caller: Option<Caller>) -> Box<dyn CategoryRepo>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReposFactoryImpl;

impl ReposFactory for ReposFactoryImpl {
    fn create_product_repo(&self, caller: Option<Caller>) -> Box<dyn ProductRepo> {
        Box::new(caller.map(product::make_repo).unwrap_or_else(product::make_su_repo))
    }

    fn create_cart_repo(&self, caller: Option<Caller>) -> Box<dyn CartRepo> {
        Box::new(caller.map(cart::make_repo).unwrap_or_else(cart::make_su_repo))
    }

    fn create_order_repo(&self, caller: Option<Caller>) -> Box<dyn OrderRepo> {
        Box::new(caller.map(order::make_repo).unwrap_or_else(order::make_su_repo))
    }

    fn create_order_diff_repo(&self) -> Box<dyn OrderDiffRepo> {
        Box::new(order_diff::make_su_repo())
    }

    fn create_business_repo(&self, caller: Option<Caller>) -> Box<dyn BusinessRepo> {
        Box::new(caller.map(business::make_repo).unwrap_or_else(business::make_su_repo))
    }

    fn create_address_repo(&self, caller: Option<Caller>) -> Box<dyn AddressRepo> {
        Box::new(caller.map(address::make_repo).unwrap_or_else(address::make_su_repo))
    }

    fn create_category_repo(&self, caller: Option<Caller>) -> Box<dyn CategoryRepo> {
        Box::new(caller.map(category::make_repo).unwrap_or_else(category::make_su_repo))
    }
}
