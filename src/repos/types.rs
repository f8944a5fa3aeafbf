use std::sync::{Arc, Mutex};

use chrono::prelude::*;
use failure::Error as FailureError;

use acl::{self, Action, Owned};
use models::*;

pub type RepoResult<T> = Result<T, FailureError>;

/// Every persisted record kind, in insertion order
#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub products: Vec<Product>,
    pub carts: Vec<Cart>,
    pub orders: Vec<Order>,
    pub order_diffs: Vec<OrderDiff>,
    pub businesses: Vec<B2bBusiness>,
    pub addresses: Vec<DeliveryAddress>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

pub type RepoConnection<'a> = &'a mut Tables;

/// Shared handle to the store.
#[derive(Clone, Debug, Default)]
pub struct DbPool {
    inner: Arc<Mutex<Tables>>,
}

impl DbPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` as one unit of work. Changes become visible only when `f` returns `Ok`;
    /// on error the store is left exactly as it was.
    pub fn run<T, F>(&self, f: F) -> RepoResult<T>
    where
        F: FnOnce(RepoConnection) -> RepoResult<T>,
    {
        // A panicking unit of work never reaches the commit below, so the tables behind a poisoned lock are intact.
        let mut tables = self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("Store lock was poisoned by a panicked unit of work, recovering");
            poisoned.into_inner()
        });

        let mut transaction = tables.clone();
        let out = f(&mut transaction)?;
        *tables = transaction;

        Ok(out)
    }
}

/// Applies the after-operation access check of a user-bound repo.
pub fn ensure_access<T: Owned>(acl: &Option<Caller>, rows: &[T], action: Action) -> RepoResult<()> {
    if let Some(caller) = acl {
        for row in rows {
            acl::check(caller, row, action)?;
        }
    }
    Ok(())
}

/// Latest first. Rows created at the same instant keep reverse insertion order.
pub fn newest_first<T, F>(mut rows: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.reverse();
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
}
