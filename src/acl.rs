use failure::Error as FailureError;

use errors::Error;
use models::*;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Read,
    Write,
    Delete,
}

/// Records that belong to a customer or a business
pub trait Owned {
    fn is_owned_by(&self, caller: &Caller) -> bool;

    /// Catalog entries can be read by anyone
    fn is_public(&self) -> bool {
        false
    }
}

pub fn allows<T: Owned>(caller: &Caller, entry: &T, action: Action) -> bool {
    if caller.is_admin() {
        return true;
    }

    if entry.is_public() && action == Action::Read {
        return true;
    }

    if entry.is_owned_by(caller) {
        return action != Action::Delete;
    }

    false
}

pub fn check<T: Owned>(caller: &Caller, entry: &T, action: Action) -> Result<(), FailureError> {
    if allows(caller, entry, action) {
        Ok(())
    } else {
        Err(format_err!("Denied {:?} access for user {}", action, caller.user_id)
            .context(Error::Forbidden)
            .into())
    }
}

pub fn check_admin(caller: &Caller) -> Result<(), FailureError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(format_err!("User {} is not an administrator", caller.user_id)
            .context(Error::Forbidden)
            .into())
    }
}

impl Owned for Cart {
    fn is_owned_by(&self, caller: &Caller) -> bool {
        self.user_id == caller.user_id
    }
}

impl Owned for Order {
    fn is_owned_by(&self, caller: &Caller) -> bool {
        self.user_id == caller.user_id
    }
}

impl Owned for B2bBusiness {
    fn is_owned_by(&self, caller: &Caller) -> bool {
        self.user_id == caller.user_id
    }
}

impl Owned for DeliveryAddress {
    fn is_owned_by(&self, caller: &Caller) -> bool {
        caller.business_id == Some(self.business_id)
    }
}

impl Owned for Product {
    fn is_owned_by(&self, _caller: &Caller) -> bool {
        false
    }

    fn is_public(&self) -> bool {
        true
    }
}

impl Owned for Category {
    fn is_owned_by(&self, _caller: &Caller) -> bool {
        false
    }

    fn is_public(&self) -> bool {
        true
    }
}

impl Owned for Subcategory {
    fn is_owned_by(&self, _caller: &Caller) -> bool {
        false
    }

    fn is_public(&self) -> bool {
        true
    }
}
