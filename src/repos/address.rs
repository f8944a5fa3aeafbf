use acl::Action;
use errors::Error;
use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct AddressFilter {
    pub id: Option<AddressId>,
    pub business_id: Option<BusinessId>,
    pub is_active: Option<bool>,
}

impl AddressFilter {
    fn matches(&self, address: &DeliveryAddress) -> bool {
        self.id.map(|v| v == address.id).unwrap_or(true)
            && self.business_id.map(|v| v == address.business_id).unwrap_or(true)
            && self.is_active.map(|v| v == address.is_active).unwrap_or(true)
    }
}

pub trait AddressRepo {
    /// A new default address takes the flag away from the business's other addresses
    fn create(&self, conn: RepoConnection, address: DeliveryAddress) -> RepoResult<DeliveryAddress>;
    /// Default address first, then newest first
    fn get(&self, conn: RepoConnection, mask: AddressFilter) -> RepoResult<Vec<DeliveryAddress>>;
    fn update(&self, conn: RepoConnection, id: AddressId, data: DeliveryAddressUpdate) -> RepoResult<DeliveryAddress>;
    /// Hides the address from listings
    fn deactivate(&self, conn: RepoConnection, id: AddressId) -> RepoResult<DeliveryAddress>;
}

pub struct AddressRepoImpl {
    acl: Option<Caller>,
}

type Repo = AddressRepoImpl;

pub fn make_su_repo() -> Repo {
    AddressRepoImpl { acl: None }
}

pub fn make_repo(caller: Caller) -> Repo {
    AddressRepoImpl { acl: Some(caller) }
}

fn clear_default(conn: &mut Tables, business_id: BusinessId, except: AddressId) {
    for address in conn
        .addresses
        .iter_mut()
        .filter(|a| a.business_id == business_id && a.id != except)
    {
        address.is_default = false;
    }
}

impl AddressRepoImpl {
    fn row_mut<'a>(&self, conn: &'a mut Tables, id: AddressId) -> RepoResult<&'a mut DeliveryAddress> {
        let address = conn
            .addresses
            .iter_mut()
            .find(|a| a.id == id && a.is_active)
            .ok_or_else(|| format_err!("Delivery address {} not found", id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[address.clone()], Action::Write)?;
        Ok(address)
    }
}

impl AddressRepo for AddressRepoImpl {
    fn create(&self, conn: RepoConnection, address: DeliveryAddress) -> RepoResult<DeliveryAddress> {
        ensure_access(&self.acl, &[address.clone()], Action::Write)?;

        if address.is_default {
            clear_default(conn, address.business_id, address.id);
        }
        conn.addresses.push(address.clone());
        Ok(address)
    }

    fn get(&self, conn: RepoConnection, mask: AddressFilter) -> RepoResult<Vec<DeliveryAddress>> {
        let rows = conn.addresses.iter().filter(|a| mask.matches(a)).cloned().collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;

        let mut rows = newest_first(rows, |a| a.created_at);
        rows.sort_by_key(|a| !a.is_default);
        Ok(rows)
    }

    fn update(&self, conn: RepoConnection, id: AddressId, data: DeliveryAddressUpdate) -> RepoResult<DeliveryAddress> {
        let updated = {
            let address = self.row_mut(conn, id)?;

            if let Some(label) = data.label {
                address.label = label;
            }
            if let Some(postal) = data.address {
                address.address = postal;
            }
            if let Some(person) = data.contact_person {
                address.contact_person = Some(person);
            }
            if let Some(mobile) = data.contact_mobile {
                address.contact_mobile = Some(mobile);
            }
            if let Some(is_default) = data.is_default {
                address.is_default = is_default;
            }
            address.clone()
        };

        if updated.is_default {
            clear_default(conn, updated.business_id, updated.id);
        }
        Ok(updated)
    }

    fn deactivate(&self, conn: RepoConnection, id: AddressId) -> RepoResult<DeliveryAddress> {
        let address = self.row_mut(conn, id)?;
        address.is_active = false;
        address.is_default = false;
        Ok(address.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::prelude::*;

    use super::*;

    fn address(business_id: BusinessId, label: &str, is_default: bool) -> DeliveryAddress {
        DeliveryAddress {
            id: AddressId::new(),
            business_id,
            label: label.to_string(),
            address: PostalAddress {
                address_line1: "21 Park Street".to_string(),
                address_line2: None,
                city: "Kolkata".to_string(),
                state: "WB".to_string(),
                pincode: "700016".to_string(),
            },
            contact_person: None,
            contact_mobile: None,
            is_default,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_default_per_business() {
        let pool = DbPool::new();
        let business_id = BusinessId::new();
        let repo = make_repo(Caller::b2b(UserId::new(), Some(business_id)));

        let first = address(business_id, "Main kitchen", true);
        let second = address(business_id, "Warehouse", true);
        pool.run(|conn| {
            repo.create(conn, first.clone())?;
            repo.create(conn, second.clone())
        })
        .unwrap();

        let listed = pool
            .run(|conn| {
                repo.get(
                    conn,
                    AddressFilter {
                        business_id: Some(business_id),
                        is_active: Some(true),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert!(listed[0].is_default);
        assert!(!listed[1].is_default);

        let updated = pool
            .run(|conn| {
                repo.update(
                    conn,
                    first.id,
                    DeliveryAddressUpdate {
                        is_default: Some(true),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert!(updated.is_default);

        let listed = pool
            .run(|conn| {
                repo.get(
                    conn,
                    AddressFilter {
                        business_id: Some(business_id),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed.iter().filter(|a| a.is_default).count(), 1);
    }

    #[test]
    fn deactivated_address_is_gone() {
        let pool = DbPool::new();
        let business_id = BusinessId::new();
        let repo = make_repo(Caller::b2b(UserId::new(), Some(business_id)));
        let a = address(business_id, "Outlet", false);

        pool.run(|conn| {
            repo.create(conn, a.clone())?;
            repo.deactivate(conn, a.id)
        })
        .unwrap();

        let e = pool.run(|conn| repo.deactivate(conn, a.id)).unwrap_err();
        assert_eq!(::errors::kind_of(&e), Some(Error::NotFound));
    }
}
