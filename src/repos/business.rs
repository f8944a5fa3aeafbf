use chrono::prelude::*;

use acl::Action;
use errors::Error;
use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct BusinessFilter {
    pub id: Option<BusinessId>,
    pub user_id: Option<UserId>,
    pub account_status: Option<BusinessStatus>,
}

impl BusinessFilter {
    fn matches(&self, business: &B2bBusiness) -> bool {
        self.id.map(|v| v == business.id).unwrap_or(true)
            && self.user_id.map(|v| v == business.user_id).unwrap_or(true)
            && self.account_status.map(|v| v == business.account_status).unwrap_or(true)
    }
}

/// Outcome of an administrator's review
#[derive(Clone, Debug)]
pub enum BusinessReview {
    Approved {
        credit_limit: ProductPrice,
        credit_period_days: u32,
        approved_by: UserId,
        approval_date: DateTime<Utc>,
    },
    Rejected {
        reason: String,
    },
}

pub trait BusinessRepo {
    fn create(&self, conn: RepoConnection, business: B2bBusiness) -> RepoResult<B2bBusiness>;
    /// Newest first
    fn get(&self, conn: RepoConnection, mask: BusinessFilter) -> RepoResult<Vec<B2bBusiness>>;
    fn find(&self, conn: RepoConnection, id: BusinessId) -> RepoResult<Option<B2bBusiness>>;
    fn review(&self, conn: RepoConnection, id: BusinessId, review: BusinessReview) -> RepoResult<B2bBusiness>;
    /// Moves `amount` from available to used credit
    fn debit_credit(&self, conn: RepoConnection, id: BusinessId, amount: ProductPrice) -> RepoResult<B2bBusiness>;
    /// Moves `amount` from used back to available credit
    fn restore_credit(&self, conn: RepoConnection, id: BusinessId, amount: ProductPrice) -> RepoResult<B2bBusiness>;
}

pub struct BusinessRepoImpl {
    acl: Option<Caller>,
}

type Repo = BusinessRepoImpl;

pub fn make_su_repo() -> Repo {
    BusinessRepoImpl { acl: None }
}

pub fn make_repo(caller: Caller) -> Repo {
    BusinessRepoImpl { acl: Some(caller) }
}

impl BusinessRepoImpl {
    fn row_mut<'a>(&self, conn: &'a mut Tables, id: BusinessId, action: Action) -> RepoResult<&'a mut B2bBusiness> {
        let business = conn
            .businesses
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| format_err!("Business {} not found", id).context(Error::NotFound))?;
        ensure_access(&self.acl, &[business.clone()], action)?;
        Ok(business)
    }
}

impl BusinessRepo for BusinessRepoImpl {
    fn create(&self, conn: RepoConnection, business: B2bBusiness) -> RepoResult<B2bBusiness> {
        ensure_access(&self.acl, &[business.clone()], Action::Write)?;

        if conn.businesses.iter().any(|b| b.user_id == business.user_id) {
            return Err(format_err!("User {} already registered a business", business.user_id)
                .context(Error::AlreadyExists)
                .into());
        }
        if conn.businesses.iter().any(|b| b.gst_number == business.gst_number) {
            return Err(format_err!("GST number {} is already registered", business.gst_number)
                .context(Error::AlreadyExists)
                .into());
        }

        conn.businesses.push(business.clone());
        Ok(business)
    }

    fn get(&self, conn: RepoConnection, mask: BusinessFilter) -> RepoResult<Vec<B2bBusiness>> {
        let rows = conn.businesses.iter().filter(|b| mask.matches(b)).cloned().collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;
        Ok(newest_first(rows, |b| b.created_at))
    }

    fn find(&self, conn: RepoConnection, id: BusinessId) -> RepoResult<Option<B2bBusiness>> {
        self.get(
            conn,
            BusinessFilter {
                id: Some(id),
                ..Default::default()
            },
        )
        .map(|mut rows| rows.pop())
    }

    fn review(&self, conn: RepoConnection, id: BusinessId, review: BusinessReview) -> RepoResult<B2bBusiness> {
        let business = self.row_mut(conn, id, Action::Write)?;

        if business.account_status != BusinessStatus::Pending {
            return Err(format_err!("Business {} is already {}", id, business.account_status)
                .context(Error::InvalidState)
                .into());
        }

        match review {
            BusinessReview::Approved {
                credit_limit,
                credit_period_days,
                approved_by,
                approval_date,
            } => {
                business.account_status = BusinessStatus::Approved;
                business.credit_limit = credit_limit;
                business.credit_period_days = credit_period_days;
                business.available_credit = credit_limit;
                business.used_credit = ProductPrice(0.0);
                business.approved_by = Some(approved_by);
                business.approval_date = Some(approval_date);
            }
            BusinessReview::Rejected { reason } => {
                business.account_status = BusinessStatus::Rejected;
                business.rejection_reason = Some(reason);
            }
        }

        Ok(business.clone())
    }

    fn debit_credit(&self, conn: RepoConnection, id: BusinessId, amount: ProductPrice) -> RepoResult<B2bBusiness> {
        let business = self.row_mut(conn, id, Action::Write)?;

        if business.available_credit < amount {
            return Err(format_err!(
                "Credit of {} is insufficient: available {}, required {}",
                business.business_name,
                business.available_credit,
                amount
            )
            .context(Error::InsufficientCredit)
            .into());
        }

        business.available_credit = ProductPrice(business.available_credit.0 - amount.0).round();
        business.used_credit = ProductPrice(business.used_credit.0 + amount.0).round();
        Ok(business.clone())
    }

    fn restore_credit(&self, conn: RepoConnection, id: BusinessId, amount: ProductPrice) -> RepoResult<B2bBusiness> {
        let business = self.row_mut(conn, id, Action::Write)?;

        business.available_credit = ProductPrice(business.available_credit.0 + amount.0).round();
        business.used_credit = ProductPrice((business.used_credit.0 - amount.0).max(0.0)).round();
        Ok(business.clone())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn business(user_id: UserId, gst_number: &str) -> B2bBusiness {
        B2bBusiness {
            id: BusinessId::new(),
            user_id,
            business_name: "Spice Route Kitchens".to_string(),
            business_type: BusinessType::Restaurant,
            gst_number: gst_number.to_string(),
            pan_number: "ABCDE1234F".to_string(),
            registration_number: None,
            contact_person: ContactPerson {
                name: "Asha".to_string(),
                email: "asha@spiceroute.in".to_string(),
                mobile: "9876543210".to_string(),
            },
            business_address: PostalAddress {
                address_line1: "4 Residency Road".to_string(),
                address_line2: None,
                city: "Bengaluru".to_string(),
                state: "KA".to_string(),
                pincode: "560025".to_string(),
            },
            account_status: BusinessStatus::Pending,
            credit_limit: ProductPrice(0.0),
            credit_period_days: 0,
            available_credit: ProductPrice(0.0),
            used_credit: ProductPrice(0.0),
            approval_date: None,
            approved_by: None,
            rejection_reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn credit_ledger_moves_both_sides() {
        let pool = DbPool::new();
        let repo = make_su_repo();
        let b = business(UserId::new(), "29ABCDE1234F1Z5");

        let approved = pool
            .run(|conn| {
                repo.create(conn, b.clone())?;
                repo.review(
                    conn,
                    b.id,
                    BusinessReview::Approved {
                        credit_limit: ProductPrice(50000.0),
                        credit_period_days: 15,
                        approved_by: UserId::new(),
                        approval_date: Utc::now(),
                    },
                )
            })
            .unwrap();
        assert_eq!(approved.available_credit, ProductPrice(50000.0));

        let debited = pool.run(|conn| repo.debit_credit(conn, b.id, ProductPrice(12000.5))).unwrap();
        assert_eq!(debited.available_credit, ProductPrice(37999.5));
        assert_eq!(debited.used_credit, ProductPrice(12000.5));

        let e = pool.run(|conn| repo.debit_credit(conn, b.id, ProductPrice(40000.0))).unwrap_err();
        assert_eq!(::errors::kind_of(&e), Some(Error::InsufficientCredit));

        let restored = pool.run(|conn| repo.restore_credit(conn, b.id, ProductPrice(12000.5))).unwrap();
        assert_eq!(restored.available_credit, ProductPrice(50000.0));
        assert_eq!(restored.used_credit, ProductPrice(0.0));
    }

    #[test]
    fn reviewed_business_cannot_be_reviewed_again() {
        let pool = DbPool::new();
        let repo = make_su_repo();
        let b = business(UserId::new(), "29ABCDE1234F1Z5");

        pool.run(|conn| {
            repo.create(conn, b.clone())?;
            repo.review(
                conn,
                b.id,
                BusinessReview::Rejected {
                    reason: "Documents unreadable".to_string(),
                },
            )
        })
        .unwrap();

        let e = pool
            .run(|conn| {
                repo.review(
                    conn,
                    b.id,
                    BusinessReview::Rejected {
                        reason: "again".to_string(),
                    },
                )
            })
            .unwrap_err();
        assert_eq!(::errors::kind_of(&e), Some(Error::InvalidState));
    }

    #[test]
    fn gst_number_is_unique() {
        let pool = DbPool::new();
        let repo = make_su_repo();

        pool.run(|conn| repo.create(conn, business(UserId::new(), "29ABCDE1234F1Z5"))).unwrap();
        let e = pool
            .run(|conn| repo.create(conn, business(UserId::new(), "29ABCDE1234F1Z5")))
            .unwrap_err();
        assert_eq!(::errors::kind_of(&e), Some(Error::AlreadyExists));
    }
}
