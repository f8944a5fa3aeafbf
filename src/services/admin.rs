use chrono::prelude::*;

use super::order::{cancel_in, find_order};
use super::types::*;
use acl;
use errors::Error;
use models::*;
use repos::*;
use types::*;

/// Back office operations. Every call requires an administrator.
pub trait AdminService {
    /// Registrations awaiting review, newest first
    fn pending_registrations(&self) -> ServiceResult<Vec<B2bBusiness>>;
    fn review_registration(&self, business_id: BusinessId, decision: ReviewDecision) -> ServiceResult<B2bBusiness>;
    fn list_orders(&self, filter: AdminOrderFilter) -> ServiceResult<Page<Order>>;
    /// Moves an order forward along fulfilment; cancelling returns its stock and credit
    fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> ServiceResult<Order>;
    /// Settles payment; credit orders hand their amount back to the business's available credit
    fn mark_order_paid(&self, order_id: OrderId) -> ServiceResult<Order>;
}

pub struct AdminServiceImpl {
    ctx: ServiceContext,
    caller: Caller,
}

impl AdminServiceImpl {
    pub fn new(ctx: ServiceContext, caller: Caller) -> Self {
        Self { ctx, caller }
    }
}

impl AdminService for AdminServiceImpl {
    fn pending_registrations(&self) -> ServiceResult<Vec<B2bBusiness>> {
        debug!("Listing pending registrations for admin {}", self.caller.user_id);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            repo_factory.create_business_repo(Some(caller)).get(
                conn,
                BusinessFilter {
                    account_status: Some(BusinessStatus::Pending),
                    ..Default::default()
                },
            )
        })
    }

    fn review_registration(&self, business_id: BusinessId, decision: ReviewDecision) -> ServiceResult<B2bBusiness> {
        debug!("Admin {} reviewing business {}", self.caller.user_id, business_id);

        acl::check_admin(&self.caller)?;

        let review = match decision {
            ReviewDecision::Approve {
                credit_limit,
                credit_period_days,
            } => {
                let credit = &self.ctx.config.credit;
                if credit_limit.0 < credit.min_limit || credit_limit.0 > credit.max_limit {
                    return Err(Error::Validate(format!(
                        "Credit limit must be between {} and {}",
                        credit.min_limit, credit.max_limit
                    ))
                    .into());
                }
                if !credit.allowed_periods.contains(&credit_period_days) {
                    return Err(Error::Validate(format!(
                        "Credit period must be one of {:?} days",
                        credit.allowed_periods
                    ))
                    .into());
                }
                BusinessReview::Approved {
                    credit_limit,
                    credit_period_days,
                    approved_by: self.caller.user_id,
                    approval_date: Utc::now(),
                }
            }
            ReviewDecision::Reject { rejection_reason } => {
                if rejection_reason.trim().is_empty() {
                    return Err(Error::Validate("Rejection reason is required".to_string()).into());
                }
                BusinessReview::Rejected {
                    reason: rejection_reason,
                }
            }
        };

        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let business = repo_factory
                .create_business_repo(Some(caller.clone()))
                .review(conn, business_id, review)?;
            info!(
                "Business {} {} by admin {}",
                business.id, business.account_status, caller.user_id
            );
            Ok(business)
        })
    }

    fn list_orders(&self, filter: AdminOrderFilter) -> ServiceResult<Page<Order>> {
        debug!("Admin {} listing orders with {:?}", self.caller.user_id, filter);

        acl::check_admin(&self.caller)?;
        let pagination = Pagination::new(filter.page, filter.limit, 20);
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let orders = repo_factory.create_order_repo(Some(caller)).get(
                conn,
                OrderFilter {
                    order_type: filter.order_type,
                    order_status: filter.order_status,
                    ..Default::default()
                },
            )?;
            Ok(pagination.apply(orders))
        })
    }

    fn update_order_status(&self, order_id: OrderId, status: OrderStatus) -> ServiceResult<Order> {
        debug!("Admin {} setting order {} to {}", self.caller.user_id, order_id, status);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let order = find_order(&*repo_factory, conn, &caller, order_id)?;
            if !order.order_status.can_become(status) {
                warn!("Order {} cannot move from {} to {}", order.order_number, order.order_status, status);
                return Err(format_err!("Order {} cannot move from {} to {}", order.order_number, order.order_status, status)
                    .context(Error::InvalidState)
                    .into());
            }

            if status == OrderStatus::Cancelled {
                return cancel_in(
                    &*repo_factory,
                    conn,
                    order,
                    caller.user_id,
                    "Cancelled by administrator".to_string(),
                );
            }

            let order = repo_factory
                .create_order_repo(Some(caller.clone()))
                .update(
                    conn,
                    OrderUpdater {
                        mask: OrderFilter::by_id(order.id),
                        data: OrderUpdateData {
                            order_status: Some(status),
                            ..Default::default()
                        },
                    },
                )?
                .pop()
                .ok_or_else(|| format_err!("Order {} not found", order_id).context(Error::NotFound))?;

            repo_factory
                .create_order_diff_repo()
                .create(conn, history_entry(&order, caller.user_id, None))?;

            info!("Order {} is now {}", order.order_number, order.order_status);
            Ok(order)
        })
    }

    fn mark_order_paid(&self, order_id: OrderId) -> ServiceResult<Order> {
        debug!("Admin {} marking order {} as paid", self.caller.user_id, order_id);

        acl::check_admin(&self.caller)?;
        let repo_factory = self.ctx.repo_factory.clone();
        let caller = self.caller.clone();

        self.ctx.db_pool.run(move |conn| {
            let order = find_order(&*repo_factory, conn, &caller, order_id)?;
            if order.payment_status == PaymentStatus::Paid || order.order_status == OrderStatus::Cancelled {
                return Err(format_err!(
                    "Order {} cannot be settled: payment {}, status {}",
                    order.order_number,
                    order.payment_status,
                    order.order_status
                )
                .context(Error::InvalidState)
                .into());
            }

            if let (true, Some(business_id)) = (order.is_credit(), order.business_id) {
                repo_factory
                    .create_business_repo(None)
                    .restore_credit(conn, business_id, order.credit_used)?;
            }

            let order = repo_factory
                .create_order_repo(Some(caller.clone()))
                .update(
                    conn,
                    OrderUpdater {
                        mask: OrderFilter::by_id(order.id),
                        data: OrderUpdateData {
                            payment_status: Some(PaymentStatus::Paid),
                            ..Default::default()
                        },
                    },
                )?
                .pop()
                .ok_or_else(|| format_err!("Order {} not found", order_id).context(Error::NotFound))?;

            repo_factory.create_order_diff_repo().create(
                conn,
                history_entry(&order, caller.user_id, Some("Payment received".to_string())),
            )?;

            info!("Order {} settled for {}", order.order_number, order.total_amount);
            Ok(order)
        })
    }
}
