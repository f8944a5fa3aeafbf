use chrono::prelude::*;

use acl::Action;
use errors::Error;
use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub id: Option<OrderId>,
    pub order_number: Option<String>,
    pub user_id: Option<UserId>,
    pub business_id: Option<BusinessId>,
    pub order_type: Option<AccountType>,
    pub order_status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
}

impl OrderFilter {
    pub fn by_id(id: OrderId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    fn matches(&self, order: &Order) -> bool {
        self.id.map(|v| v == order.id).unwrap_or(true)
            && self.order_number.as_ref().map(|v| v == &order.order_number).unwrap_or(true)
            && self.user_id.map(|v| v == order.user_id).unwrap_or(true)
            && self.business_id.map(|v| Some(v) == order.business_id).unwrap_or(true)
            && self.order_type.map(|v| v == order.order_type).unwrap_or(true)
            && self.order_status.map(|v| v == order.order_status).unwrap_or(true)
            && self.payment_method.map(|v| v == order.payment_method).unwrap_or(true)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderUpdateData {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Clone, Debug)]
pub struct OrderUpdater {
    pub mask: OrderFilter,
    pub data: OrderUpdateData,
}

pub trait OrderRepo {
    fn create(&self, conn: RepoConnection, order: Order) -> RepoResult<Order>;
    /// Newest first
    fn get(&self, conn: RepoConnection, mask: OrderFilter) -> RepoResult<Vec<Order>>;
    fn find(&self, conn: RepoConnection, id: OrderId) -> RepoResult<Option<Order>>;
    fn update(&self, conn: RepoConnection, updater: OrderUpdater) -> RepoResult<Vec<Order>>;
}

pub struct OrderRepoImpl {
    acl: Option<Caller>,
}

type Repo = OrderRepoImpl;

pub fn make_su_repo() -> Repo {
    OrderRepoImpl { acl: None }
}

pub fn make_repo(caller: Caller) -> Repo {
    OrderRepoImpl { acl: Some(caller) }
}

impl OrderRepo for OrderRepoImpl {
    fn create(&self, conn: RepoConnection, order: Order) -> RepoResult<Order> {
        ensure_access(&self.acl, &[order.clone()], Action::Write)?;

        if conn.orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(format_err!("Order number {} is taken", order.order_number)
                .context(Error::AlreadyExists)
                .into());
        }

        conn.orders.push(order.clone());
        Ok(order)
    }

    fn get(&self, conn: RepoConnection, mask: OrderFilter) -> RepoResult<Vec<Order>> {
        let rows = conn.orders.iter().filter(|o| mask.matches(o)).cloned().collect::<Vec<_>>();
        ensure_access(&self.acl, &rows, Action::Read)?;
        Ok(newest_first(rows, |o| o.created_at))
    }

    fn find(&self, conn: RepoConnection, id: OrderId) -> RepoResult<Option<Order>> {
        self.get(conn, OrderFilter::by_id(id)).map(|mut rows| rows.pop())
    }

    fn update(&self, conn: RepoConnection, updater: OrderUpdater) -> RepoResult<Vec<Order>> {
        let now = Utc::now();
        let OrderUpdater { mask, data } = updater;

        let mut out = vec![];
        for order in conn.orders.iter_mut().filter(|o| mask.matches(o)) {
            ensure_access(&self.acl, &[order.clone()], Action::Write)?;

            if let Some(status) = data.order_status {
                order.order_status = status;
            }
            if let Some(status) = data.payment_status {
                order.payment_status = status;
            }
            order.updated_at = now;

            out.push(order.clone());
        }
        Ok(out)
    }
}
