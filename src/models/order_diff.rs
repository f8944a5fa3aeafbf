use chrono::prelude::*;

use super::OrderStatus;
use types::*;

/// One entry of an order's status history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderDiff {
    pub id: OrderDiffId,
    pub parent: OrderId,
    pub committer: UserId,
    pub committed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub comment: Option<String>,
}

pub struct OrderDiffInserter {
    pub parent: OrderId,
    pub committer: UserId,
    pub committed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub comment: Option<String>,
}

impl From<OrderDiffInserter> for OrderDiff {
    fn from(v: OrderDiffInserter) -> Self {
        Self {
            id: OrderDiffId::new(),
            parent: v.parent,
            committer: v.committer,
            committed_at: v.committed_at,
            status: v.status,
            comment: v.comment,
        }
    }
}
