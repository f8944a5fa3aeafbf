use models::*;
use repos::types::*;
use types::*;

#[derive(Clone, Debug, Default)]
pub struct OrderDiffFilter {
    pub parent: Option<OrderId>,
}

pub trait OrderDiffRepo {
    fn create(&self, conn: RepoConnection, inserter: OrderDiffInserter) -> RepoResult<OrderDiff>;
    /// Latest change first
    fn get(&self, conn: RepoConnection, mask: OrderDiffFilter) -> RepoResult<Vec<OrderDiff>>;
}

/// Status history is only reachable through an order the caller may already see.
pub struct OrderDiffRepoImpl;

type Repo = OrderDiffRepoImpl;

pub fn make_su_repo() -> Repo {
    OrderDiffRepoImpl
}

impl OrderDiffRepo for OrderDiffRepoImpl {
    fn create(&self, conn: RepoConnection, inserter: OrderDiffInserter) -> RepoResult<OrderDiff> {
        let diff = OrderDiff::from(inserter);
        conn.order_diffs.push(diff.clone());
        Ok(diff)
    }

    fn get(&self, conn: RepoConnection, mask: OrderDiffFilter) -> RepoResult<Vec<OrderDiff>> {
        let rows = conn
            .order_diffs
            .iter()
            .filter(|d| mask.parent.map(|v| v == d.parent).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(rows, |d| d.committed_at))
    }
}
