use std::sync::Arc;

use chrono::prelude::*;
use failure::Error as FailureError;

use config::Config;
use models::*;
use repos::*;
use types::UserId;

pub type ServiceResult<T> = Result<T, FailureError>;

/// Store handle, configuration and repo source shared by every service
#[derive(Clone)]
pub struct ServiceContext {
    pub db_pool: DbPool,
    pub config: Arc<Config>,
    pub repo_factory: Arc<dyn ReposFactory>,
}

impl ServiceContext {
    pub fn new(db_pool: DbPool, config: Config) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
            repo_factory: Arc::new(ReposFactoryImpl),
        }
    }
}

/// Fresh order-history entry
pub fn history_entry(order: &Order, committer: UserId, comment: Option<String>) -> OrderDiffInserter {
    OrderDiffInserter {
        parent: order.id,
        committer,
        committed_at: Utc::now(),
        status: order.order_status,
        comment,
    }
}
