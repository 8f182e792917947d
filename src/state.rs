use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::PgSessionIdentity;
use crate::db::PgPollStore;
use crate::services::PollService;

#[derive(Clone)]
pub struct AppState {
    pub polls: Arc<PollService>,
}

impl AppState {
    pub fn new(polls: PollService) -> Self {
        Self {
            polls: Arc::new(polls),
        }
    }

    /// Wires the service to the Postgres-backed store and session lookup.
    pub fn from_pool(pool: PgPool) -> Self {
        let store = Arc::new(PgPollStore::new(pool.clone()));
        let identity = Arc::new(PgSessionIdentity::new(pool));
        Self::new(PollService::new(store, identity))
    }
}
