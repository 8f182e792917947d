//! Poll listing cache and the invalidation port used by mutating handlers.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::Poll;

/// View path of the public poll listing.
pub const POLL_LISTING_PATH: &str = "/polls";

#[async_trait]
pub trait Revalidate: Send + Sync {
    /// Drop whatever is cached for `path`.
    async fn revalidate(&self, path: &str);
}

#[derive(Default)]
struct Slot {
    generation: u64,
    polls: Option<Vec<Poll>>,
}

/// In-process copy of the listing view.
///
/// Every invalidation bumps a generation counter; a fill computed against an
/// older generation is discarded so a slow read cannot resurrect stale data.
#[derive(Default)]
pub struct ListingCache {
    slot: RwLock<Slot>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached listing, or the generation a fresh fill should be tagged with.
    pub async fn lookup(&self) -> Result<Vec<Poll>, u64> {
        let slot = self.slot.read().await;
        slot.polls.clone().ok_or(slot.generation)
    }

    /// Stores `polls` if nothing was invalidated since `generation` was read.
    pub async fn fill(&self, generation: u64, polls: Vec<Poll>) -> bool {
        let mut slot = self.slot.write().await;
        if slot.generation != generation {
            return false;
        }
        slot.polls = Some(polls);
        true
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        slot.generation += 1;
        slot.polls = None;
    }
}

#[async_trait]
impl Revalidate for ListingCache {
    async fn revalidate(&self, path: &str) {
        if path == POLL_LISTING_PATH {
            self.invalidate().await;
            debug!("Invalidated poll listing cache");
        }
    }
}
