//! Query port for the external backend.
//!
//! Handlers only talk to the backend through this trait, so ownership checks
//! are expressed as filters the backend applies inside the same statement as
//! the mutation.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{NewPoll, NewVote, Poll, PollChanges, PollId, UserId, Vote};

/// Row predicate for the `polls` table. Every set field must match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollFilter {
    pub id: Option<PollId>,
    pub user_id: Option<UserId>,
}

impl PollFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: PollId) -> Self {
        Self {
            id: Some(id),
            user_id: None,
        }
    }

    pub fn by_owner(user_id: UserId) -> Self {
        Self {
            id: None,
            user_id: Some(user_id),
        }
    }

    /// Narrows the filter to rows owned by `user_id`.
    pub fn owned_by(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn matches(&self, poll: &Poll) -> bool {
        self.id.is_none_or(|id| poll.id == id)
            && self.user_id.is_none_or(|user_id| poll.user_id == user_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollOrder {
    #[default]
    NewestFirst,
}

#[async_trait]
pub trait PollStore: Send + Sync {
    /// Insert a poll and return the stored row
    async fn insert_poll(&self, poll: NewPoll) -> AppResult<Poll>;

    /// Select polls matching `filter` in the given order
    async fn select_polls(&self, filter: PollFilter, order: PollOrder) -> AppResult<Vec<Poll>>;

    /// Update polls matching `filter`, returning the number of rows changed
    async fn update_polls(&self, filter: PollFilter, changes: PollChanges) -> AppResult<u64>;

    /// Delete polls matching `filter`, returning the number of rows removed
    async fn delete_polls(&self, filter: PollFilter) -> AppResult<u64>;

    async fn insert_vote(&self, vote: NewVote) -> AppResult<Vote>;

    /// Vote counts per option index for one poll
    async fn count_votes(&self, poll_id: PollId) -> AppResult<Vec<(i32, i64)>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn poll(owner: UserId) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            user_id: owner,
            question: "Q?".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn compound_filter_requires_both_columns() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let poll = poll(owner);

        assert!(PollFilter::by_id(poll.id).owned_by(owner).matches(&poll));
        assert!(!PollFilter::by_id(poll.id).owned_by(stranger).matches(&poll));
        assert!(!PollFilter::by_id(Uuid::new_v4()).owned_by(owner).matches(&poll));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(PollFilter::all().matches(&poll(Uuid::new_v4())));
    }
}
