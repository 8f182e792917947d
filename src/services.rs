// services.rs
//! Poll use cases.
//!
//! Each operation is a single pass of authenticate, validate, authorize,
//! delegate to the store, and invalidate the listing view. Nothing here holds
//! state between requests except the listing cache.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{IdentityProvider, SessionToken};
use crate::cache::{ListingCache, Revalidate, POLL_LISTING_PATH};
use crate::error::{AppError, AppResult};
use crate::models::{
    NewPoll, NewVote, OptionTally, Poll, PollChanges, PollForm, PollId, Role, User, Vote,
};
use crate::store::{PollFilter, PollOrder, PollStore};
use crate::validation::PollDraft;

pub struct PollService {
    store: Arc<dyn PollStore>,
    identity: Arc<dyn IdentityProvider>,
    listing: Arc<ListingCache>,
    revalidators: Vec<Arc<dyn Revalidate>>,
}

impl PollService {
    pub fn new(store: Arc<dyn PollStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let listing = Arc::new(ListingCache::new());
        let listing_revalidator: Arc<dyn Revalidate> = listing.clone();
        Self {
            store,
            identity,
            listing,
            revalidators: vec![listing_revalidator],
        }
    }

    /// Registers another view to invalidate after every successful write.
    pub fn with_revalidator(mut self, revalidator: Arc<dyn Revalidate>) -> Self {
        self.revalidators.push(revalidator);
        self
    }

    /// Resolves the signed-in user, failing with `NotLoggedIn` otherwise.
    pub async fn authenticate(&self, session: &SessionToken) -> AppResult<User> {
        self.identity
            .current_user(session)
            .await?
            .ok_or(AppError::NotLoggedIn)
    }

    async fn invalidate_listing(&self) {
        for revalidator in &self.revalidators {
            revalidator.revalidate(POLL_LISTING_PATH).await;
        }
    }

    fn draft(form: &PollForm) -> AppResult<PollDraft> {
        PollDraft::from_input(&form.question, &form.options).map_err(AppError::Validation)
    }

    pub async fn create_poll(&self, session: &SessionToken, form: &PollForm) -> AppResult<Poll> {
        let user = self.authenticate(session).await?;
        let draft = Self::draft(form)?;

        let poll = self
            .store
            .insert_poll(NewPoll {
                user_id: user.id,
                question: draft.question,
                options: draft.options,
            })
            .await?;

        info!(poll_id = %poll.id, user_id = %user.id, "Poll created");
        self.invalidate_listing().await;
        Ok(poll)
    }

    /// Polls owned by the caller, newest first.
    pub async fn get_user_polls(&self, session: &SessionToken) -> AppResult<Vec<Poll>> {
        let user = self.authenticate(session).await?;
        self.store
            .select_polls(PollFilter::by_owner(user.id), PollOrder::NewestFirst)
            .await
    }

    /// Any poll by id. Polls are public so voters can open them.
    pub async fn get_poll_by_id(&self, id: PollId) -> AppResult<Option<Poll>> {
        let polls = self
            .store
            .select_polls(PollFilter::by_id(id), PollOrder::NewestFirst)
            .await?;
        Ok(polls.into_iter().next())
    }

    /// Public listing of all polls, newest first.
    pub async fn list_polls(&self) -> AppResult<Vec<Poll>> {
        let generation = match self.listing.lookup().await {
            Ok(polls) => return Ok(polls),
            Err(generation) => generation,
        };

        let polls = self
            .store
            .select_polls(PollFilter::all(), PollOrder::NewestFirst)
            .await?;
        self.listing.fill(generation, polls.clone()).await;
        Ok(polls)
    }

    pub async fn update_poll(
        &self,
        session: &SessionToken,
        id: PollId,
        form: &PollForm,
    ) -> AppResult<()> {
        let user = self.authenticate(session).await?;
        let draft = Self::draft(form)?;

        // Ownership is part of the update predicate, not a prior lookup.
        let changed = self
            .store
            .update_polls(
                PollFilter::by_id(id).owned_by(user.id),
                PollChanges {
                    question: draft.question,
                    options: draft.options,
                },
            )
            .await?;

        if changed == 0 {
            return Err(AppError::PollNotFound);
        }

        info!(poll_id = %id, user_id = %user.id, "Poll updated");
        self.invalidate_listing().await;
        Ok(())
    }

    pub async fn delete_poll(&self, session: &SessionToken, id: PollId) -> AppResult<()> {
        let user = self.authenticate(session).await?;

        let removed = self
            .store
            .delete_polls(PollFilter::by_id(id).owned_by(user.id))
            .await?;

        if removed == 0 {
            return Err(AppError::PollNotFound);
        }

        info!(poll_id = %id, user_id = %user.id, "Poll deleted");
        self.invalidate_listing().await;
        Ok(())
    }

    /// Moderation delete: admins may remove any poll.
    pub async fn admin_delete_poll(&self, session: &SessionToken, id: PollId) -> AppResult<()> {
        let user = self.authenticate(session).await?;

        if user.role() != Role::Admin {
            warn!(poll_id = %id, user_id = %user.id, "Admin delete rejected");
            return Err(AppError::AdminRequired);
        }

        let removed = self.store.delete_polls(PollFilter::by_id(id)).await?;
        if removed == 0 {
            return Err(AppError::PollNotFound);
        }

        info!(poll_id = %id, admin_id = %user.id, "Poll deleted by admin");
        self.invalidate_listing().await;
        Ok(())
    }

    /// Records one vote. Anonymous sessions vote with no user id.
    pub async fn submit_vote(
        &self,
        session: &SessionToken,
        poll_id: PollId,
        option_index: i32,
    ) -> AppResult<Vote> {
        let user = self.identity.current_user(session).await?;

        let poll = self
            .get_poll_by_id(poll_id)
            .await?
            .ok_or(AppError::PollNotFound)?;

        let in_range = usize::try_from(option_index)
            .map(|index| index < poll.options.len())
            .unwrap_or(false);
        if !in_range {
            return Err(AppError::InvalidOption);
        }

        let vote = self
            .store
            .insert_vote(NewVote {
                poll_id,
                option_index,
                user_id: user.map(|user| user.id),
            })
            .await?;

        info!(poll_id = %poll_id, option_index, anonymous = vote.user_id.is_none(), "Vote recorded");
        self.invalidate_listing().await;
        Ok(vote)
    }

    /// Vote totals for every option of a poll, in option order.
    pub async fn get_poll_results(&self, poll_id: PollId) -> AppResult<Vec<OptionTally>> {
        let poll = self
            .get_poll_by_id(poll_id)
            .await?
            .ok_or(AppError::PollNotFound)?;
        let counts = self.store.count_votes(poll_id).await?;

        Ok(tally(&poll, &counts))
    }
}

fn tally(poll: &Poll, counts: &[(i32, i64)]) -> Vec<OptionTally> {
    poll.options
        .iter()
        .zip(0..)
        .map(|(option, index)| OptionTally {
            index,
            option: option.clone(),
            votes: counts
                .iter()
                .filter(|(counted, _)| *counted == index)
                .map(|(_, votes)| votes)
                .sum(),
        })
        .collect()
}
