#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use poll_board::auth::{IdentityProvider, SessionToken};
use poll_board::cache::Revalidate;
use poll_board::error::{AppError, AppResult};
use poll_board::models::{NewPoll, NewVote, Poll, PollChanges, PollId, User, UserId, Vote};
use poll_board::services::PollService;
use poll_board::store::{PollFilter, PollOrder, PollStore};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    polls: Vec<Poll>,
    votes: Vec<Vote>,
    clock: i64,
}

impl Tables {
    // Strictly increasing timestamps keep ordering assertions deterministic.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.clock)
    }
}

/// In-memory stand-in for the backend tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failure: Mutex<Option<String>>,
    pub select_calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every following call fail with `message`.
    pub async fn fail_with(&self, message: &str) {
        *self.failure.lock().await = Some(message.to_string());
    }

    async fn check(&self) -> AppResult<()> {
        match self.failure.lock().await.clone() {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(()),
        }
    }

    pub async fn seed(&self, owner: UserId, question: &str, options: &[&str]) -> Poll {
        let mut tables = self.tables.lock().await;
        let poll = Poll {
            id: Uuid::new_v4(),
            user_id: owner,
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            created_at: tables.tick(),
        };
        tables.polls.push(poll.clone());
        poll
    }

    pub async fn polls(&self) -> Vec<Poll> {
        self.tables.lock().await.polls.clone()
    }

    pub async fn votes(&self) -> Vec<Vote> {
        self.tables.lock().await.votes.clone()
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn insert_poll(&self, poll: NewPoll) -> AppResult<Poll> {
        self.check().await?;
        let mut tables = self.tables.lock().await;
        let poll = Poll {
            id: Uuid::new_v4(),
            user_id: poll.user_id,
            question: poll.question,
            options: poll.options,
            created_at: tables.tick(),
        };
        tables.polls.push(poll.clone());
        Ok(poll)
    }

    async fn select_polls(&self, filter: PollFilter, order: PollOrder) -> AppResult<Vec<Poll>> {
        self.check().await?;
        *self.select_calls.lock().await += 1;
        let tables = self.tables.lock().await;
        let mut polls: Vec<Poll> = tables
            .polls
            .iter()
            .filter(|poll| filter.matches(poll))
            .cloned()
            .collect();
        polls.sort_by_key(|poll| poll.created_at);
        if order == PollOrder::NewestFirst {
            polls.reverse();
        }
        Ok(polls)
    }

    async fn update_polls(&self, filter: PollFilter, changes: PollChanges) -> AppResult<u64> {
        self.check().await?;
        let mut tables = self.tables.lock().await;
        let mut changed = 0;
        for poll in tables.polls.iter_mut().filter(|poll| filter.matches(poll)) {
            poll.question = changes.question.clone();
            poll.options = changes.options.clone();
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_polls(&self, filter: PollFilter) -> AppResult<u64> {
        self.check().await?;
        let mut tables = self.tables.lock().await;
        let before = tables.polls.len();
        tables.polls.retain(|poll| !filter.matches(poll));
        Ok((before - tables.polls.len()) as u64)
    }

    async fn insert_vote(&self, vote: NewVote) -> AppResult<Vote> {
        self.check().await?;
        let mut tables = self.tables.lock().await;
        let vote = Vote {
            id: Uuid::new_v4(),
            poll_id: vote.poll_id,
            option_index: vote.option_index,
            user_id: vote.user_id,
            created_at: tables.tick(),
        };
        tables.votes.push(vote.clone());
        Ok(vote)
    }

    async fn count_votes(&self, poll_id: PollId) -> AppResult<Vec<(i32, i64)>> {
        self.check().await?;
        let tables = self.tables.lock().await;
        let mut counts: HashMap<i32, i64> = HashMap::new();
        for vote in tables.votes.iter().filter(|vote| vote.poll_id == poll_id) {
            *counts.entry(vote.option_index).or_default() += 1;
        }
        let mut counts: Vec<(i32, i64)> = counts.into_iter().collect();
        counts.sort();
        Ok(counts)
    }
}

/// Session token to user map.
#[derive(Default)]
pub struct FakeIdentity {
    sessions: HashMap<String, User>,
}

impl FakeIdentity {
    pub fn with_session(mut self, token: &str, user: User) -> Self {
        self.sessions.insert(token.to_string(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn current_user(&self, session: &SessionToken) -> AppResult<Option<User>> {
        Ok(session
            .as_deref()
            .and_then(|token| self.sessions.get(token).cloned()))
    }
}

/// Records every revalidated path.
#[derive(Default)]
pub struct RecordingRevalidator {
    pub paths: Mutex<Vec<String>>,
}

#[async_trait]
impl Revalidate for RecordingRevalidator {
    async fn revalidate(&self, path: &str) {
        self.paths.lock().await.push(path.to_string());
    }
}

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";
pub const ADMIN: &str = "admin-token";
pub const SUPERUSER: &str = "superuser-token";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub revalidator: Arc<RecordingRevalidator>,
    pub service: PollService,
    pub alice: User,
    pub bob: User,
    pub admin: User,
}

impl Harness {
    pub fn new() -> Self {
        let alice = User::new(Uuid::new_v4());
        let bob = User::new(Uuid::new_v4()).with_role("member");
        let admin = User::new(Uuid::new_v4()).with_role("admin");
        // Role strings are case-sensitive; this one must not pass as admin.
        let superuser = User::new(Uuid::new_v4()).with_role("Admin");

        let identity = FakeIdentity::default()
            .with_session(ALICE, alice.clone())
            .with_session(BOB, bob.clone())
            .with_session(ADMIN, admin.clone())
            .with_session(SUPERUSER, superuser);

        let store = MemoryStore::new();
        let revalidator = Arc::new(RecordingRevalidator::default());
        let service = PollService::new(store.clone(), Arc::new(identity))
            .with_revalidator(revalidator.clone());

        Self {
            store,
            revalidator,
            service,
            alice,
            bob,
            admin,
        }
    }

    pub async fn revalidations(&self) -> usize {
        self.revalidator.paths.lock().await.len()
    }
}

pub fn session(token: &str) -> SessionToken {
    SessionToken::bearer(token)
}
