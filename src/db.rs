// src/db.rs
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{NewPoll, NewVote, Poll, PollChanges, PollId, Vote};
use crate::store::{PollFilter, PollOrder, PollStore};

const POLL_COLUMNS: &str = "id, user_id, question, options, created_at";
const VOTE_COLUMNS: &str = "id, poll_id, option_index, user_id, created_at";

pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// `PollStore` backed by the managed Postgres database.
#[derive(Clone)]
pub struct PgPollStore {
    pool: PgPool,
}

impl PgPollStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: PollFilter) {
    let mut glue = " WHERE ";
    if let Some(id) = filter.id {
        query.push(glue).push("id = ").push_bind(id);
        glue = " AND ";
    }
    if let Some(user_id) = filter.user_id {
        query.push(glue).push("user_id = ").push_bind(user_id);
    }
}

// Mutations without any predicate would touch the whole table.
fn require_predicate(filter: PollFilter, action: &str) -> AppResult<()> {
    if filter == PollFilter::all() {
        return Err(AppError::Backend(format!(
            "refusing to {action} polls without a filter"
        )));
    }
    Ok(())
}

#[async_trait]
impl PollStore for PgPollStore {
    async fn insert_poll(&self, poll: NewPoll) -> AppResult<Poll> {
        let sql = format!(
            "INSERT INTO polls (user_id, question, options) VALUES ($1, $2, $3) RETURNING {POLL_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Poll>(&sql)
            .bind(poll.user_id)
            .bind(poll.question)
            .bind(poll.options)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn select_polls(&self, filter: PollFilter, order: PollOrder) -> AppResult<Vec<Poll>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {POLL_COLUMNS} FROM polls"));
        push_filter(&mut query, filter);
        query.push(match order {
            PollOrder::NewestFirst => " ORDER BY created_at DESC",
        });

        let polls = query.build_query_as::<Poll>().fetch_all(&self.pool).await?;
        Ok(polls)
    }

    async fn update_polls(&self, filter: PollFilter, changes: PollChanges) -> AppResult<u64> {
        require_predicate(filter, "update")?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE polls SET question = ");
        query
            .push_bind(changes.question)
            .push(", options = ")
            .push_bind(changes.options);
        push_filter(&mut query, filter);

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_polls(&self, filter: PollFilter) -> AppResult<u64> {
        require_predicate(filter, "delete")?;

        let mut query = QueryBuilder::<Postgres>::new("DELETE FROM polls");
        push_filter(&mut query, filter);

        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_vote(&self, vote: NewVote) -> AppResult<Vote> {
        let sql = format!(
            "INSERT INTO votes (poll_id, option_index, user_id) VALUES ($1, $2, $3) RETURNING {VOTE_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Vote>(&sql)
            .bind(vote.poll_id)
            .bind(vote.option_index)
            .bind(vote.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn count_votes(&self, poll_id: PollId) -> AppResult<Vec<(i32, i64)>> {
        let counts = sqlx::query_as::<_, (i32, i64)>(
            "SELECT option_index, COUNT(*) AS vote_count FROM votes WHERE poll_id = $1 GROUP BY option_index ORDER BY option_index",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
