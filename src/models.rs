// models.rs
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type PollId = Uuid;
pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: PollId,
    pub user_id: UserId,
    pub question: String,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Row to insert into `polls`. Id and timestamp are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    pub user_id: UserId,
    pub question: String,
    pub options: Vec<String>,
}

/// Columns written by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollChanges {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub poll_id: PollId,
    pub option_index: i32,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub poll_id: PollId,
    pub option_index: i32,
    /// `None` for anonymous votes.
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Only the exact metadata value `"admin"` grants the admin role.
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Self {
        match metadata.get("role").and_then(Value::as_str) {
            Some("admin") => Role::Admin,
            _ => Role::Member,
        }
    }
}

/// Identity resolved from the external session.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub metadata: HashMap<String, Value>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            metadata: HashMap::new(),
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.metadata
            .insert("role".to_string(), Value::String(role.to_string()));
        self
    }

    pub fn role(&self) -> Role {
        Role::from_metadata(&self.metadata)
    }
}

/// Body submitted by the create and edit forms.
#[derive(Debug, Clone, Deserialize)]
pub struct PollForm {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteRequest {
    pub option_index: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    pub index: i32,
    pub option: String,
    pub votes: i64,
}

/// Envelope returned by mutating handlers.
#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self { error: None }
    }
}

/// Envelope returned by read handlers.
#[derive(Debug, Serialize)]
pub struct DataResult<T> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> DataResult<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self { data, error: None }
    }
}
