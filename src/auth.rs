//! Identity port and its adapters.
//!
//! The session itself lives in the external auth provider. Handlers receive
//! the opaque [`SessionToken`] from the request and ask an
//! [`IdentityProvider`] who it belongs to.

use std::collections::HashMap;
use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use http::{header::AUTHORIZATION, request::Parts};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{User, UserId};

/// Bearer token taken from the `Authorization` header, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionToken(pub Option<String>);

impl SessionToken {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn from_header(value: &str) -> Self {
        // Auth schemes are case-insensitive.
        let token = value
            .trim()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        Self(token)
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(SessionToken::from_header)
            .unwrap_or_default())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the user behind a session, `None` when there is no live session.
    async fn current_user(&self, session: &SessionToken) -> AppResult<Option<User>>;
}

/// Looks sessions up in the auth provider's tables.
#[derive(Clone)]
pub struct PgSessionIdentity {
    pool: PgPool,
}

impl PgSessionIdentity {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionUserRow {
    id: UserId,
    raw_user_meta_data: Option<sqlx::types::Json<Value>>,
}

/// Metadata that is not a JSON object carries no claims.
fn metadata_map(raw: Option<Value>) -> HashMap<String, Value> {
    match raw {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}

#[async_trait]
impl IdentityProvider for PgSessionIdentity {
    async fn current_user(&self, session: &SessionToken) -> AppResult<Option<User>> {
        let Some(token) = session.as_deref() else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT u.id, u.raw_user_meta_data
            FROM auth_sessions s
            JOIN auth_users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| User {
            id: row.id,
            metadata: metadata_map(row.raw_user_meta_data.map(|json| json.0)),
        }))
    }
}
