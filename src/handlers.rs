// handlers.rs
use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::SessionToken;
use crate::error::{AppError, AppResult, ReadError};
use crate::models::{ActionResult, DataResult, OptionTally, Poll, PollForm, VoteRequest};
use crate::state::AppState;

type ActionResponse = AppResult<(StatusCode, Json<ActionResult>)>;
type DataResponse<T> = Result<Json<DataResult<T>>, ReadError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(vec![rejection.body_text()]))
}

/// Poll form for handlers that require a session. A caller without one is
/// told so before anything about the body.
async fn form_body(
    state: &AppState,
    session: &SessionToken,
    payload: Result<Json<PollForm>, JsonRejection>,
) -> AppResult<PollForm> {
    if payload.is_err() {
        state.polls.authenticate(session).await?;
    }
    body(payload)
}

// An id that is not a UUID cannot name an existing poll.
fn poll_id(path: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    path.map(|Path(id)| id).map_err(|_| AppError::PollNotFound)
}

fn done(status: StatusCode) -> ActionResponse {
    Ok((status, Json(ActionResult::ok())))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// List every poll, newest first
pub async fn list_polls(State(state): State<AppState>) -> DataResponse<Vec<Poll>> {
    let polls = state.polls.list_polls().await?;
    Ok(Json(DataResult::ok(Some(polls))))
}

/// Create a poll owned by the caller
pub async fn create_poll(
    State(state): State<AppState>,
    session: SessionToken,
    payload: Result<Json<PollForm>, JsonRejection>,
) -> ActionResponse {
    let form = form_body(&state, &session, payload).await?;
    state.polls.create_poll(&session, &form).await?;
    done(StatusCode::CREATED)
}

/// Polls owned by the caller
pub async fn user_polls(
    State(state): State<AppState>,
    session: SessionToken,
) -> DataResponse<Vec<Poll>> {
    let polls = state.polls.get_user_polls(&session).await?;
    Ok(Json(DataResult::ok(Some(polls))))
}

pub async fn get_poll(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> DataResponse<Poll> {
    // A malformed id names no poll, same as an unknown one.
    let Ok(Path(id)) = path else {
        return Ok(Json(DataResult::ok(None)));
    };
    let poll = state.polls.get_poll_by_id(id).await?;
    Ok(Json(DataResult::ok(poll)))
}

pub async fn update_poll(
    State(state): State<AppState>,
    session: SessionToken,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PollForm>, JsonRejection>,
) -> ActionResponse {
    let id = poll_id(path)?;
    let form = form_body(&state, &session, payload).await?;
    state.polls.update_poll(&session, id, &form).await?;
    done(StatusCode::OK)
}

pub async fn delete_poll(
    State(state): State<AppState>,
    session: SessionToken,
    path: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse {
    let id = poll_id(path)?;
    state.polls.delete_poll(&session, id).await?;
    done(StatusCode::OK)
}

/// Delete any poll (admin only)
pub async fn admin_delete_poll(
    State(state): State<AppState>,
    session: SessionToken,
    path: Result<Path<Uuid>, PathRejection>,
) -> ActionResponse {
    let id = poll_id(path)?;
    state.polls.admin_delete_poll(&session, id).await?;
    done(StatusCode::OK)
}

/// Vote for one option of a poll
pub async fn submit_vote(
    State(state): State<AppState>,
    session: SessionToken,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ActionResponse {
    let id = poll_id(path)?;
    let vote = body(payload)?;
    state
        .polls
        .submit_vote(&session, id, vote.option_index)
        .await?;
    done(StatusCode::CREATED)
}

pub async fn poll_results(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> DataResponse<Vec<OptionTally>> {
    let id = poll_id(path)?;
    let tallies = state.polls.get_poll_results(id).await?;
    Ok(Json(DataResult::ok(Some(tallies))))
}
