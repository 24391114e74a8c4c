use std::sync::Arc;

use rocket::{State, get, post, put, delete, http::ContentType, serde::json::Json};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use shared::error::{Error, ErrorCode};
use shared::export::{poll_results, to_csv, to_json};
use shared::models::*;
use shared::session::{Identity, ViewerSession};
use shared::validation::validate_poll;

use crate::accounts;
use crate::error::ApiError;
use crate::queries::{PgPolls, PgWorkspaces};
use crate::reconciler::{PendingVote, VoteOutbox};
use crate::resolver::{self, ShareTarget};
use crate::store::PollStore;
use crate::workspaces::WorkspaceStore;

pub struct AppState {
    pub db: PgPool,
    pub polls: PollStore<PgPolls>,
    pub workspaces: WorkspaceStore<PgWorkspaces>,
    pub outbox: Arc<VoteOutbox>,
}

impl AppState {
    pub fn new(pool: PgPool, outbox: Arc<VoteOutbox>) -> Self {
        Self {
            polls: PollStore::new(PgPolls::new(pool.clone())),
            workspaces: WorkspaceStore::new(PgWorkspaces::new(pool.clone())),
            outbox,
            db: pool,
        }
    }
}

fn parse_poll_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::InvalidId)
}

fn not_found() -> ApiError {
    ApiError::from(Error::new(ErrorCode::NotFound, "Poll not found"))
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> rocket::http::Status {
    rocket::http::Status::Ok
}

#[get("/me")]
pub async fn me(state: &State<AppState>, identity: Identity) -> Result<Json<UserRecord>, ApiError> {
    accounts::ensure_user_record(&state.db, &identity).await?;
    accounts::fetch_user(&state.db, &identity.uid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::from(Error::new(ErrorCode::NotFound, "User record not found")))
}

#[get("/polls?<workspace>")]
pub async fn list_polls(
    state: &State<AppState>,
    identity: Identity,
    workspace: Option<&str>,
) -> Result<Json<Vec<SavedPoll>>, ApiError> {
    let workspace = workspace
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| ApiError::InvalidId)?;
    Ok(Json(state.polls.load_polls(&identity.uid, workspace).await))
}

#[get("/polls/shared")]
pub async fn list_shared_polls(
    state: &State<AppState>,
    identity: Identity,
) -> Json<Vec<SavedPoll>> {
    Json(state.polls.load_shared_polls(&identity.email).await)
}

#[instrument(skip(state, request, identity), fields(user = %identity.uid))]
#[post("/polls", format = "json", data = "<request>")]
pub async fn create_poll(
    state: &State<AppState>,
    request: Json<CreatePollRequest>,
    identity: Identity,
) -> Result<Json<SavedPoll>, ApiError> {
    let request = request.into_inner();

    let errors = validate_poll(&request.question, &request.choices);
    if !errors.is_empty() {
        debug!("Rejected poll with {} validation errors", errors.len());
        return Err(ApiError::Validation(errors));
    }

    if let Err(e) = accounts::ensure_user_record(&state.db, &identity).await {
        warn!("Failed to ensure user record for {}: {e}", identity.uid);
    }

    let choices = request
        .choices
        .iter()
        .enumerate()
        .map(|(i, text)| Choice::new((i + 1).to_string(), text.trim()))
        .collect();
    let mut poll = Poll::new(request.question.trim(), choices, request.design.unwrap_or_default());
    poll.user_id = Some(identity.uid.clone());

    let saved = state
        .polls
        .save_poll(
            Some(&identity),
            &poll,
            request.title,
            request.description,
            request.workspace_id,
        )
        .await?;
    Ok(Json(saved))
}

#[put("/polls/<id>", format = "json", data = "<poll>")]
pub async fn update_poll(
    state: &State<AppState>,
    id: &str,
    poll: Json<Poll>,
    identity: Identity,
) -> Result<Json<SavedPoll>, ApiError> {
    let poll_id = parse_poll_id(id)?;
    let poll = poll.into_inner();
    if poll.id != poll_id {
        return Err(ApiError::InvalidId);
    }

    let saved = state
        .polls
        .update_poll(Some(&identity), &poll, poll.title.clone(), poll.description.clone())
        .await?;
    Ok(Json(saved))
}

#[delete("/polls/<id>")]
pub async fn delete_poll(
    state: &State<AppState>,
    id: &str,
    identity: Identity,
) -> Result<(), ApiError> {
    let poll_id = parse_poll_id(id)?;
    state.polls.delete_poll(Some(&identity), poll_id).await?;
    Ok(())
}

/// Share-link read: anyone holding the id can fetch the record.
#[get("/polls/<id>")]
pub async fn get_poll(state: &State<AppState>, id: &str) -> Result<Json<SavedPoll>, ApiError> {
    let poll_id = parse_poll_id(id)?;
    state
        .polls
        .load_poll_by_id(poll_id)
        .await
        .map(Json)
        .ok_or_else(not_found)
}

/// Public-write path: a counter increment only. A transient failure is
/// parked in the outbox rather than blocking the voter.
#[instrument(skip(state, request), fields(poll_id = %id))]
#[post("/polls/<id>/vote", format = "json", data = "<request>")]
pub async fn cast_public_vote(
    state: &State<AppState>,
    id: &str,
    request: Json<VoteRequest>,
) -> Result<Json<Option<SavedPoll>>, ApiError> {
    let poll_id = parse_poll_id(id)?;
    let choice_id = request.into_inner().choice_id;

    match state.polls.record_public_vote(poll_id, &choice_id).await {
        Ok(()) => debug!("Recorded public vote"),
        Err(e) if e.code == ErrorCode::NotFound => return Err(e.into()),
        Err(e) => {
            warn!("Deferring public vote on poll {poll_id}: {e}");
            state.outbox.push(PendingVote { poll_id, choice_id });
        }
    }

    Ok(Json(state.polls.load_poll_by_id(poll_id).await))
}

#[get("/polls/<id>/results")]
pub async fn get_results(state: &State<AppState>, id: &str) -> Result<Json<PollResults>, ApiError> {
    let poll_id = parse_poll_id(id)?;
    let saved = state.polls.load_poll_by_id(poll_id).await.ok_or_else(not_found)?;
    Ok(Json(poll_results(&saved.to_poll())))
}

#[get("/polls/<id>/export.csv")]
pub async fn export_csv(
    state: &State<AppState>,
    id: &str,
) -> Result<(ContentType, String), ApiError> {
    let poll_id = parse_poll_id(id)?;
    let saved = state.polls.load_poll_by_id(poll_id).await.ok_or_else(not_found)?;
    Ok((ContentType::CSV, to_csv(&saved.to_poll())))
}

#[get("/polls/<id>/export.json")]
pub async fn export_json(
    state: &State<AppState>,
    id: &str,
) -> Result<(ContentType, String), ApiError> {
    let poll_id = parse_poll_id(id)?;
    let saved = state.polls.load_poll_by_id(poll_id).await.ok_or_else(not_found)?;
    let body = to_json(&saved.to_poll())
        .map_err(|e| Error::with_details(ErrorCode::Transient, "Failed to encode results", e.to_string()))?;
    Ok((ContentType::JSON, body))
}

/// Anonymous share-link view: the poll aggregate ready for voting.
#[get("/share/<id>")]
pub async fn shared_view(state: &State<AppState>, id: &str) -> Result<Json<Poll>, ApiError> {
    let poll_id = parse_poll_id(id)?;
    let mut session = ViewerSession::anonymous();
    resolver::resolve(&state.polls, &mut session, ShareTarget::Vote(poll_id)).await?;
    session.poll.current_poll.map(Json).ok_or_else(not_found)
}

/// Owner-only live results for a shared poll.
#[get("/polls/<id>/host")]
pub async fn host_view(
    state: &State<AppState>,
    id: &str,
    identity: Identity,
) -> Result<Json<PollResults>, ApiError> {
    let poll_id = parse_poll_id(id)?;
    let mut session = ViewerSession::signed_in(identity);
    resolver::resolve(&state.polls, &mut session, ShareTarget::Host(poll_id)).await?;
    let poll = session.poll.current_poll.ok_or_else(not_found)?;
    Ok(Json(poll_results(&poll)))
}

#[get("/workspaces")]
pub async fn list_workspaces(
    state: &State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Workspace>>, ApiError> {
    Ok(Json(state.workspaces.load_workspaces(Some(&identity)).await?))
}

#[post("/workspaces", format = "json", data = "<request>")]
pub async fn create_workspace(
    state: &State<AppState>,
    request: Json<CreateWorkspaceRequest>,
    identity: Identity,
) -> Result<Json<Workspace>, ApiError> {
    let request = request.into_inner();
    let workspace = state
        .workspaces
        .create_workspace(
            Some(&identity),
            request.name,
            request.description,
            request.color,
            request.icon,
        )
        .await?;
    Ok(Json(workspace))
}

#[put("/workspaces/<id>", format = "json", data = "<workspace>")]
pub async fn update_workspace(
    state: &State<AppState>,
    id: &str,
    workspace: Json<Workspace>,
    identity: Identity,
) -> Result<Json<Workspace>, ApiError> {
    let workspace_id = parse_poll_id(id)?;
    let workspace = workspace.into_inner();
    if workspace.id != workspace_id {
        return Err(ApiError::InvalidId);
    }

    let updated = state
        .workspaces
        .update_workspace(Some(&identity), workspace)
        .await?;
    Ok(Json(updated))
}

#[delete("/workspaces/<id>")]
pub async fn delete_workspace(
    state: &State<AppState>,
    id: &str,
    identity: Identity,
) -> Result<(), ApiError> {
    let workspace_id = parse_poll_id(id)?;
    state
        .workspaces
        .delete_workspace(Some(&identity), workspace_id)
        .await?;
    Ok(())
}
