//! Fake voting backend. Every reply is HTTP 200 with a status envelope.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use ev_protocol::{
    CreateAffiliationTokenRequest, CreateAffiliationTokenResponse, CreateTokenRequest,
    CreateTokenResponse, Endpoint, INVALID_TOKEN_REASON, MAX_STATUSES_BATCH, Reply, StatusRequest,
    StatusResponse, StatusesRequest, StatusesResponse, VoteRequest, VoteResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::{World, WorldHandle};

pub(crate) fn router() -> Router<WorldHandle> {
    Router::new()
        .route("/create-affiliation-token", post(create_affiliation_token))
        .route("/create-token", post(create_token))
        .route("/vote", post(vote))
        .route("/status", post(status))
        .route("/statuses", post(statuses))
}

fn respond<T: Serialize>(result: Result<T, String>) -> Json<Value> {
    let reply = match result {
        Ok(payload) => Reply::Success(payload),
        Err(reason) => Reply::Error { reason },
    };
    Json(
        reply
            .to_json()
            .unwrap_or_else(|e| json!({ "status": "error", "reason": e.to_string() })),
    )
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, String> {
    serde_json::from_value(body).map_err(|_| "invalid request".to_string())
}

fn valid_atcoder_id(id: &str) -> bool {
    (3..=16).contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Resolve an optional credential; a present but unknown one is rejected.
fn viewer(world: &World, token: Option<&str>) -> Result<Option<String>, String> {
    match token {
        None => Ok(None),
        Some(token) => world
            .user_for_token(token)
            .map(|user| Some(user.to_string()))
            .ok_or_else(|| INVALID_TOKEN_REASON.to_string()),
    }
}

async fn create_affiliation_token(
    State(world): State<WorldHandle>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut world = world.lock();
    world.record_call(Endpoint::CreateAffiliationToken);
    respond(handle_create_affiliation_token(&mut world, body))
}

fn handle_create_affiliation_token(
    world: &mut World,
    body: Value,
) -> Result<CreateAffiliationTokenResponse, String> {
    let req: CreateAffiliationTokenRequest = parse(body)?;
    if !valid_atcoder_id(&req.atcoder_id) {
        return Err("invalid atcoder id".to_string());
    }
    Ok(CreateAffiliationTokenResponse {
        affiliation_token: world.issue_affiliation_token(&req.atcoder_id),
    })
}

async fn create_token(State(world): State<WorldHandle>, Json(body): Json<Value>) -> Json<Value> {
    let mut world = world.lock();
    world.record_call(Endpoint::CreateToken);
    respond(handle_create_token(&mut world, body))
}

fn handle_create_token(world: &mut World, body: Value) -> Result<CreateTokenResponse, String> {
    let req: CreateTokenRequest = parse(body)?;
    if let Some(reason) = &world.create_token_failure {
        return Err(reason.clone());
    }
    if !valid_atcoder_id(&req.atcoder_id) {
        return Err("invalid atcoder id".to_string());
    }
    if world.affiliation_tokens.get(&req.atcoder_id) != Some(&req.affiliation_token) {
        return Err("invalid affiliation_token".to_string());
    }
    let shown = world
        .affiliation(&req.atcoder_id)
        .ok_or_else(|| "invalid atcoder id".to_string())?;
    if shown != req.affiliation_token {
        return Err("affiliation_token not matched".to_string());
    }
    Ok(CreateTokenResponse {
        token: world.issue_token(&req.atcoder_id),
    })
}

async fn vote(State(world): State<WorldHandle>, Json(body): Json<Value>) -> Json<Value> {
    let mut world = world.lock();
    world.record_call(Endpoint::Vote);
    respond(handle_vote(&mut world, body))
}

fn handle_vote(world: &mut World, body: Value) -> Result<VoteResponse, String> {
    let req: VoteRequest = parse(body)?;
    let user = viewer(world, Some(&req.token))?.unwrap_or_default();
    world.record_vote(&user, &req.editorial, req.vote);
    Ok(VoteResponse {})
}

async fn status(State(world): State<WorldHandle>, Json(body): Json<Value>) -> Json<Value> {
    let mut world = world.lock();
    world.record_call(Endpoint::Status);
    respond(handle_status(&world, body))
}

fn handle_status(world: &World, body: Value) -> Result<StatusResponse, String> {
    let req: StatusRequest = parse(body)?;
    let user = viewer(world, req.token.as_deref())?;
    Ok(world.status(&req.editorial, user.as_deref()))
}

async fn statuses(State(world): State<WorldHandle>, Json(body): Json<Value>) -> Json<Value> {
    let mut world = world.lock();
    world.record_call(Endpoint::Statuses);
    respond(handle_statuses(&world, body))
}

fn handle_statuses(world: &World, body: Value) -> Result<StatusesResponse, String> {
    let req: StatusesRequest = parse(body)?;
    if req.editorials.len() > MAX_STATUSES_BATCH {
        return Err(format!(
            "number of editorials must be less than or equal to {MAX_STATUSES_BATCH}"
        ));
    }
    let user = viewer(world, req.token.as_deref())?;
    Ok(StatusesResponse {
        results: req
            .editorials
            .iter()
            .map(|editorial| world.status(editorial, user.as_deref()))
            .collect(),
    })
}
