//! Request and response bodies, one pair per endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Vote;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAffiliationTokenRequest {
    pub atcoder_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAffiliationTokenResponse {
    pub affiliation_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub atcoder_id: String,
    pub affiliation_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenResponse {
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub token: String,
    pub contest: String,
    pub editorial: String,
    pub vote: Vote,
}

/// The backend acknowledges a vote with an otherwise empty success envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResponse {}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub editorial: String,
    pub token: Option<String>,
}

/// Aggregate state of one editorial as seen by the backend.
///
/// `current_vote` is `null` for anonymous queries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub score: i64,
    #[serde(default)]
    pub current_vote: Option<Vote>,
    #[serde(default)]
    pub scores_by_rating: BTreeMap<String, i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusesRequest {
    pub token: Option<String>,
    pub editorials: Vec<String>,
}

/// Positionally aligned with [`StatusesRequest::editorials`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusesResponse {
    pub results: Vec<StatusResponse>,
}
