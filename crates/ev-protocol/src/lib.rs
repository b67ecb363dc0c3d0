//! Wire contract shared by the editorial voting client and its test doubles.
//!
//! Every backend endpoint takes a JSON object and answers either with a
//! success payload or with `{"status": "error", "reason": "..."}`. The types
//! here describe both halves; [`decode_reply`] separates them.

pub mod endpoint;
pub mod envelope;
pub mod histogram;
pub mod messages;
pub mod vote;

pub use endpoint::Endpoint;
pub use envelope::{Reply, decode_reply};
pub use histogram::{BUCKET_WIDTH, RATING_BUCKETS, RatingHistogram, TOP_BUCKET_FLOOR};
pub use messages::*;
pub use vote::Vote;

/// Reason string the backend uses when a session token is no longer accepted.
pub const INVALID_TOKEN_REASON: &str = "invalid token";

/// Largest `editorials` list the backend accepts in one `statuses` call.
pub const MAX_STATUSES_BATCH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid rating range key '{0}'")]
    InvalidRatingRange(String),
    #[error("unknown endpoint '{0}'")]
    UnknownEndpoint(String),
}
