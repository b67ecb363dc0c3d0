//! Per-item vote state and optimistic updates.

use std::sync::Arc;

use ev_protocol::{RatingHistogram, StatusResponse, Vote, VoteRequest};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::SessionResult;
use crate::identity::IdentityManager;
use crate::item::VotableItem;

/// What the page shows for one item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteState {
    pub score: i64,
    pub current_vote: Vote,
    pub histogram: RatingHistogram,
}

/// Authoritative state for one editorial as reported by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub score: i64,
    pub current_vote: Vote,
    pub histogram: RatingHistogram,
}

impl StatusSnapshot {
    /// Decode a `status`/`statuses` result; an absent vote (anonymous) reads as `None`.
    pub fn decode(response: StatusResponse) -> Self {
        let (histogram, rejected) =
            RatingHistogram::from_scores_by_rating(&response.scores_by_rating);
        for err in rejected {
            warn!(%err, "skipping rating range");
        }
        Self {
            score: response.score,
            current_vote: response.current_vote.unwrap_or_default(),
            histogram,
        }
    }
}

impl From<StatusResponse> for StatusSnapshot {
    fn from(response: StatusResponse) -> Self {
        Self::decode(response)
    }
}

/// Vote state machine for one item.
#[derive(Clone, Debug)]
pub struct VoteMachine {
    item: VotableItem,
    state: VoteState,
}

impl VoteMachine {
    pub fn new(item: VotableItem) -> Self {
        Self {
            item,
            state: VoteState::default(),
        }
    }

    pub fn item(&self) -> &VotableItem {
        &self.item
    }

    pub fn state(&self) -> &VoteState {
        &self.state
    }

    /// Switch to `vote`, adjusting the score by the difference in vote values.
    ///
    /// The histogram is left alone; only a server snapshot updates it.
    pub fn apply_local_vote(&mut self, vote: Vote) -> PendingVote {
        let delta = vote.value() - self.state.current_vote.value();
        self.state.score = self.state.score.saturating_add(delta);
        self.state.current_vote = vote;
        PendingVote {
            editorial: self.item.editorial().to_string(),
            vote,
        }
    }

    pub fn apply_server_snapshot(&mut self, snapshot: StatusSnapshot) {
        self.state = VoteState {
            score: snapshot.score,
            current_vote: snapshot.current_vote,
            histogram: snapshot.histogram,
        };
    }
}

/// A vote applied locally but not yet sent to the backend.
#[must_use = "a pending vote does nothing until sent"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingVote {
    pub editorial: String,
    pub vote: Vote,
}

impl PendingVote {
    pub async fn send(self, sender: &VoteSender) -> SessionResult<()> {
        sender.send(&self.editorial, self.vote).await
    }
}

/// Sends votes for one contest with the session's credential.
#[derive(Clone)]
pub struct VoteSender {
    api: ApiClient,
    identity: Arc<IdentityManager>,
    contest: String,
}

impl VoteSender {
    pub fn new(api: ApiClient, identity: Arc<IdentityManager>, contest: impl Into<String>) -> Self {
        Self {
            api,
            identity,
            contest: contest.into(),
        }
    }

    pub fn contest(&self) -> &str {
        &self.contest
    }

    pub async fn send(&self, editorial: &str, vote: Vote) -> SessionResult<()> {
        debug!(%editorial, %vote, "sending vote");
        self.identity
            .with_credential(|credential| {
                let api = self.api.clone();
                let request = VoteRequest {
                    token: credential.into_string(),
                    contest: self.contest.clone(),
                    editorial: editorial.to_string(),
                    vote,
                };
                async move { api.vote(request).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ev_protocol::Endpoint;
    use serde_json::json;

    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::host::testing::FakeHost;
    use crate::store::{Credential, MemCredentialStore};

    fn machine() -> VoteMachine {
        VoteMachine::new(VotableItem::from_link("https://example.com/editorial"))
    }

    #[test]
    fn score_tracks_last_vote_only() {
        let mut m = machine();
        m.apply_server_snapshot(StatusSnapshot {
            score: 10,
            ..StatusSnapshot::default()
        });
        for vote in [Vote::Up, Vote::Down, Vote::Down, Vote::None, Vote::Up, Vote::Down] {
            let _ = m.apply_local_vote(vote);
        }
        assert_eq!(m.state().score, 10 + Vote::Down.value());
        assert_eq!(m.state().current_vote, Vote::Down);
    }

    #[test]
    fn reapplying_current_vote_is_idempotent() {
        let mut m = machine();
        let _ = m.apply_local_vote(Vote::Up);
        let before = *m.state();
        let pending = m.apply_local_vote(Vote::Up);
        assert_eq!(*m.state(), before);
        assert_eq!(pending.vote, Vote::Up);
        assert_eq!(pending.editorial, "https://example.com/editorial");
    }

    #[test]
    fn local_vote_from_existing_server_vote() {
        let mut m = machine();
        m.apply_server_snapshot(StatusSnapshot {
            score: 4,
            current_vote: Vote::Up,
            histogram: RatingHistogram::default(),
        });
        let _ = m.apply_local_vote(Vote::Down);
        assert_eq!(m.state().score, 2);
    }

    #[test]
    fn extreme_server_scores_saturate() {
        let mut m = machine();
        m.apply_server_snapshot(StatusSnapshot {
            score: i64::MAX,
            current_vote: Vote::Down,
            histogram: RatingHistogram::default(),
        });
        let _ = m.apply_local_vote(Vote::Up);
        assert_eq!(m.state().score, i64::MAX);

        m.apply_server_snapshot(StatusSnapshot {
            score: i64::MIN,
            current_vote: Vote::Up,
            histogram: RatingHistogram::default(),
        });
        let _ = m.apply_local_vote(Vote::Down);
        assert_eq!(m.state().score, i64::MIN);
    }

    #[test]
    fn local_votes_leave_histogram_untouched() {
        let mut m = machine();
        let histogram = RatingHistogram::new([1, 0, 0, 0, 0, 0, 0, 2]);
        m.apply_server_snapshot(StatusSnapshot {
            score: 3,
            current_vote: Vote::None,
            histogram,
        });
        let _ = m.apply_local_vote(Vote::Up);
        assert_eq!(m.state().histogram, histogram);
    }

    #[test]
    fn snapshot_decode_buckets_and_defaults_vote() {
        let mut scores = BTreeMap::new();
        scores.insert("2750-2799".to_string(), 3);
        scores.insert("2800-2999".to_string(), 5);
        scores.insert("0-399".to_string(), 2);
        scores.insert("garbage".to_string(), 9);
        let snapshot = StatusSnapshot::decode(StatusResponse {
            score: 10,
            current_vote: None,
            scores_by_rating: scores,
        });
        assert_eq!(snapshot.current_vote, Vote::None);
        assert_eq!(snapshot.histogram.get(6), 3);
        assert_eq!(snapshot.histogram.get(7), 5);
        assert_eq!(snapshot.histogram.get(0), 2);
        assert_eq!(snapshot.histogram.total(), 10);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn pending_vote_posts_vote_with_contest() {
        let transport = Arc::new(ScriptedTransport::default());
        let api = ApiClient::new(transport.clone());
        let identity = IdentityManager::new(
            api.clone(),
            Arc::new(FakeHost::new("alice", "x")),
            Arc::new(MemCredentialStore::with_credential(Credential::new("tok"))),
            "ui.Affiliation",
        )
        .unwrap();
        let sender = VoteSender::new(api, Arc::new(identity), "abc300");
        transport.push(json!({ "status": "success" }));

        let mut m = machine();
        m.apply_local_vote(Vote::Down).send(&sender).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, Endpoint::Vote);
        assert_eq!(
            requests[0].1,
            json!({
                "token": "tok",
                "contest": "abc300",
                "editorial": "https://example.com/editorial",
                "vote": "down",
            })
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_send_does_not_roll_back() {
        let transport = Arc::new(ScriptedTransport::default());
        let api = ApiClient::new(transport.clone());
        let identity = IdentityManager::new(
            api.clone(),
            Arc::new(FakeHost::new("alice", "x")),
            Arc::new(MemCredentialStore::with_credential(Credential::new("tok"))),
            "ui.Affiliation",
        )
        .unwrap();
        let sender = VoteSender::new(api, Arc::new(identity), "abc300");
        transport.push(json!({ "status": "error", "reason": "contest not found" }));

        let mut m = machine();
        let err = m.apply_local_vote(Vote::Up).send(&sender).await.unwrap_err();
        assert!(!err.is_invalid_token());
        assert_eq!(m.state().score, 1);
        assert_eq!(m.state().current_vote, Vote::Up);
    }
}
