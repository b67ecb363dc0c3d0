use std::collections::{BTreeMap, HashMap, VecDeque};

use ev_protocol::{Endpoint, StatusResponse, Vote};

/// A host-site account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakeUser {
    pub rating: i64,
    pub affiliation: String,
    /// Value of the session cookie that signs in as this user.
    pub session: String,
}

/// Everything both fake services know.
#[derive(Debug, Default)]
pub struct World {
    pub users: BTreeMap<String, FakeUser>,
    /// Last affiliation token issued per user.
    pub affiliation_tokens: HashMap<String, String>,
    /// Live credentials and the user each belongs to.
    pub tokens: HashMap<String, String>,
    /// `(editorial, user) -> (vote, voter rating)`.
    pub votes: BTreeMap<(String, String), (Vote, i64)>,
    /// Editorial page path (e.g. `contests/abc300/editorial`) to anchor hrefs.
    pub editorial_pages: BTreeMap<String, Vec<String>>,
    /// When set, `create-token` rejects with this reason.
    pub create_token_failure: Option<String>,
    /// Scripted outcomes for settings submissions; `Some(status)` rejects one.
    pub settings_post_outcomes: VecDeque<Option<u16>>,
    /// Every accepted affiliation write, in order.
    pub affiliation_history: Vec<(String, String)>,
    calls: BTreeMap<String, usize>,
    next_id: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, name: &str, rating: i64, affiliation: &str) -> Self {
        self.users.insert(
            name.to_string(),
            FakeUser {
                rating,
                affiliation: affiliation.to_string(),
                session: format!("session-{name}"),
            },
        );
        self
    }

    pub fn with_editorial_page(mut self, path: &str, hrefs: &[&str]) -> Self {
        self.editorial_pages.insert(
            path.trim_matches('/').to_string(),
            hrefs.iter().map(|h| h.to_string()).collect(),
        );
        self
    }

    /// Issue a credential directly, skipping the handshake.
    pub fn issue_token(&mut self, user: &str) -> String {
        self.next_id += 1;
        let token = format!("tok-{user}-{}", self.next_id);
        self.tokens.insert(token.clone(), user.to_string());
        token
    }

    pub(crate) fn issue_affiliation_token(&mut self, user: &str) -> String {
        self.next_id += 1;
        let token = format!("aff-{user}-{}", self.next_id);
        self.affiliation_tokens.insert(user.to_string(), token.clone());
        token
    }

    pub fn revoke_all_tokens(&mut self) {
        self.tokens.clear();
    }

    pub fn user_for_token(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    pub fn user_for_session(&self, session: &str) -> Option<&str> {
        self.users
            .iter()
            .find(|(_, user)| user.session == session)
            .map(|(name, _)| name.as_str())
    }

    pub fn affiliation(&self, user: &str) -> Option<&str> {
        self.users.get(user).map(|u| u.affiliation.as_str())
    }

    pub fn session_of(&self, user: &str) -> Option<&str> {
        self.users.get(user).map(|u| u.session.as_str())
    }

    pub(crate) fn record_call(&mut self, endpoint: Endpoint) {
        *self.calls.entry(endpoint.path().to_string()).or_default() += 1;
    }

    /// Number of requests the backend has received on `endpoint`.
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls.get(endpoint.path()).copied().unwrap_or_default()
    }

    /// Record `user`'s vote as the backend would; `None` withdraws it.
    pub fn record_vote(&mut self, user: &str, editorial: &str, vote: Vote) {
        let key = (editorial.to_string(), user.to_string());
        if vote == Vote::None {
            self.votes.remove(&key);
            return;
        }
        let rating = self.users.get(user).map_or(0, |u| u.rating);
        self.votes.insert(key, (vote, rating));
    }

    /// Backend view of one editorial for `viewer` (anonymous when `None`).
    pub fn status(&self, editorial: &str, viewer: Option<&str>) -> StatusResponse {
        let mut score = 0;
        let mut scores_by_rating = BTreeMap::new();
        let mut current_vote = viewer.map(|_| Vote::None);
        for ((voted, user), (vote, rating)) in &self.votes {
            if voted != editorial {
                continue;
            }
            score += vote.value();
            let level = rating / 100;
            *scores_by_rating
                .entry(format!("{}-{}", level * 100, level * 100 + 99))
                .or_insert(0) += vote.value();
            if viewer == Some(user.as_str()) {
                current_vote = Some(*vote);
            }
        }
        StatusResponse {
            score,
            current_vote,
            scores_by_rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_groups_votes_by_rating_level() {
        let mut world = World::new()
            .with_user("alice", 2750, "")
            .with_user("bob", 2790, "")
            .with_user("carol", 400, "");
        world.record_vote("alice", "https://e/1", Vote::Up);
        world.record_vote("bob", "https://e/1", Vote::Up);
        world.record_vote("carol", "https://e/1", Vote::Down);

        let status = world.status("https://e/1", Some("carol"));
        assert_eq!(status.score, 1);
        assert_eq!(status.current_vote, Some(Vote::Down));
        assert_eq!(status.scores_by_rating["2700-2799"], 2);
        assert_eq!(status.scores_by_rating["400-499"], -1);
        assert_eq!(world.status("https://e/1", None).current_vote, None);
    }

    #[test]
    fn voting_none_withdraws() {
        let mut world = World::new().with_user("alice", 1000, "");
        world.record_vote("alice", "https://e/1", Vote::Up);
        world.record_vote("alice", "https://e/1", Vote::None);
        let status = world.status("https://e/1", Some("alice"));
        assert_eq!(status.score, 0);
        assert_eq!(status.current_vote, Some(Vote::None));
        assert!(status.scores_by_rating.is_empty());
    }
}
