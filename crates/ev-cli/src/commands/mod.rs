//! CLI command handlers.

pub mod login;
pub mod status;
pub mod vote;

use ev_session::{Renderer, VotableItem, VoteState};
use tracing::debug;

/// Traces every state change; final output is printed by the command.
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&self, index: usize, item: &VotableItem, state: &VoteState) {
        debug!(
            index,
            editorial = item.editorial(),
            score = state.score,
            vote = %state.current_vote,
            "item updated"
        );
    }
}
