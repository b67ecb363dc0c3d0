//! Presentation seam.

use crate::item::VotableItem;
use crate::machine::VoteState;

/// Receives every state change the session makes. Implementations only draw.
pub trait Renderer: Send + Sync {
    fn render(&self, index: usize, item: &VotableItem, state: &VoteState);
}

/// Renderer that draws nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _index: usize, _item: &VotableItem, _state: &VoteState) {}
}
