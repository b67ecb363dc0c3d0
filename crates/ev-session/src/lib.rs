//! Vote session engine for community editorial voting.
//!
//! The engine keeps one optimistic vote state machine per editorial link,
//! reconciles them against the voting backend in a single batched query, and
//! authenticates lazily through an affiliation-field handshake on the host
//! site. Presentation is left to a [`Renderer`] supplied by the caller.

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod identity;
pub mod item;
pub mod machine;
pub mod render;
pub mod session;
pub mod store;

pub use api::{ApiClient, HttpTransport, Transport};
pub use config::SessionConfig;
pub use error::{
    ApiError, AuthError, HandshakeStep, HostError, SessionError, SessionResult, StoreError,
    TransportError,
};
pub use host::{AtCoderHost, HostSite, PageContext, ProfileForm};
pub use identity::IdentityManager;
pub use item::{VotableItem, canonicalize_editorial_link};
pub use machine::{PendingVote, StatusSnapshot, VoteMachine, VoteSender, VoteState};
pub use render::{NullRenderer, Renderer};
pub use session::Session;
pub use store::{Credential, CredentialStore, FsCredentialStore, MemCredentialStore};

pub use ev_protocol::{RatingHistogram, Vote};
