use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use ev_protocol::{Endpoint, INVALID_TOKEN_REASON};
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// The backend could not be reached or answered with something unusable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("transport error calling {endpoint}: {message}")]
pub struct TransportError {
    pub endpoint: Endpoint,
    pub message: String,
}

impl TransportError {
    pub fn new(endpoint: Endpoint, message: impl Into<String>) -> Self {
        Self {
            endpoint,
            message: message.into(),
        }
    }
}

/// The backend answered with an explicit `status: "error"` envelope.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{endpoint} rejected: {reason}")]
pub struct ApiError {
    pub endpoint: Endpoint,
    pub reason: String,
}

impl ApiError {
    pub fn new(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self {
            endpoint,
            reason: reason.into(),
        }
    }

    pub fn is_invalid_token(&self) -> bool {
        self.reason == INVALID_TOKEN_REASON
    }
}

/// Steps of the affiliation handshake, used to locate failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeStep {
    AffiliationToken,
    FetchProfile,
    WriteAffiliation,
    CreateToken,
    RestoreAffiliation,
}

impl fmt::Display for HandshakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeStep::AffiliationToken => "affiliation-token",
            HandshakeStep::FetchProfile => "fetch-profile",
            HandshakeStep::WriteAffiliation => "write-affiliation",
            HandshakeStep::CreateToken => "create-token",
            HandshakeStep::RestoreAffiliation => "restore-affiliation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not signed in to the host site")]
    Anonymous,
    #[error("site identity '{0}' is not a valid user name")]
    InvalidIdentity(String),
    #[error("profile form has no '{0}' field")]
    MissingField(String),
    #[error("handshake step {step} failed: {source}")]
    Step {
        step: HandshakeStep,
        #[source]
        source: Box<SessionError>,
    },
}

impl AuthError {
    pub fn step(step: HandshakeStep, source: impl Into<SessionError>) -> Self {
        AuthError::Step {
            step,
            source: Box::new(source.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("could not find {what} in {url}")]
    Parse { url: String, what: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source: err,
    }
}

/// Unified error for every engine operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("host site error: {0}")]
    Host(#[from] HostError),
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),
    #[error("no votable item at index {0}")]
    UnknownItem(usize),
    #[error("configuration error: {0}")]
    Config(String),
    /// One failure handed to several callers that joined the same attempt.
    #[error(transparent)]
    Shared(Arc<SessionError>),
}

impl SessionError {
    /// True when the backend refused the session credential.
    pub fn is_invalid_token(&self) -> bool {
        match self {
            SessionError::Api(err) => err.is_invalid_token(),
            SessionError::Shared(inner) => inner.is_invalid_token(),
            _ => false,
        }
    }

    /// Take the error back out of an `Arc`, wrapping it when still shared.
    pub(crate) fn unshare(err: Arc<SessionError>) -> SessionError {
        Arc::try_unwrap(err).unwrap_or_else(SessionError::Shared)
    }
}
