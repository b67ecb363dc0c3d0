//! Backend identity via the affiliation-field handshake.
//!
//! The backend cannot ask the host site who the user is, but it can read a
//! user's public profile. Proof of control is therefore established by
//! writing a backend-issued affiliation token into the user's profile
//! "affiliation" field, letting the backend observe it, and restoring the
//! original value afterwards.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::error::{AuthError, HandshakeStep, SessionError, SessionResult};
use crate::host::HostSite;
use crate::store::{Credential, CredentialStore};

/// Owns the backend credential: caches it, persists it, and re-creates it on demand.
pub struct IdentityManager {
    api: ApiClient,
    host: Arc<dyn HostSite>,
    store: Arc<dyn CredentialStore>,
    affiliation_field: String,
    credential: RwLock<Option<Credential>>,
    // The attempt callers currently join; cleared once it settles.
    in_flight: Mutex<Option<Arc<HandshakeAttempt>>>,
}

type HandshakeAttempt = OnceCell<Result<Credential, Arc<SessionError>>>;

impl std::fmt::Debug for IdentityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityManager")
            .field("affiliation_field", &self.affiliation_field)
            .field("credential", &self.cached())
            .finish()
    }
}

impl IdentityManager {
    /// Create a manager, picking up any credential persisted by an earlier run.
    pub fn new(
        api: ApiClient,
        host: Arc<dyn HostSite>,
        store: Arc<dyn CredentialStore>,
        affiliation_field: impl Into<String>,
    ) -> SessionResult<Self> {
        let persisted = store.load()?;
        Ok(Self {
            api,
            host,
            store,
            affiliation_field: affiliation_field.into(),
            credential: RwLock::new(persisted),
            in_flight: Mutex::new(None),
        })
    }

    /// Current credential without authenticating.
    pub fn cached(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the cached credential, running the handshake when there is none.
    ///
    /// Concurrent callers share one handshake attempt and all receive its
    /// outcome, failure included. A caller arriving after the attempt settled
    /// starts a new one.
    pub async fn ensure_credential(&self) -> SessionResult<Credential> {
        if let Some(credential) = self.cached() {
            return Ok(credential);
        }
        let attempt = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(Default::default)
            .clone();
        let outcome = attempt
            .get_or_init(|| async {
                // An attempt that settled just before this one was joined may
                // already have cached a credential.
                match self.cached() {
                    Some(credential) => Ok(credential),
                    None => self.handshake().await.map_err(Arc::new),
                }
            })
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if in_flight.as_ref().is_some_and(|current| Arc::ptr_eq(current, &attempt)) {
                *in_flight = None;
            }
        }
        drop(attempt);
        outcome.map_err(SessionError::unshare)
    }

    /// Forget the credential, in memory and in durable storage.
    pub fn invalidate(&self) -> SessionResult<()> {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.store.clear()?;
        info!("credential invalidated");
        Ok(())
    }

    /// Invalidate only if `stale` is still the cached credential.
    ///
    /// A credential replaced by a concurrent handshake is left alone.
    pub fn invalidate_stale(&self, stale: &Credential) -> SessionResult<bool> {
        if self.cached().as_ref() != Some(stale) {
            return Ok(false);
        }
        self.invalidate()?;
        Ok(true)
    }

    /// Run `op` with a credential; if the backend reports it invalid, re-authenticate
    /// and run `op` once more.
    pub async fn with_credential<T, F, Fut>(&self, op: F) -> SessionResult<T>
    where
        F: Fn(Credential) -> Fut,
        Fut: Future<Output = SessionResult<T>>,
    {
        let credential = self.ensure_credential().await?;
        match op(credential.clone()).await {
            Err(err) if err.is_invalid_token() => {
                warn!("backend rejected credential; re-authenticating");
                self.invalidate_stale(&credential)?;
                let fresh = self.ensure_credential().await?;
                let retried = op(fresh.clone()).await;
                if retried.as_ref().is_err_and(SessionError::is_invalid_token) {
                    error!("backend rejected a freshly issued credential");
                    self.invalidate_stale(&fresh)?;
                }
                retried
            }
            other => other,
        }
    }

    fn site_identity(&self) -> Result<String, AuthError> {
        let user = self.host.context().user.clone().ok_or(AuthError::Anonymous)?;
        let valid = (3..=16).contains(&user.len()) && user.chars().all(|c| c.is_ascii_alphanumeric());
        if valid {
            Ok(user)
        } else {
            Err(AuthError::InvalidIdentity(user))
        }
    }

    async fn handshake(&self) -> SessionResult<Credential> {
        let atcoder_id = self.site_identity()?;
        info!(user = %atcoder_id, "starting affiliation handshake");

        let affiliation_token = self
            .api
            .create_affiliation_token(&atcoder_id)
            .await
            .map_err(|e| AuthError::step(HandshakeStep::AffiliationToken, e))?;

        let mut form = self
            .host
            .fetch_profile()
            .await
            .map_err(|e| AuthError::step(HandshakeStep::FetchProfile, e))?;
        let old_affiliation = form
            .get(&self.affiliation_field)
            .map(str::to_string)
            .ok_or_else(|| AuthError::MissingField(self.affiliation_field.clone()))?;

        form.set(&self.affiliation_field, affiliation_token.as_str());
        let outcome = match self.host.submit_profile(&form).await {
            Ok(()) => self
                .api
                .create_token(&atcoder_id, &affiliation_token)
                .await
                .map_err(|e| AuthError::step(HandshakeStep::CreateToken, e)),
            Err(e) => Err(AuthError::step(HandshakeStep::WriteAffiliation, e)),
        };

        // Runs on every path once the profile may have been written.
        form.set(&self.affiliation_field, old_affiliation);
        let restored = self.host.submit_profile(&form).await;

        let credential = match outcome {
            Ok(credential) => credential,
            Err(err) => {
                if let Err(restore_err) = restored {
                    error!(%restore_err, "failed to restore profile affiliation");
                }
                warn!(%err, "affiliation handshake failed");
                return Err(err.into());
            }
        };

        self.store.save(&credential)?;
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());

        if let Err(restore_err) = restored {
            error!(%restore_err, "credential issued but profile affiliation was not restored");
            return Err(AuthError::step(HandshakeStep::RestoreAffiliation, restore_err).into());
        }
        info!(user = %atcoder_id, "affiliation handshake complete");
        Ok(credential)
    }
}
