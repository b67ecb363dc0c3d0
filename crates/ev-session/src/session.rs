//! Session coordinator: one page's worth of votable items.

use std::sync::Arc;

use ev_protocol::{MAX_STATUSES_BATCH, StatusResponse, Vote};
use tracing::{debug, error, info, warn};

use crate::api::ApiClient;
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::host::{HostSite, PageContext};
use crate::identity::IdentityManager;
use crate::item::VotableItem;
use crate::machine::{PendingVote, StatusSnapshot, VoteMachine, VoteSender, VoteState};
use crate::render::Renderer;
use crate::store::{Credential, CredentialStore};

/// Coordinates the items of one page with the backend.
///
/// Items are addressed by their position on the page. Every state change is
/// pushed to the [`Renderer`].
pub struct Session {
    api: ApiClient,
    host: Arc<dyn HostSite>,
    identity: Arc<IdentityManager>,
    renderer: Arc<dyn Renderer>,
    sender: VoteSender,
    items: Vec<VoteMachine>,
}

impl Session {
    pub fn new(
        api: ApiClient,
        host: Arc<dyn HostSite>,
        identity: Arc<IdentityManager>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let sender = VoteSender::new(api.clone(), identity.clone(), host.context().contest.clone());
        Self {
            api,
            host,
            identity,
            renderer,
            sender,
            items: Vec::new(),
        }
    }

    /// Wire a session over HTTP from `config`.
    pub fn from_config(
        config: &SessionConfig,
        host: Arc<dyn HostSite>,
        store: Arc<dyn CredentialStore>,
        renderer: Arc<dyn Renderer>,
    ) -> SessionResult<Self> {
        let api = ApiClient::http(config)?;
        let identity = IdentityManager::new(
            api.clone(),
            host.clone(),
            store,
            config.affiliation_field.clone(),
        )?;
        Ok(Self::new(api, host, Arc::new(identity), renderer))
    }

    pub fn context(&self) -> &PageContext {
        self.host.context()
    }

    pub fn identity(&self) -> &Arc<IdentityManager> {
        &self.identity
    }

    /// Handle for sending pending votes independently of the session borrow.
    pub fn sender(&self) -> &VoteSender {
        &self.sender
    }

    pub fn items(&self) -> &[VoteMachine] {
        &self.items
    }

    pub fn state(&self, index: usize) -> Option<&VoteState> {
        self.items.get(index).map(VoteMachine::state)
    }

    /// Replace the tracked items with the editorial links the host page shows.
    pub async fn discover(&mut self) -> SessionResult<usize> {
        let links = self.host.editorial_links().await?;
        self.items.clear();
        for link in links {
            self.track(link);
        }
        info!(count = self.items.len(), "discovered editorial links");
        Ok(self.items.len())
    }

    /// Start tracking one link; returns its index.
    pub fn track(&mut self, raw: impl Into<String>) -> usize {
        let index = self.items.len();
        self.items.push(VoteMachine::new(VotableItem::from_link(raw)));
        self.render(index);
        index
    }

    /// Overwrite every item with the backend's current state.
    ///
    /// A credential the backend refuses is dropped and the query is repeated
    /// anonymously.
    pub async fn reconcile(&mut self) -> SessionResult<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        let editorials: Vec<String> = self
            .items
            .iter()
            .map(|m| m.item().editorial().to_string())
            .collect();

        let credential = self.identity.cached();
        let results = match self.query_statuses(credential.as_ref(), &editorials).await {
            Err(err) if err.is_invalid_token() => {
                self.drop_refused(credential.as_ref())?;
                self.query_statuses(None, &editorials).await?
            }
            other => other?,
        };

        for (index, status) in results.into_iter().enumerate() {
            self.items[index].apply_server_snapshot(StatusSnapshot::decode(status));
            self.render(index);
        }
        Ok(())
    }

    /// Resynchronize one item through the single-editorial endpoint.
    pub async fn refresh(&mut self, index: usize) -> SessionResult<()> {
        let editorial = self.machine(index)?.item().editorial().to_string();
        let credential = self.identity.cached();
        let status = match self.api.status(&editorial, credential.as_ref()).await {
            Err(err) if err.is_invalid_token() => {
                self.drop_refused(credential.as_ref())?;
                self.api.status(&editorial, None).await?
            }
            other => other?,
        };
        self.items[index].apply_server_snapshot(StatusSnapshot::decode(status));
        self.render(index);
        Ok(())
    }

    /// Apply `vote` optimistically and hand back the send for the caller to run.
    pub fn click(&mut self, index: usize, vote: Vote) -> SessionResult<PendingVote> {
        let pending = self.machine_mut(index)?.apply_local_vote(vote);
        self.render(index);
        Ok(pending)
    }

    /// [`Session::click`] followed by the send. Send failures are logged and
    /// returned; the optimistic state stays.
    pub async fn vote(&mut self, index: usize, vote: Vote) -> SessionResult<()> {
        let pending = self.click(index, vote)?;
        let editorial = pending.editorial.clone();
        pending.send(&self.sender).await.inspect_err(|err| {
            error!(%editorial, %err, "vote was not recorded");
        })
    }

    async fn query_statuses(
        &self,
        credential: Option<&Credential>,
        editorials: &[String],
    ) -> SessionResult<Vec<StatusResponse>> {
        let mut results = Vec::with_capacity(editorials.len());
        for chunk in editorials.chunks(MAX_STATUSES_BATCH) {
            debug!(size = chunk.len(), "querying statuses");
            results.extend(self.api.statuses(credential, chunk).await?);
        }
        Ok(results)
    }

    fn drop_refused(&self, credential: Option<&Credential>) -> SessionResult<()> {
        warn!("backend refused the cached credential; continuing anonymously");
        if let Some(credential) = credential {
            self.identity.invalidate_stale(credential)?;
        }
        Ok(())
    }

    fn machine(&self, index: usize) -> SessionResult<&VoteMachine> {
        self.items.get(index).ok_or(SessionError::UnknownItem(index))
    }

    fn machine_mut(&mut self, index: usize) -> SessionResult<&mut VoteMachine> {
        self.items
            .get_mut(index)
            .ok_or(SessionError::UnknownItem(index))
    }

    fn render(&self, index: usize) {
        if let Some(machine) = self.items.get(index) {
            self.renderer.render(index, machine.item(), machine.state());
        }
    }
}
