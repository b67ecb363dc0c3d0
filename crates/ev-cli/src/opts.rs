//! Global CLI options and session wiring.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use ev_session::{
    AtCoderHost, FsCredentialStore, PageContext, Renderer, Session, SessionConfig,
};

/// Global options for CLI commands.
///
/// These options apply to all commands and can be set via env vars.
#[derive(Args, Debug, Clone)]
pub struct SiteOpts {
    /// Contest whose editorials to use (env: EV_CONTEST)
    #[arg(short = 'c', long, global = true, env = "EV_CONTEST")]
    pub contest: Option<String>,

    /// Restrict to one task's editorial page, e.g. abc300_a
    #[arg(short = 't', long, global = true)]
    pub task: Option<String>,

    /// Host site user name (env: EV_USER)
    #[arg(short = 'u', long, global = true, env = "EV_USER")]
    pub user: Option<String>,

    /// Host site session cookie value (env: EV_SESSION_COOKIE)
    #[arg(long, global = true, env = "EV_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,

    /// Voting backend base URL (env: EV_BACKEND_URL)
    #[arg(long, global = true, env = "EV_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Host site origin (env: EV_HOST_ORIGIN)
    #[arg(long, global = true, env = "EV_HOST_ORIGIN")]
    pub host_origin: Option<String>,

    /// Request timeout in milliseconds (env: EV_TIMEOUT_MS)
    #[arg(long, global = true, env = "EV_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Directory holding the stored credential (env: EV_STATE_DIR, default: ~/.ev)
    #[arg(long, global = true, env = "EV_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// JSON output envelope
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output (implies --json)
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Suppress notices
    #[arg(long, global = true)]
    pub quiet: bool,
}

impl SiteOpts {
    pub fn config(&self) -> Result<SessionConfig> {
        let mut config =
            SessionConfig::from_env().context("read session configuration from environment")?;
        if let Some(url) = &self.backend_url {
            config = config.with_backend_url(url);
        }
        if let Some(origin) = &self.host_origin {
            config = config.with_host_origin(origin);
        }
        if let Some(millis) = self.timeout_ms {
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }

    pub fn contest(&self) -> Result<&str> {
        self.contest
            .as_deref()
            .context("no contest specified; pass --contest or set EV_CONTEST")
    }

    pub fn page_context(&self) -> PageContext {
        let mut context = PageContext::new(self.contest.clone().unwrap_or_default());
        if let Some(user) = &self.user {
            context = context.with_user(user);
        }
        if let Some(task) = &self.task {
            context = context.with_task(task);
        }
        context
    }

    /// Resolve the state directory.
    ///
    /// Priority: `--state-dir`, `EV_STATE_DIR` (handled by clap), `$HOME/.ev`.
    pub fn state_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.state_dir {
            return Ok(dir.clone());
        }
        let home = std::env::var_os("HOME")
            .context("no state directory; pass --state-dir or set EV_STATE_DIR")?;
        Ok(PathBuf::from(home).join(".ev"))
    }

    pub fn open_store(&self, config: &SessionConfig) -> Result<FsCredentialStore> {
        let dir = self.state_dir()?;
        FsCredentialStore::open(&dir, &config.credential_slot)
            .with_context(|| format!("open credential store in {}", dir.display()))
    }

    pub fn session(&self, renderer: Arc<dyn Renderer>) -> Result<Session> {
        let config = self.config()?;
        let store = self.open_store(&config)?;
        let host = AtCoderHost::new(&config, self.page_context(), self.session_cookie.as_deref())
            .context("configure host site client")?;
        Session::from_config(&config, Arc::new(host), Arc::new(store), renderer)
            .context("configure session")
    }
}
