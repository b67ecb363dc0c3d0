//! `ev login` and `ev logout` commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use ev_session::{CredentialStore, NullRenderer};
use serde_json::json;

use crate::opts::SiteOpts;
use crate::output::print_success;

pub async fn cmd_login(opts: &SiteOpts) -> Result<()> {
    let session = opts.session(Arc::new(NullRenderer))?;
    let identity = session.identity();
    let already = identity.cached().is_some();
    identity
        .ensure_credential()
        .await
        .context("authenticate with the voting backend")?;
    let user = opts.user.clone().unwrap_or_default();
    let state_dir = opts.state_dir()?;
    print_success(
        opts,
        json!({
            "user": user,
            "state_dir": state_dir,
            "handshake": !already,
        }),
        || {
            if already {
                format!("already signed in as {user}\n")
            } else {
                format!("signed in as {user}\n")
            }
        },
        Vec::new(),
    )
}

pub fn cmd_logout(opts: &SiteOpts) -> Result<()> {
    let config = opts.config()?;
    let store = opts.open_store(&config)?;
    let had = store.load().context("read stored credential")?.is_some();
    store.clear().context("clear stored credential")?;
    print_success(
        opts,
        json!({ "cleared": had }),
        || {
            if had {
                "signed out\n".to_string()
            } else {
                "no stored credential\n".to_string()
            }
        },
        Vec::new(),
    )
}
