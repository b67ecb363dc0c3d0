//! `ev vote` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ev_session::Vote;

use super::LogRenderer;
use crate::opts::SiteOpts;
use crate::output::{item_json, item_text, print_success};

#[derive(Args, Debug)]
pub struct VoteArgs {
    /// Editorial page index (see `ev status`) or editorial URL
    pub target: String,

    /// up, down or none
    pub vote: Vote,
}

pub async fn cmd_vote(opts: &SiteOpts, args: &VoteArgs) -> Result<()> {
    opts.contest()?;
    let mut session = opts.session(Arc::new(LogRenderer))?;
    let mut warnings = Vec::new();

    let index = match args.target.parse::<usize>() {
        Ok(index) => {
            session.discover().await.context("list editorials")?;
            if index >= session.items().len() {
                anyhow::bail!(
                    "no editorial at index {index} (page has {})",
                    session.items().len()
                );
            }
            index
        }
        Err(_) => session.track(args.target.clone()),
    };

    // The optimistic delta is taken against the user's stored vote.
    session.refresh(index).await.context("read current vote")?;
    session
        .vote(index, args.vote)
        .await
        .with_context(|| format!("vote {} on {}", args.vote, args.target))?;
    if let Err(err) = session.refresh(index).await {
        warnings.push(format!("vote recorded but refresh failed: {err}"));
    }

    let machine = &session.items()[index];
    print_success(
        opts,
        item_json(index, machine.item(), machine.state()),
        || item_text(index, machine.item(), machine.state()),
        warnings,
    )
}
