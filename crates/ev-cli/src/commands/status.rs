//! `ev status` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use super::LogRenderer;
use crate::opts::SiteOpts;
use crate::output::{item_json, item_text, print_success};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show the editorial at this page index
    #[arg(long)]
    pub index: Option<usize>,
}

pub async fn cmd_status(opts: &SiteOpts, args: &StatusArgs) -> Result<()> {
    let contest = opts.contest()?.to_string();
    let mut session = opts.session(Arc::new(LogRenderer))?;
    let mut warnings = Vec::new();

    let found = session
        .discover()
        .await
        .with_context(|| format!("list editorials for {contest}"))?;
    if found == 0 {
        warnings.push(format!("no editorial links on the {contest} editorial page"));
    }
    session.reconcile().await.context("query editorial scores")?;
    if session.identity().cached().is_none() {
        warnings.push("not signed in; current votes are not shown".into());
    }

    let selected: Vec<usize> = match args.index {
        Some(index) if index < session.items().len() => vec![index],
        Some(index) => anyhow::bail!("no editorial at index {index} (page has {found})"),
        None => (0..session.items().len()).collect(),
    };
    let items = session.items();
    let data = serde_json::json!({
        "contest": contest,
        "task": opts.task,
        "items": selected
            .iter()
            .map(|&i| item_json(i, items[i].item(), items[i].state()))
            .collect::<Vec<_>>(),
    });
    print_success(
        opts,
        data,
        || {
            selected
                .iter()
                .map(|&i| item_text(i, items[i].item(), items[i].state()))
                .collect()
        },
        warnings,
    )
}
