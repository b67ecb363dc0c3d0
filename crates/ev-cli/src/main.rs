mod commands;
mod opts;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::status::StatusArgs;
use commands::vote::VoteArgs;
use opts::SiteOpts;

#[derive(Parser, Debug)]
#[command(name = "ev", version, about = "Community editorial voting client")]
struct Cli {
    #[command(flatten)]
    opts: SiteOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show scores and rating histograms for a contest's editorials
    Status(StatusArgs),

    /// Vote on an editorial (by page index or URL)
    Vote(VoteArgs),

    /// Authenticate with the voting backend through the profile handshake
    Login,

    /// Forget the stored backend credential
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    setup_logging();
    let opts = &cli.opts;

    match cli.command {
        Command::Status(args) => commands::status::cmd_status(opts, &args).await,
        Command::Vote(args) => commands::vote::cmd_vote(opts, &args).await,
        Command::Login => commands::login::cmd_login(opts).await,
        Command::Logout => commands::login::cmd_logout(opts),
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_env("EV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();
}
