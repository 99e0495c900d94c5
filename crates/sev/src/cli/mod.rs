use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::settings::{Overrides, Settings};

mod clean;
mod info;
mod ingest;

pub use clean::Clean;
pub use info::Info;
pub use ingest::Ingest;

#[derive(Debug, Parser)]
#[command(name = "sev", version, about = "Ingest chat export bundles into a local cache")]
pub struct Cli {
    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML settings file
    #[arg(long, global = true, env = "SEV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root (default: $SLACKVIEWER_TEMP_PATH or the user cache directory)
    #[arg(short = 'c', long = "cache", global = true)]
    pub cache: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Ingest(Ingest),
    Info(Info),
    Clean(Clean),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = Settings::load(self.config.as_deref())?;
        match self.command {
            Command::Ingest(cmd) => cmd.run(&settings, self.cache).await,
            Command::Info(cmd) => cmd.run(&settings, self.cache).await,
            Command::Clean(cmd) => cmd.run(&settings, self.cache),
        }
    }
}

/// Options shared by the commands that ingest an archive.
#[derive(Debug, clap::Args)]
pub struct IngestArgs {
    /// Zip export or extracted export directory
    #[arg(env = "SEV_ARCHIVE")]
    pub archive: PathBuf,

    /// Concurrent attachment downloads
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-download timeout in seconds, 0 for none
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Abort on the first failed attachment download
    #[arg(long)]
    pub fail_fast: bool,

    /// Read structured data as IBM866, as older exports were
    #[arg(long)]
    pub legacy_encoding: bool,
}

impl IngestArgs {
    pub fn overrides(&self, cache: Option<PathBuf>) -> Overrides {
        Overrides {
            cache_dir: cache,
            jobs: self.jobs,
            timeout_secs: self.timeout,
            fail_fast: self.fail_fast,
            legacy_encoding: self.legacy_encoding,
        }
    }
}

/// Token cancelled on Ctrl-C.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, discarding partial work");
            trigger.cancel();
        }
    });
    token
}
