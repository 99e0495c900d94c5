use std::path::PathBuf;

use sev_ingest::{IngestReport, Ingestor};

use super::{IngestArgs, interrupt_token};
use crate::settings::Settings;

/// Extract an export into the cache and mirror its attachments
#[derive(Debug, clap::Args)]
pub struct Ingest {
    #[command(flatten)]
    pub args: IngestArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Ingest {
    pub async fn run(self, settings: &Settings, cache: Option<PathBuf>) -> anyhow::Result<()> {
        let config = settings.ingest_config(&self.args.overrides(cache))?;
        let ingestor = Ingestor::new(config, settings.http_client()?);

        let ingested = ingestor
            .ingest_with_cancel(&self.args.archive, interrupt_token())
            .await?;

        if self.json {
            let output = serde_json::json!({
                "path": ingested.path,
                "report": ingested.report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", ingested.path.display());
            print_summary(&ingested.report);
        }
        Ok(())
    }
}

fn print_summary(report: &IngestReport) {
    if report.cache_hit {
        eprintln!("already cached");
        return;
    }
    eprintln!(
        "{} entries extracted, {} attachments downloaded, {} reused, {} skipped, {} files rewritten",
        report.extracted_entries,
        report.downloaded,
        report.reused,
        report.skipped_attachments,
        report.rewritten_files,
    );
    for failure in &report.download_failures {
        eprintln!("  failed: {} ({})", failure.url, failure.reason);
    }
    for skipped in &report.skipped_files {
        eprintln!("  skipped: {} ({})", skipped.path.display(), skipped.reason);
    }
}
