use std::path::PathBuf;

use sev_ingest::{ExportInfo, Ingestor};

use super::{IngestArgs, interrupt_token};
use crate::settings::Settings;

/// Ingest an export and print its names and location as JSON
#[derive(Debug, clap::Args)]
pub struct Info {
    #[command(flatten)]
    pub args: IngestArgs,
}

impl Info {
    pub async fn run(self, settings: &Settings, cache: Option<PathBuf>) -> anyhow::Result<()> {
        let config = settings.ingest_config(&self.args.overrides(cache))?;
        let ingestor = Ingestor::new(config, settings.http_client()?);

        let ingested = ingestor
            .ingest_with_cancel(&self.args.archive, interrupt_token())
            .await?;
        let info = ExportInfo::from_source(&self.args.archive, ingested.path);

        println!("{}", serde_json::to_string_pretty(&info)?);
        Ok(())
    }
}
