use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use sev_fetch::{ClientSettings, ReqwestClient};
use sev_ingest::{DownloadPolicy, IngestConfig, TextCodecs};

/// Contents of the optional TOML settings file. Every key is optional and
/// command-line flags take precedence.
///
/// ```toml
/// cache_dir = "/var/cache/sev"
/// jobs = 8
/// timeout_secs = 120
/// read_encoding = "ibm866"
/// proxies = ["http://proxy.internal:3128"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub cache_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub fail_fast: Option<bool>,
    pub read_encoding: Option<String>,
    pub write_encoding: Option<String>,
    pub proxies: Vec<String>,
    pub user_agent: Option<String>,
}

/// Values given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub cache_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub fail_fast: bool,
    pub legacy_encoding: bool,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid settings file '{}'", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment defaults, then this file, then `overrides`.
    pub fn ingest_config(&self, overrides: &Overrides) -> anyhow::Result<IngestConfig> {
        let mut config = IngestConfig::from_env();

        if let Some(dir) = overrides.cache_dir.as_ref().or(self.cache_dir.as_ref()) {
            config = config.cache_root(dir);
        }
        if let Some(jobs) = overrides.jobs.or(self.jobs) {
            config = config.max_concurrent_downloads(jobs);
        }
        if let Some(secs) = overrides.timeout_secs.or(self.timeout_secs) {
            let timeout = (secs > 0).then(|| Duration::from_secs(secs));
            config = config.timeout(timeout);
        }
        if let Some(retries) = self.max_retries {
            config.fetch = config.fetch.max_retries(retries);
        }
        if overrides.fail_fast || self.fail_fast.unwrap_or(false) {
            config = config.download_policy(DownloadPolicy::FailFast);
        }

        config = config.codecs(self.codecs(overrides.legacy_encoding)?);
        Ok(config)
    }

    pub fn cache_root(&self, overrides: &Overrides) -> PathBuf {
        overrides
            .cache_dir
            .clone()
            .or_else(|| self.cache_dir.clone())
            .unwrap_or_else(sev_ingest::default_cache_root)
    }

    pub fn http_client(&self) -> anyhow::Result<ReqwestClient> {
        let proxies = self
            .proxies
            .iter()
            .map(|p| reqwest::Url::parse(p).with_context(|| format!("invalid proxy URL '{p}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let settings = ClientSettings {
            proxies,
            connect_timeout: Some(Duration::from_secs(30)),
            user_agent: Some(
                self.user_agent
                    .clone()
                    .unwrap_or_else(|| format!("sev/{}", env!("CARGO_PKG_VERSION"))),
            ),
        };
        Ok(settings.build()?)
    }

    fn codecs(&self, legacy: bool) -> anyhow::Result<TextCodecs> {
        if legacy {
            return Ok(TextCodecs::legacy());
        }
        let defaults = TextCodecs::default();
        let read = self.read_encoding.as_deref().unwrap_or(defaults.read.name());
        let write = self.write_encoding.as_deref().unwrap_or(defaults.write.name());
        match TextCodecs::from_labels(read, write) {
            Some(codecs) => Ok(codecs),
            None => bail!("unknown text encoding in '{read}' / '{write}'"),
        }
    }
}
