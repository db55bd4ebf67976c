// src/config.rs
// =============================================================================
// Immutable run configuration.
//
// The CLI is parsed once in main.rs, validated here, and the resulting values
// are passed into the scheduler. Nothing in the crate reads global state.
//
// - UrlTemplate: the candidate URL pattern with an {id} placeholder
// - ProbeSettings: what every probe needs (template, timeout, exclusion marker)
// - ScanConfig: the whole run (id space, pool size, batch size, outputs)
// =============================================================================

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

pub const DEFAULT_TEMPLATE: &str = "https://search.gd.gov.cn/search/file/{id}";
pub const DEFAULT_EXCLUSION_MARKER: &str = "测试";
pub const DEFAULT_TOTAL_IDS: u64 = 1_000_000;
pub const DEFAULT_WORKERS: usize = 50;
pub const DEFAULT_BATCH_SIZE: u64 = 20_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_PROGRESS_EVERY: u64 = 1_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

const PLACEHOLDER: &str = "{id}";

/// A candidate URL pattern such as `https://host/search/file/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    prefix: String,
    suffix: String,
    referer: String,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        if template.matches(PLACEHOLDER).count() != 1 {
            return Err(ConfigError::Placeholder(template.to_string()));
        }

        let (prefix, suffix) = template
            .split_once(PLACEHOLDER)
            .ok_or_else(|| ConfigError::Placeholder(template.to_string()))?;

        // Check the shape with a concrete id substituted in
        let sample = format!("{prefix}1{suffix}");
        let parsed =
            Url::parse(&sample).map_err(|_| ConfigError::InvalidUrl(template.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(template.to_string()));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            referer: format!("{}/", parsed.origin().ascii_serialization()),
        })
    }

    pub fn url_for(&self, id: u64) -> String {
        format!("{}{}{}", self.prefix, id, self.suffix)
    }

    /// Origin of the template plus a trailing slash, sent as the Referer header.
    pub fn referer(&self) -> &str {
        &self.referer
    }
}

/// Everything a single probe needs. Shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub template: UrlTemplate,
    pub timeout: Duration,
    pub exclusion_marker: String,
    /// Extra attempts per request on transient failures
    pub max_retries: u32,
}

impl ProbeSettings {
    pub fn new(
        template: &str,
        timeout_secs: u64,
        exclusion_marker: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        if timeout_secs == 0 {
            return Err(ConfigError::Zero("timeout"));
        }
        let exclusion_marker = exclusion_marker.into();
        if exclusion_marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        Ok(Self {
            template: UrlTemplate::parse(template)?,
            timeout: Duration::from_secs(timeout_secs),
            exclusion_marker,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Every probe opens and drops its own session.
    #[default]
    PerProbe,
    /// Each worker opens one session and reuses it for all of its probes.
    PerWorker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Complete configuration of one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub probe: ProbeSettings,
    pub start_id: u64,
    pub total_ids: u64,
    pub workers: usize,
    pub batch_size: u64,
    pub session_mode: SessionMode,
    pub progress_every: u64,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub failures: Option<PathBuf>,
}

impl ScanConfig {
    /// Checks the numeric limits. Called before anything touches the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Zero("batch size"));
        }
        if self.progress_every == 0 {
            return Err(ConfigError::Zero("progress interval"));
        }
        if self.start_id == 0 {
            return Err(ConfigError::Zero("start id"));
        }
        if self.start_id > self.total_ids {
            return Err(ConfigError::StartPastEnd {
                start: self.start_id,
                total: self.total_ids,
            });
        }
        // The worker pool channels are sized to one batch
        let batch = self.effective_batch();
        if usize::try_from(batch).map_or(true, |b| b > Semaphore::MAX_PERMITS) {
            return Err(ConfigError::BatchTooLarge {
                batch,
                max: Semaphore::MAX_PERMITS as u64,
            });
        }
        Ok(())
    }

    /// Size of the largest batch this run submits: the batch size, or the
    /// whole id space when that is smaller.
    pub fn effective_batch(&self) -> u64 {
        self.batch_size.min(self.candidate_count())
    }

    /// Number of candidates this run will probe.
    pub fn candidate_count(&self) -> u64 {
        self.total_ids.saturating_sub(self.start_id) + 1
    }

    /// A small config for tests; callers override the fields they care about.
    #[cfg(test)]
    pub fn for_tests(total_ids: u64, batch_size: u64, workers: usize) -> Self {
        Self {
            probe: ProbeSettings::new("https://pages.test/search/file/{id}", 5, "测试")
                .expect("test template is valid"),
            start_id: 1,
            total_ids,
            workers,
            batch_size,
            session_mode: SessionMode::PerProbe,
            progress_every: DEFAULT_PROGRESS_EVERY,
            output: PathBuf::from("discovered.csv"),
            format: OutputFormat::Csv,
            failures: None,
        }
    }
}
