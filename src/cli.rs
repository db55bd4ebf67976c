// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - scan:  sweep the whole id space and write the discovered pages to disk
// - probe: check a single id and print what the sweep would make of it
//
// Every default here matches the production sweep, so `page-sweep scan`
// with no flags runs the full 1..1,000,000 pass.
// =============================================================================

use crate::config::{
    OutputFormat, ProbeSettings, ScanConfig, SessionMode, DEFAULT_BATCH_SIZE,
    DEFAULT_EXCLUSION_MARKER, DEFAULT_MAX_RETRIES, DEFAULT_PROGRESS_EVERY, DEFAULT_TEMPLATE, DEFAULT_TIMEOUT_SECS,
    DEFAULT_TOTAL_IDS, DEFAULT_WORKERS,
};
use crate::error::ConfigError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "page-sweep",
    version = "0.1.0",
    about = "Sweep a numeric id space behind a URL template and record the live pages",
    long_about = "page-sweep substitutes every id in a range into a URL template, fetches each \
                  candidate, and keeps the ones that answer 200 with a real <title>. \
                  The result is a csv (or json) of id, title and url for later filtering."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe every id in the range and write the pages that were found
    ///
    /// Example: page-sweep scan --total-ids 5000 --output found.csv
    Scan(ScanArgs),

    /// Probe a single id and print the outcome
    ///
    /// Example: page-sweep probe 123456 --json
    Probe {
        /// The candidate id
        id: u64,

        #[command(flatten)]
        target: TargetArgs,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Flags shared by both subcommands: what to fetch and how to judge it.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Candidate URL with an {id} placeholder
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    pub template: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Pages whose title contains this marker are treated as test pages
    #[arg(long, default_value = DEFAULT_EXCLUSION_MARKER)]
    pub exclude: String,

    /// Retries per request on 5xx responses and transient network errors
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
}

impl TargetArgs {
    pub fn probe_settings(&self) -> Result<ProbeSettings, ConfigError> {
        Ok(
            ProbeSettings::new(&self.template, self.timeout_secs, self.exclude.clone())?
                .with_max_retries(self.max_retries),
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Last id to probe (the id space is start-id..=total-ids)
    #[arg(long, default_value_t = DEFAULT_TOTAL_IDS)]
    pub total_ids: u64,

    /// First id to probe
    #[arg(long, default_value_t = 1)]
    pub start_id: u64,

    /// Number of probes running at the same time
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Ids submitted per batch; a batch fully drains before the next starts
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u64,

    /// Where the discovered pages are written
    #[arg(long, short, default_value = "discovered.csv")]
    pub output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Also write the ids whose probe failed at the transport level
    #[arg(long)]
    pub failures: Option<PathBuf>,

    /// Let each worker keep one HTTP session instead of one per probe
    #[arg(long)]
    pub reuse_sessions: bool,

    /// Log a progress line every N checked ids
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    pub progress_every: u64,
}

impl ScanArgs {
    /// Turns the flags into a validated configuration.
    pub fn into_config(self) -> Result<ScanConfig, ConfigError> {
        let config = ScanConfig {
            probe: self.target.probe_settings()?,
            start_id: self.start_id,
            total_ids: self.total_ids,
            workers: self.workers,
            batch_size: self.batch_size,
            session_mode: if self.reuse_sessions {
                SessionMode::PerWorker
            } else {
                SessionMode::PerProbe
            },
            progress_every: self.progress_every,
            output: self.output,
            format: self.format,
            failures: self.failures,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults() {
        let cli = Cli::parse_from(["page-sweep", "scan"]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };

        assert_eq!(args.total_ids, 1_000_000);
        assert_eq!(args.start_id, 1);
        assert_eq!(args.workers, 50);
        assert_eq!(args.batch_size, 20_000);
        assert_eq!(args.target.timeout_secs, 5);
        assert_eq!(args.target.exclude, "测试");
        assert_eq!(args.target.max_retries, 2);
        assert_eq!(args.format, OutputFormat::Csv);
        assert!(args.failures.is_none());
        assert!(!args.reuse_sessions);

        let config = args.into_config().unwrap();
        assert_eq!(config.session_mode, SessionMode::PerProbe);
        assert_eq!(config.output, PathBuf::from("discovered.csv"));
        assert_eq!(
            config.probe.template.url_for(9),
            "https://search.gd.gov.cn/search/file/9"
        );
    }

    #[test]
    fn test_scan_flags() {
        let cli = Cli::parse_from([
            "page-sweep",
            "scan",
            "--total-ids",
            "3000",
            "--workers",
            "8",
            "--reuse-sessions",
            "--format",
            "json",
            "-o",
            "found.json",
            "--failures",
            "failed.csv",
        ]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.total_ids, 3000);
        assert_eq!(config.workers, 8);
        assert_eq!(config.session_mode, SessionMode::PerWorker);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.failures, Some(PathBuf::from("failed.csv")));
    }

    #[test]
    fn test_probe_flags() {
        let cli = Cli::parse_from([
            "page-sweep",
            "probe",
            "42",
            "--template",
            "http://localhost:8000/p/{id}",
            "--max-retries",
            "0",
            "--json",
        ]);
        let Commands::Probe { id, target, json } = cli.command else {
            panic!("expected probe");
        };
        assert_eq!(id, 42);
        assert!(json);
        let settings = target.probe_settings().unwrap();
        assert_eq!(settings.template.url_for(id), "http://localhost:8000/p/42");
        assert_eq!(settings.max_retries, 0);
    }

    #[test]
    fn test_invalid_scan_flags_rejected() {
        let cli = Cli::parse_from(["page-sweep", "scan", "--workers", "0"]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(matches!(args.into_config(), Err(ConfigError::Zero("workers"))));

        let cli = Cli::parse_from(["page-sweep", "scan", "--template", "https://x.test/"]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(matches!(args.into_config(), Err(ConfigError::Placeholder(_))));

        let cli = Cli::parse_from(["page-sweep", "scan", "--exclude", ""]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(matches!(args.into_config(), Err(ConfigError::EmptyMarker)));
    }
}
