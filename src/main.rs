// src/main.rs
// =============================================================================
// This is the entry point of page-sweep.
//
// What happens here:
// 1. Set up logging (RUST_LOG, defaulting to page_sweep=info)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the scan or probe handler
// 4. Exit with a proper code (0 = done, 2 = fatal error)
//
// Fatal errors are configuration and startup problems: a bad template, an
// output path that cannot be created, a transport that cannot be built.
// Anything that goes wrong with an individual candidate is handled inside
// the scan and never reaches this file.
// =============================================================================

mod aggregate;
mod cli;
mod config;
mod error;
mod export;
mod probe;
mod scan;
mod session;

use aggregate::ScanReport;
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ScanArgs, TargetArgs};
use export::Exporter;
use probe::Outcome;
use scan::Scanner;
use serde::Serialize;
use session::HttpSessionFactory;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => handle_scan(args).await,
        Commands::Probe { id, target, json } => handle_probe(id, &target, json).await,
    }
}

const DEFAULT_LOG_FILTER: &str = "page_sweep=info";

fn init_logging() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}

// RUST_LOG wins when it parses; otherwise fall back to our own default
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

async fn handle_scan(args: ScanArgs) -> Result<i32> {
    let config = args.into_config().context("invalid scan configuration")?;

    // Create the output files before probing anything
    let exporter = Exporter::create(&config.output, config.format, config.failures.as_deref())
        .context("cannot open output")?;

    let factory = HttpSessionFactory::new(&config.probe)
        .context("cannot configure http sessions")?;
    let scanner = Scanner::new(config, factory)?;
    scanner
        .preflight()
        .context("cannot construct the worker pool")?;

    println!(
        "🔍 Sweeping ids {}..={} ({} candidates) with {} workers",
        scanner.config().start_id,
        scanner.config().total_ids,
        scanner.config().candidate_count(),
        scanner.config().workers
    );

    let report = scanner.run().await?;

    let output = exporter.output_path().display().to_string();
    exporter
        .write(&report)
        .with_context(|| format!("cannot write results to {output}"))?;

    print_summary(&report, &output);
    Ok(0)
}

fn print_summary(report: &ScanReport, output: &str) {
    println!();
    println!("📊 Summary:");
    println!("   🔎 Checked: {}", report.checked);
    println!("   ✅ Found: {}", report.found);
    println!("   ⚠️  Failed: {}", report.failed);
    println!("   📁 Saved to: {}", output);
}

/// JSON shape of `probe --json`.
#[derive(Debug, Serialize)]
struct ProbeReport {
    id: u64,
    url: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProbeReport {
    fn new(id: u64, url: String, outcome: Outcome) -> Self {
        let (label, title, error) = match outcome {
            Outcome::Found(result) => ("found", Some(result.title), None),
            Outcome::NotFound => ("not_found", None, None),
            Outcome::Error(err) => ("error", None, Some(err.to_string())),
        };
        Self {
            id,
            url,
            outcome: label,
            title,
            error,
        }
    }
}

async fn handle_probe(id: u64, target: &TargetArgs, json: bool) -> Result<i32> {
    let settings = target
        .probe_settings()
        .context("invalid probe configuration")?;
    let factory = HttpSessionFactory::new(&settings)
        .context("cannot configure http sessions")?;

    let outcome = probe::probe(id, &settings, &factory, None).await;
    let report = ProbeReport::new(id, settings.template.url_for(id), outcome);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match (&report.title, &report.error) {
            (Some(title), _) => println!("✅ {} {} - {}", report.id, report.url, title),
            (None, Some(error)) => println!("⚠️  {} {} - {}", report.id, report.url, error),
            (None, None) => println!("❌ {} {} - not found", report.id, report.url),
        }
    }
    Ok(0)
}
