//! Command line entry point for the band combination orchestrator
//!
//! Wires the real helper-driven device, the measurement tools and the file
//! progress store into the orchestrator, and writes the reports whether the
//! campaign completes, is interrupted, or fails.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;

use band_orchestrator::{
    config::DEFAULT_CATALOG,
    services::{report_writer, CommandDevice, CommandMetrics, ExternalCommand, FileProgressStore, ReportWriter},
    CampaignConfig, Orchestrator,
};
use shared::{logging, Band, Combination};

/// Find the best LTE band combination for a cellular router
#[derive(Parser, Debug)]
#[command(name = "band-orchestrator")]
#[command(about = "Tests band lock combinations on a cellular router and ranks them by throughput")]
pub struct Args {
    /// Router admin password
    #[arg(long, env = "ROUTER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Router web UI address
    #[arg(long, env = "ROUTER_URL", default_value = "http://192.168.8.1")]
    pub router_url: String,

    /// Report base path; `.csv` and `.json` are appended
    #[arg(long, default_value = "band_test_results")]
    pub output: PathBuf,

    /// Seconds to wait for the connection to stabilize after a band change
    #[arg(long, default_value = "30")]
    pub wait: u64,

    /// Seconds to pause before retrying a failed configuration
    #[arg(long, default_value = "5")]
    pub settle: u64,

    /// Additional configuration attempts after the first failure
    #[arg(long, default_value = "2")]
    pub retries: u32,

    /// Largest number of bands combined in one configuration
    #[arg(long, default_value = "2")]
    pub max_bands: usize,

    /// Test at most this many combinations in this run
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only use these bands (comma-separated, e.g. "1,3,B20")
    #[arg(long)]
    pub include: Option<String>,

    /// Never use these bands (comma-separated)
    #[arg(long)]
    pub exclude: Option<String>,

    /// Combinations to skip (comma-separated identities, e.g. "1+3,7")
    #[arg(long)]
    pub skip: Option<String>,

    /// Band catalog override (comma-separated)
    #[arg(long)]
    pub bands: Option<String>,

    /// Show the browser driven by the device helper
    #[arg(long)]
    pub headed: bool,

    /// Also test automatic band selection
    #[arg(long)]
    pub auto: bool,

    /// Shuffle the order within each combination size
    #[arg(long)]
    pub randomize: bool,

    /// Continue from the progress file
    #[arg(long)]
    pub resume: bool,

    /// Progress file location
    #[arg(long, default_value = "band_test_progress.json")]
    pub progress_file: PathBuf,

    /// Device helper command line (receives apply/reset/status)
    #[arg(long, env = "BAND_HELPER", default_value = "band-helper")]
    pub helper: String,

    /// Speedtest command line producing JSON
    #[arg(long, default_value = "speedtest --format=json --accept-license --accept-gdpr")]
    pub speedtest: String,

    /// Signal metrics command line producing JSON
    #[arg(long)]
    pub signal_script: Option<String>,

    /// Seconds allowed for applying a configuration
    #[arg(long, default_value = "120")]
    pub apply_timeout: u64,

    /// Seconds allowed for reading signal metrics
    #[arg(long, default_value = "30")]
    pub signal_timeout: u64,

    /// Seconds allowed for one speedtest
    #[arg(long, default_value = "180")]
    pub speedtest_timeout: u64,

    /// Number of top combinations to report
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    fn campaign_config(&self) -> anyhow::Result<CampaignConfig> {
        let catalog = match &self.bands {
            Some(list) => Band::parse_list(list).context("invalid --bands")?,
            None => DEFAULT_CATALOG.iter().copied().map(Band::new).collect(),
        };

        Ok(CampaignConfig {
            catalog,
            max_group_size: self.max_bands,
            include: parse_bands(self.include.as_deref()).context("invalid --include")?,
            exclude: parse_bands(self.exclude.as_deref()).context("invalid --exclude")?,
            skip: parse_combinations(self.skip.as_deref()).context("invalid --skip")?,
            limit: self.limit,
            include_auto: self.auto,
            randomize: self.randomize,
            resume: self.resume,
            progress_path: self.progress_file.clone(),
            output_path: self.output.clone(),
            stabilization_wait: Duration::from_secs(self.wait),
            settle_wait: Duration::from_secs(self.settle),
            retry_budget: self.retries,
            apply_timeout: Duration::from_secs(self.apply_timeout),
            signal_timeout: Duration::from_secs(self.signal_timeout),
            throughput_timeout: Duration::from_secs(self.speedtest_timeout),
            top_n: self.top,
            ..CampaignConfig::default()
        })
    }
}

fn parse_bands(list: Option<&str>) -> anyhow::Result<Vec<Band>> {
    Ok(match list {
        Some(list) => Band::parse_list(list)?,
        None => Vec::new(),
    })
}

fn parse_combinations(list: Option<&str>) -> anyhow::Result<Vec<Combination>> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Combination>().map_err(anyhow::Error::from))
            .collect()
    })
    .unwrap_or_else(|| Ok(Vec::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a local .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let config = args.campaign_config()?;
    logging::log_startup(&format!(
        "catalog {:?}, max {} bands, retries {}, resume {}",
        config.effective_catalog().iter().map(Band::number).collect::<Vec<_>>(),
        config.max_group_size,
        config.retry_budget,
        config.resume
    ));

    let device = CommandDevice::new(ExternalCommand::parse(&args.helper)?)
        .with_router_url(args.router_url.clone())
        .with_password(args.password.clone())
        .with_headed(args.headed);
    let signal_script = args.signal_script.as_deref().map(ExternalCommand::parse).transpose()?;
    let metrics = CommandMetrics::new(ExternalCommand::parse(&args.speedtest)?).with_signal_script(signal_script);
    let store = FileProgressStore::new(config.progress_path.clone());

    let mut orchestrator = Orchestrator::new(config.clone(), device, metrics, store);

    // Set up graceful shutdown
    let shutdown_sender = orchestrator.get_shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown("Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                logging::log_error("Signal handling", &err);
            }
        }
    });

    let outcome = orchestrator.run().await;

    // Partial results are reported too
    let report = match &outcome {
        Ok(report) => report.clone(),
        Err(_) => orchestrator.report(),
    };
    let writer = ReportWriter::new(&config.output_path);
    if let Err(e) = writer.write(&report, &config) {
        logging::log_error("Report writing", &e);
    }
    report_writer::log_summary(&report, config.top_n);

    outcome?;
    if report.interrupted {
        logging::log_shutdown("Campaign interrupted; rerun with --resume to continue");
    } else {
        logging::log_success("Campaign finished");
    }
    Ok(())
}
