//! feedcheck: binary entrypoint
//! Loads the feed catalog, probes every feed under a concurrency cap, and
//! prints the failures. Exit status: 0 all reachable, 1 some failed,
//! 2 the catalog or configuration could not be used.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_liveness::catalog;
use feed_liveness::report::{self, ReportFormat};
use feed_liveness::{CheckerConfig, HttpTransport, LivenessChecker};

#[derive(Parser)]
#[command(name = "feedcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check that every feed in a curated catalog is reachable", long_about = None)]
struct Cli {
    /// Directory with the catalog `*.json` documents
    #[arg(long)]
    catalog_dir: Option<PathBuf>,

    /// Maximum number of probes in flight
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Per-probe timeout in seconds
    #[arg(short, long)]
    timeout_secs: Option<u64>,

    /// User-Agent sent with every probe
    #[arg(long)]
    user_agent: Option<String>,

    /// Only check the collection with this topic
    #[arg(long, env = "FEEDCHECK_TOPIC")]
    topic: Option<String>,

    /// Print the catalog topics and exit
    #[arg(long)]
    list_topics: bool,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => ReportFormat::Text,
            Format::Json => ReportFormat::Json,
        }
    }
}

impl Cli {
    fn apply(&self, cfg: &mut CheckerConfig) {
        if let Some(dir) = &self.catalog_dir {
            cfg.catalog_dir = dir.clone();
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.timeout_secs = secs;
        }
        if let Some(ua) = &self.user_agent {
            cfg.user_agent = ua.clone();
        }
        cfg.sanitize();
    }
}

/// Logs go to stderr so the report on stdout stays machine-readable.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_liveness=info,feedcheck=info,probe=info,warn"));

    let json = json
        || std::env::var("FEEDCHECK_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

/// Resolves on the first Ctrl+C; never resolves if the signal can't be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Ctrl+C handler unavailable, run cannot be interrupted");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, cancelling outstanding probes...");
}

async fn run(cli: Cli) -> Result<u8> {
    let mut cfg = CheckerConfig::load_default()?;
    cli.apply(&mut cfg);

    if cli.list_topics {
        for topic in catalog::topics(&cfg.catalog_dir)? {
            println!("{topic}");
        }
        return Ok(0);
    }

    let items = match &cli.topic {
        Some(topic) => catalog::load_topic(&cfg.catalog_dir, topic)?,
        None => {
            let load = catalog::load_dir(&cfg.catalog_dir)?;
            if !load.failures.is_empty() {
                warn!(
                    skipped = load.failures.len(),
                    loaded = load.documents,
                    "some catalog documents were skipped"
                );
            }
            load.items
        }
    };

    let transport = Arc::new(HttpTransport::new(&cfg.user_agent, cfg.timeout())?);
    let checker = LivenessChecker::new(transport)
        .with_concurrency(cfg.concurrency)
        .with_timeout(cfg.timeout());

    let run = checker.run_until(items, interrupted()).await;

    print!("{}", report::render(&run, cli.format.into())?);
    Ok(report::exit_code(&run))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env when present; no-op otherwise.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
