use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use btc_dashboard::config::Config;
use btc_dashboard::dashboard;
use btc_dashboard::logging;
use btc_dashboard::metrics;
use btc_dashboard::pipeline::{self, processing};
use btc_dashboard::server::{self, AppState};
use btc_dashboard::RangeFilter;

#[derive(Parser)]
#[command(name = "btc_dashboard")]
#[command(about = "Bitcoin address balance dashboard backed by a Coin Metrics CSV export")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard page and the balances endpoint
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// CSV export to serve
        #[arg(long)]
        data: Option<PathBuf>,
        /// Prometheus exporter address, e.g. 127.0.0.1:9898
        #[arg(long)]
        metrics_addr: Option<String>,
    },
    /// Print the normalized records as JSON
    Export {
        /// CSV export to read
        #[arg(long)]
        data: Option<PathBuf>,
        /// One of All, YTD, 12M, 3M, 1M
        #[arg(long, default_value = "All")]
        range: RangeFilter,
        #[arg(long)]
        pretty: bool,
        /// Print the latest value of each series instead of JSON
        #[arg(long)]
        summary: bool,
        /// Accept exports with missing source columns
        #[arg(long)]
        lenient: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve {
            host,
            port,
            data,
            metrics_addr,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data) = data {
                config.data.path = data;
            }
            if metrics_addr.is_some() {
                config.metrics.addr = metrics_addr;
            }

            if let Some(addr) = config.metrics_addr()? {
                metrics::init_metrics(addr);
            }

            let addr = config.socket_addr()?;
            server::start_server(AppState::new(config.data), addr).await?;
        }
        Commands::Export {
            data,
            range,
            pretty,
            summary,
            lenient,
        } => {
            if let Some(data) = data {
                config.data.path = data;
            }
            let strict = config.data.strict_for(lenient);

            let records = pipeline::load_records(&config.data.path, strict)
                .with_context(|| format!("loading {}", config.data.path.display()))?;
            let filtered = processing::apply_range_filter(&records, range);
            info!(range = %range, total = records.len(), selected = filtered.len(), "export");

            if summary {
                print!("{}", dashboard::format_summary(&filtered, range));
            } else if pretty {
                println!("{}", serde_json::to_string_pretty(&filtered)?);
            } else {
                println!("{}", serde_json::to_string(&filtered)?);
            }
        }
    }

    Ok(())
}
