// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use zonekeeper::{
    api::http::HttpDnsApi,
    apply::{self, ApplyOptions, ApplyReport},
    config::{self, ClientConfig},
    constants::{
        ENV_API_TOKEN, ENV_API_URL, ENV_POLL_INTERVAL_SECS, ENV_POLL_TIMEOUT_SECS,
        MAX_CONCURRENT_RECORD_OPERATIONS,
    },
    manifest::Manifest,
    metrics,
    records::import_record,
    state::StateFile,
    zones::lookup_zone,
};

/// Declarative zone and record-set reconciler for the Edge DNS API.
#[derive(Debug, Parser)]
#[command(name = "zonekeeper", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// API base URL
    #[arg(long, global = true, env = ENV_API_URL)]
    api_url: Option<String>,

    /// API bearer token
    #[arg(long, global = true, env = ENV_API_TOKEN, hide_env_values = true)]
    api_token: Option<String>,

    /// Upper bound on one polled operation, in seconds
    #[arg(long, global = true, env = ENV_POLL_TIMEOUT_SECS)]
    poll_timeout_secs: Option<u64>,

    /// Sleep between two poll attempts, in seconds
    #[arg(long, global = true, env = ENV_POLL_INTERVAL_SECS)]
    poll_interval_secs: Option<u64>,

    /// Per-request HTTP timeout, in seconds
    #[arg(long, global = true)]
    request_timeout_secs: Option<u64>,

    /// Print Prometheus metrics to stdout when done
    #[arg(long, global = true)]
    print_metrics: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create, update and delete resources until the API matches the manifest
    Apply {
        /// Desired-state manifest (YAML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// State file (JSON), created if missing
        #[arg(short, long, default_value = "zonekeeper.state.json")]
        state: PathBuf,

        /// Delete removed zones even when they still hold record sets
        #[arg(long)]
        force_zone_delete: bool,

        /// Maximum record sets reconciled at once
        #[arg(long, default_value_t = MAX_CONCURRENT_RECORD_OPERATIONS)]
        concurrency: usize,
    },

    /// Delete every resource tracked in the state file
    Destroy {
        /// State file (JSON)
        #[arg(short, long, default_value = "zonekeeper.state.json")]
        state: PathBuf,

        /// Delete zones even when they still hold record sets
        #[arg(long)]
        force_zone_delete: bool,
    },

    /// Re-read every tracked resource and drop the ones that no longer exist
    Refresh {
        /// State file (JSON)
        #[arg(short, long, default_value = "zonekeeper.state.json")]
        state: PathBuf,
    },

    /// Print an existing record set as state, optionally adding it to a state file
    ImportRecord {
        /// Record identifier, ZONE|NAME|TYPE
        id: String,

        /// State file to add the record set to
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Address to store the record set under; defaults to the identifier
        #[arg(long, requires = "state")]
        key: Option<String>,
    },

    /// Print an existing zone
    ShowZone {
        /// Zone name
        zone: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("zonekeeper")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
    }
}

fn build_api(global: &GlobalArgs) -> Result<HttpDnsApi> {
    let Some(api_url) = global.api_url.as_deref() else {
        bail!("--api-url or ZONEKEEPER_API_URL is required");
    };
    let mut client_config = ClientConfig::new(api_url, global.api_token.clone())?;
    if let Some(secs) = global.request_timeout_secs {
        client_config = client_config.with_request_timeout(Duration::from_secs(secs));
    }
    debug!(api_url = %client_config.api_url, "Using DNS API");
    HttpDnsApi::new(&client_config)
}

fn finish(report: &ApplyReport, what: &str) -> Result<()> {
    for failure in &report.failures {
        warn!(
            kind = failure.kind,
            address = %failure.address,
            reason = failure.error.status_reason(),
            "{}",
            failure.error
        );
    }
    if report.is_success() {
        info!(resources = report.actions.len(), "{what} complete");
        Ok(())
    } else {
        bail!("{what} finished with {} failed resources", report.failures.len())
    }
}

async fn async_main(cli: Cli) -> Result<()> {
    initialize_logging();

    let global = &cli.global;
    let poll = config::poll_config(global.poll_timeout_secs, global.poll_interval_secs)?;
    let api = build_api(global)?;

    let result = match cli.command {
        Command::Apply {
            manifest,
            state,
            force_zone_delete,
            concurrency,
        } => {
            let desired = Manifest::load(&manifest).await?;
            let mut current = StateFile::load(&state).await?;
            let options = ApplyOptions {
                poll,
                force_zone_delete,
                concurrency,
            };
            info!(
                zones = desired.zones.len(),
                records = desired.records.len(),
                "Applying manifest"
            );
            let report = apply::apply(&api, &desired, &mut current, &options).await;
            current.save(&state).await?;
            finish(&report, "Apply")
        }

        Command::Destroy {
            state,
            force_zone_delete,
        } => {
            let mut current = StateFile::load(&state).await?;
            let options = ApplyOptions {
                poll,
                force_zone_delete,
                ..ApplyOptions::default()
            };
            let report = apply::destroy(&api, &mut current, &options).await;
            current.save(&state).await?;
            finish(&report, "Destroy")
        }

        Command::Refresh { state } => {
            let mut current = StateFile::load(&state).await?;
            let report = apply::refresh(&api, &mut current).await;
            current.save(&state).await?;
            finish(&report, "Refresh")
        }

        Command::ImportRecord { id, state, key } => {
            let record = import_record(&api, &id)
                .await
                .with_context(|| format!("failed to import record set '{id}'"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);

            if let Some(path) = state {
                let mut current = StateFile::load(&path).await?;
                let address = key.unwrap_or_else(|| record.id.clone());
                if current.records.contains_key(&address) {
                    bail!("address '{address}' is already tracked in {}", path.display());
                }
                current.records.insert(address, record);
                current.save(&path).await?;
            }
            Ok(())
        }

        Command::ShowZone { zone } => {
            let found = lookup_zone(&api, &zone)
                .await
                .with_context(|| format!("failed to look up zone '{zone}'"))?;
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(())
        }
    };

    if global.print_metrics {
        print!("{}", metrics::gather_metrics()?);
    }
    result
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
