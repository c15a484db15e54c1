use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use forager_client::{DetailExtractor, ProxyPoolSource, ReqwestFetcher, build_search_url, parse_results};
use forager_core::AppError;
use forager_core::models::SearchInput;
use forager_core::schema::{load_schema, validate_instance};
use forager_core::{
    FanOutCoordinator, FetchOutcome, ProxyEndpoint, ProxyRecord, ResilientFetcher, RetryConfig,
};

#[derive(Parser)]
#[command(name = "forager", version, about = "Proxy-rotating GitHub search crawler")]
struct Cli {
    /// Path to the JSON search request file
    #[arg(short, long, default_value = "inputfile.json")]
    input: PathBuf,

    /// Pin every request to one proxy (`scheme://ip:port`), skipping discovery
    #[arg(short, long, env = "FORAGER_PROXY")]
    proxy: Option<String>,

    /// Output filename stem (defaults to the keywords joined by `_`)
    #[arg(short, long)]
    filename: Option<String>,

    /// JSON Schema the input file must satisfy
    #[arg(long, default_value = "schema_input.json")]
    input_schema: PathBuf,

    /// JSON Schema the output records must satisfy
    #[arg(long, default_value = "schema_output.json")]
    output_schema: PathBuf,

    /// Attempts before the search fetch gives up
    #[arg(long, default_value_t = 15)]
    max_attempts: u32,

    /// Concurrent detail extractions
    #[arg(long, default_value_t = 5)]
    concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("forager_core=info".parse()?)
                .add_directive("forager_client=info".parse()?)
                .add_directive("forager_cli=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let override_proxy = cli
        .proxy
        .as_deref()
        .map(ProxyEndpoint::parse)
        .transpose()
        .context("Invalid --proxy value")?;

    let input = load_input(&cli.input, &cli.input_schema)?;
    let target = build_search_url(&input.keywords, &input.kind);
    tracing::info!(%target, "Starting search");

    let fetcher = ReqwestFetcher::with_timeout(Duration::from_secs(cli.timeout))
        .context("Failed to create HTTP client")?;

    // With a pinned proxy there is nothing to discover.
    let pool = match &override_proxy {
        Some(pinned) => {
            tracing::info!(proxy = %pinned, "Using pinned proxy");
            Vec::new()
        }
        None => {
            let mut pool = ProxyPoolSource::new(fetcher.clone()).fetch_pool().await?;
            pool.extend(input.proxies.iter().cloned().map(ProxyRecord::from_address));
            if pool.is_empty() {
                return Err(AppError::ProxyPool(
                    "listing parsed to zero rows and the input file supplied no proxies".into(),
                )
                .into());
            }
            pool
        }
    };

    let mut resilient = ResilientFetcher::new(fetcher.clone()).with_config(RetryConfig {
        max_attempts: cli.max_attempts,
        ..RetryConfig::default()
    });

    let outcome = resilient
        .fetch_with_retries(&target, &pool, override_proxy.as_ref())
        .await?;

    let (body, winning_proxy) = match outcome {
        FetchOutcome::Success { body, proxy } => (body, proxy),
        FetchOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            tracing::error!(attempts, error = %last_error, "All fetch attempts failed");
            std::process::exit(1);
        }
    };

    let results = parse_results(&body)?;
    tracing::info!(count = results.len(), "Search results parsed");

    let coordinator = FanOutCoordinator::new(DetailExtractor::new(fetcher))
        .with_concurrency(cli.concurrency);
    let report = coordinator.enrich_all(&results, &winning_proxy).await;

    for failure in &report.failures {
        tracing::warn!(url = %failure.url, error = %failure.error, "Dropped repository");
    }

    let output = serde_json::to_value(&report.records)?;
    let output_schema = load_schema(&cli.output_schema)?;
    validate_instance(&output, &output_schema).context("Output failed schema validation")?;

    let stem = cli
        .filename
        .unwrap_or_else(|| input.default_output_name());
    let path = format!("{stem}.json");
    std::fs::write(&path, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("Failed to write {path}"))?;

    tracing::info!(
        records = report.records.len(),
        recovered = report.recovered,
        dropped = report.failures.len(),
        %path,
        "Run complete"
    );
    Ok(())
}

/// Read and schema-check the search request.
fn load_input(path: &Path, schema_path: &Path) -> Result<SearchInput> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Invalid JSON in input file")?;

    let schema = load_schema(schema_path)?;
    validate_instance(&value, &schema).context("Input failed schema validation")?;

    Ok(serde_json::from_value(value)?)
}
