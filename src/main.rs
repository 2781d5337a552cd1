//! newsfetch - search news headlines and articles from the command line
//!
//! Responses are cached on disk for a few minutes and requests are spaced
//! out to stay within the remote's rate limits.

use std::io::{self, Write};
use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use newsfetch::cli::{Cli, CliError};
use newsfetch::{CacheStore, Fetcher, NewsApiClient, OutputConfig, QuerySpec, RateGovernor};

/// Sets up stderr logging; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "newsfetch=debug,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Runs the cache maintenance flags, if any were given
fn run_maintenance(cli: &Cli, cache: &CacheStore) -> Result<bool, CliError> {
    if cli.clear_cache {
        let removed = cache.clear()?;
        println!("Removed {} cached responses from {}", removed, cache.dir().display());
        return Ok(true);
    }
    if cli.prune_cache {
        let removed = cache.purge_expired()?;
        println!("Removed {} expired cached responses from {}", removed, cache.dir().display());
        return Ok(true);
    }
    Ok(false)
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let cache = match &cli.cache_dir {
        Some(dir) => CacheStore::with_dir(dir),
        None => CacheStore::with_default_dir(),
    };
    debug!(cache_dir = %cache.dir().display(), "using cache directory");

    if run_maintenance(&cli, &cache)? {
        return Ok(());
    }

    let search = cli.search_params(Local::now().date_naive())?;
    let api_key = cli.resolve_api_key()?;
    let config = cli.news_config();

    let client = NewsApiClient::new(api_key, &config)?;
    let governor = RateGovernor::new(config.min_request_interval);
    let fetcher = Fetcher::new(client, cache, governor, &config);

    let query = QuerySpec::from_search(cli.endpoint(), &search);
    info!(query = %query, "fetching news");
    let results = fetcher.fetch(&query, cli.fetch_options()).await?;

    let formatter = cli.output.formatter(&OutputConfig::default(), cli.verbose);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    formatter.render(&results, &mut out)?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            if matches!(err, CliError::MissingApiKey) {
                eprintln!("You can get a free API key from: https://newsapi.org/register");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
