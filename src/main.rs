//! request-guard CLI.
//!
//! Runs guarded fetches or a backoff poller against a URL, using the same
//! breaker, cache and kill switch an embedding application would.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use request_guard::config::watcher::ConfigWatcher;
use request_guard::config::{load_config, BackoffPolicy, GuardConfig};
use request_guard::lifecycle::{signals, Shutdown};
use request_guard::observability::logging;
use request_guard::{FetchConfig, FetchOptions, GuardedResponse, RequestGuard, SmartPoller};

#[derive(Parser)]
#[command(name = "request-guard")]
#[command(about = "Guarded HTTP fetch and polling", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for changes while polling
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer token sent with every request
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL through the guard
    Fetch {
        url: String,

        /// Serve repeated GETs from the response cache
        #[arg(long)]
        cache: bool,

        /// Cache TTL in milliseconds (implies --cache)
        #[arg(long)]
        cache_ttl_ms: Option<u64>,

        /// Number of times to issue the request
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        /// Per-request deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Poll a URL with exponential backoff until Ctrl-C
    Poll {
        url: String,

        /// Base interval in milliseconds (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,

        /// Use base * 2^failures instead of compounding backoff
        #[arg(long)]
        standard_backoff: bool,

        #[arg(long)]
        cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        failure_threshold = config.breaker.failure_threshold,
        reset_timeout_ms = config.breaker.reset_timeout_ms,
        cache_ttl_ms = config.cache.default_ttl_ms,
        "Configuration loaded"
    );

    let guard = Arc::new(RequestGuard::new(&config));
    let options = match &cli.token {
        Some(token) => FetchOptions::new().bearer_token(token),
        None => FetchOptions::new(),
    };

    match cli.command {
        Commands::Fetch {
            url,
            cache,
            cache_ttl_ms,
            repeat,
            timeout_ms,
        } => {
            let mut fetch_config = FetchConfig {
                cache,
                ..FetchConfig::default()
            };
            if let Some(ttl) = cache_ttl_ms {
                fetch_config = fetch_config.cache_ttl(Duration::from_millis(ttl));
            }
            if let Some(timeout) = timeout_ms {
                fetch_config = fetch_config.timeout(Duration::from_millis(timeout));
            }
            run_fetch(&guard, &url, &options, &fetch_config, repeat).await?;
        }
        Commands::Poll {
            url,
            interval_ms,
            standard_backoff,
            cache,
        } => {
            let mut poller_config = config.poller.clone();
            if let Some(ms) = interval_ms {
                poller_config.base_interval_ms = ms;
                poller_config.max_interval_ms = poller_config.max_interval_ms.max(ms);
            }
            if standard_backoff {
                poller_config.backoff_policy = BackoffPolicy::Standard;
            }
            let fetch_config = FetchConfig {
                cache,
                ..FetchConfig::default()
            };
            run_poll(guard, cli.config, url, options, fetch_config, poller_config).await?;
        }
    }

    Ok(())
}

async fn run_fetch(
    guard: &RequestGuard,
    url: &str,
    options: &FetchOptions,
    fetch_config: &FetchConfig,
    repeat: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    for attempt in 1..=repeat {
        match guard.fetch(url, options, fetch_config).await {
            Ok(Some(response)) => print_response(attempt, &response)?,
            Ok(None) => println!("#{}: not attempted (kill switch or open circuit)", attempt),
            Err(e) => eprintln!("#{}: request failed: {}", attempt, e),
        }
    }
    Ok(())
}

async fn run_poll(
    guard: Arc<RequestGuard>,
    config_path: Option<PathBuf>,
    url: String,
    options: FetchOptions,
    fetch_config: FetchConfig,
    poller_config: request_guard::config::PollerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let sweeper = guard.spawn_cache_sweeper(shutdown.subscribe());

    // The watcher stops when dropped, so keep it for the whole run.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(&path);
            let watcher = watcher.run()?;
            let guard = guard.clone();
            tokio::spawn(async move {
                while let Some(config) = updates.recv().await {
                    guard.reload(&config);
                }
            });
            Some(watcher)
        }
        None => None,
    };

    let poll_guard = guard.clone();
    let mut poller = SmartPoller::from_config(
        move || {
            let guard = poll_guard.clone();
            let url = url.clone();
            let options = options.clone();
            let fetch_config = fetch_config.clone();
            async move {
                match guard.fetch(&url, &options, &fetch_config).await {
                    Ok(Some(response)) if response.is_success() => {
                        tracing::info!(
                            status = %response.status(),
                            cached = response.is_cached(),
                            bytes = response.bytes().len(),
                            "Poll succeeded"
                        );
                        Ok(())
                    }
                    Ok(Some(response)) => Err(format!("status {}", response.status())),
                    Ok(None) => Err("request not attempted".to_string()),
                    Err(e) => Err(e.to_string()),
                }
            }
        },
        &poller_config,
    );

    poller.start();
    signals::shutdown_on_ctrl_c(&shutdown).await;
    poller.stop();
    sweeper.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_response(attempt: u32, response: &GuardedResponse) -> Result<(), Box<dyn std::error::Error>> {
    let origin = if response.is_cached() { "cache" } else { "network" };
    if !response.is_success() {
        eprintln!("#{}: status {} ({})", attempt, response.status(), origin);
        eprintln!("{}", response.text());
        return Ok(());
    }

    println!("#{}: status {} ({})", attempt, response.status(), origin);
    match response.json::<serde_json::Value>() {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", response.text()),
    }
    Ok(())
}
