//! health-worker — runs the alarm evaluation engine as a standalone daemon.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use health_core::{ChartFlags, HealthConfig, MetricQuery, QueryResult};
use health_engine::{load_silencer_ruleset, Host, MainLoop, RuleLoader};

/// health-worker — alarm evaluation daemon.
#[derive(Parser, Debug)]
#[command(name = "health-worker", version, about)]
struct Cli {
    /// User-authored rule directory (spec "health configuration directory").
    #[arg(long, env = "HEALTH_CONFIG_DIR", default_value = "/etc/health.d")]
    rules_dir: PathBuf,

    /// Bundled/stock rule directory (spec "stock health configuration directory").
    #[arg(long, env = "HEALTH_STOCK_CONFIG_DIR")]
    stock_rules_dir: Option<PathBuf>,

    /// Path to the silencer ruleset JSON file.
    #[arg(long, env = "HEALTH_SILENCERS_FILE", default_value = "/etc/health-silencers.json")]
    silencers_file: PathBuf,

    /// Floor on loop period, seconds (spec "run at least every seconds").
    #[arg(long, env = "HEALTH_RUN_AT_LEAST_EVERY", default_value_t = 10)]
    min_run_every: u64,

    /// Delay window after a detected suspension, seconds.
    #[arg(long, env = "HEALTH_HIBERNATION_DELAY", default_value_t = 60)]
    hibernation_delay: i64,

    /// Local hostname this worker evaluates rules for.
    #[arg(long, env = "HEALTH_HOSTNAME", default_value = "localhost")]
    hostname: String,
}

/// Placeholder metric store. The real chart/dimension database is an
/// external collaborator (spec §1/§6); this stand-in reports every chart
/// as not yet collected, so rules never become runnable until a real
/// adapter is wired in by the embedding daemon.
struct UnconfiguredMetricQuery;

impl MetricQuery for UnconfiguredMetricQuery {
    fn query(&self, _: &str, _: &str, _: u32, _: i64, _: i64, _: &str, _: &str) -> Result<QueryResult, String> {
        Err("no metric store configured".to_string())
    }
    fn first_time(&self, _: &str) -> i64 {
        0
    }
    fn last_time(&self, _: &str) -> i64 {
        0
    }
    fn flags(&self, _: &str) -> ChartFlags {
        ChartFlags::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = HealthConfig {
        enabled: true,
        min_run_every_secs: cli.min_run_every.max(1),
        hibernation_delay_secs: cli.hibernation_delay,
        rules_dir: cli.rules_dir.clone(),
        stock_rules_dir: cli.stock_rules_dir.clone(),
        silencers_file: cli.silencers_file.clone(),
        silencers_max_bytes: 10 * 1024 * 1024,
    };
    config.log_summary();

    let mut loader = RuleLoader::new(cli.rules_dir, cli.stock_rules_dir);
    let load_results = loader.load_all()?;
    info!(count = load_results.len(), "initial rule load complete");
    if let Err(err) = loader.watch() {
        tracing::warn!(error = %err, "failed to start rule-file watcher, continuing without hot-reload");
    }
    let loader = Arc::new(loader);

    let ruleset = load_silencer_ruleset(&cli.silencers_file, config.silencers_max_bytes);

    let host = Arc::new(Host::new(cli.hostname.clone(), cli.hostname.clone(), 10_000));
    *host.rules.write().unwrap() = loader.bind_all(&cli.hostname);
    *host.silencers.write().unwrap() = ruleset;

    let exit = Arc::new(AtomicBool::new(false));
    {
        // The watcher keeps the loader's template map fresh in the
        // background; this tick re-binds the host's live rules from it so
        // an edited rule file eventually takes effect without a restart.
        let host = Arc::clone(&host);
        let loader = Arc::clone(&loader);
        let exit = Arc::clone(&exit);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(std::time::Duration::from_secs(30));
            while !exit.load(std::sync::atomic::Ordering::Acquire) {
                tick.tick().await;
                health_engine::reload(&host, &loader);
            }
        });
    }
    {
        let exit = Arc::clone(&exit);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received shutdown signal");
                exit.store(true, std::sync::atomic::Ordering::Release);
            }
        });
    }

    let query: Arc<dyn MetricQuery> = Arc::new(UnconfiguredMetricQuery);
    let mut main_loop = MainLoop::new(vec![host], query, config.min_run_every_secs as i64, config.hibernation_delay_secs, exit);

    info!("health-worker starting");
    main_loop.run().await;
    info!("health-worker exited cleanly");
    Ok(())
}
