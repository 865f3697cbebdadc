mod feed;
mod logging;
mod snapshot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use stream_out_core::config::{self, resolve_output_dir, resolve_state_file};
use stream_out_core::{
    AccountApi, ClockStore, Exporter, FileSink, Fetcher, JsonClockStore, OutputSink,
    OverlayAssets, ResetScheduler, RetryPolicy, SourceContext, SystemClock, standard_sources,
};
use stream_out_types::{StreamOutConfig, UnicodeSigning};
use tokio::sync::{broadcast, watch};

use snapshot::SnapshotApi;

#[derive(Parser)]
#[command(version, about = "Export account statistics as overlay files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Folder the overlay reads from
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// File holding reset windows and baselines
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Folder with commander.png, catmander.png, combat.png and pvp_rank.png
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    /// Write daily rolling logs here instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Seconds between polls of the account API (at least 300)
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    #[arg(long, global = true, value_enum)]
    signing: Option<Signing>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the account and keep the overlay files current. Reads game events from stdin.
    Run {
        /// Account snapshot JSON served in place of the live API
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Delete every overlay file
    Clear,
    /// Print the config file location and the effective settings
    Config,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Signing {
    #[value(name = "none")]
    Bare,
    Prefixed,
    Suffixed,
}

impl From<Signing> for UnicodeSigning {
    fn from(signing: Signing) -> Self {
        match signing {
            Signing::Bare => UnicodeSigning::None,
            Signing::Prefixed => UnicodeSigning::Prefixed,
            Signing::Suffixed => UnicodeSigning::Suffixed,
        }
    }
}

impl Cli {
    /// Command line flags win over the config file.
    fn apply_overrides(&self, config: &mut StreamOutConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(path) = &self.state_file {
            config.state_file = Some(path.clone());
        }
        if let Some(dir) = &self.assets_dir {
            config.assets_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval_secs = secs;
        }
        if let Some(signing) = self.signing {
            config.unicode_signing = signing.into();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();

    let loaded = config::try_load_config();
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    cli.apply_overrides(&mut config);

    let _log_guard = logging::init_logging(config.log_dir.as_deref());
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "Using default config");
    }

    match cli.command {
        Commands::Run { snapshot, once } => {
            let api = Arc::new(SnapshotApi::open(snapshot).await.map_err(|e| e.to_string())?);
            run(config, api, once).await
        }
        Commands::Clear => {
            let exporter = build_exporter(&config, Arc::new(SnapshotApi::empty())).await?;
            exporter.clear().await;
            tracing::info!("Overlay files removed");
            Ok(())
        }
        Commands::Config => {
            if let Some(path) = config::config_path() {
                println!("config file: {}", path.display());
            }
            let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

async fn build_exporter(config: &StreamOutConfig, api: Arc<SnapshotApi>) -> Result<Exporter, String> {
    let output_dir = resolve_output_dir(config).map_err(|e| e.to_string())?;
    let state_file = resolve_state_file(config).map_err(|e| e.to_string())?;
    tracing::info!(output = %output_dir.display(), state = %state_file.display(), "Paths resolved");

    let store: Arc<dyn ClockStore> = Arc::new(JsonClockStore::open(state_file));
    let sink: Arc<dyn OutputSink> = Arc::new(FileSink::new(output_dir, config.sink_retry));
    let fetcher = Fetcher::new(RetryPolicy::from(config.retry), api.clone());
    let ctx = SourceContext {
        api: api as Arc<dyn AccountApi>,
        fetcher: Arc::new(fetcher),
        sink,
        store: store.clone(),
        signing: config.unicode_signing,
    };

    let assets = match &config.assets_dir {
        Some(dir) => OverlayAssets::load_from_dir(dir).await,
        None => OverlayAssets::default(),
    };
    let scheduler = Arc::new(ResetScheduler::new(Arc::new(SystemClock), config.weekly_reset));

    Ok(Exporter::new(
        standard_sources(&ctx, config, assets),
        store,
        scheduler,
        Duration::from_secs(config.effective_poll_interval_secs()),
    ))
}

async fn run(config: StreamOutConfig, api: Arc<SnapshotApi>, once: bool) -> Result<(), String> {
    let exporter = build_exporter(&config, api).await?;
    exporter.initialize().await;

    if once {
        for (source, outcome) in exporter.do_update().await {
            tracing::info!(source, ?outcome, "Cycle finished");
        }
        return Ok(());
    }

    let (events, _) = broadcast::channel(64);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = exporter.spawn(&events, shutdown_rx);
    feed::spawn_stdin_feed(events.clone());

    tracing::info!(
        sources = exporter.runners().len(),
        poll_interval_secs = config.effective_poll_interval_secs(),
        "Exporter running, Ctrl-C to stop"
    );
    tokio::signal::ctrl_c().await.map_err(|e| e.to_string())?;

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Runner task ended abnormally");
        }
    }
    Ok(())
}
