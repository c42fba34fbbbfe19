use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use omahub_cache::{system_clock, AppServices, CacheProfiles, MonitorConfig};
use std::path::PathBuf;
use std::time::Duration;

/// Runs the OmaHub caches and performance monitor until interrupted.
#[derive(Debug, Parser)]
#[command(name = "omahub-runtime", version, about)]
struct Cli {
    /// Directory for the report history (overrides OMAHUB_PERFORMANCE_DIR)
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Analytics endpoint reports are POSTed to (overrides OMAHUB_ANALYTICS_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Seconds between expired-entry sweeps
    #[arg(long, default_value_t = 60)]
    sweep_secs: u64,

    /// Write an export of current and historical metrics here on exit
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn init_logging(level: LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
    let encoder = Box::new(PatternEncoder::new(
        "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}",
    ));
    let console = ConsoleAppender::builder().encoder(encoder).build();
    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(Root::builder().appender("console").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    let mut config = MonitorConfig::from_env()?;
    if let Some(dir) = cli.storage_dir {
        config = config.with_storage_dir(dir);
    }
    if let Some(endpoint) = cli.endpoint.as_deref() {
        config = config.with_endpoint(endpoint)?;
    }
    log::info!(
        "Report history in {}, analytics endpoint {}",
        config.storage_dir.display(),
        config.analytics_endpoint.as_deref().unwrap_or("disabled")
    );

    let services = AppServices::new(&CacheProfiles::default(), config, system_clock());
    let running = services.start(Duration::from_secs(cli.sweep_secs.max(1)), None);

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");

    running.shutdown().await;
    services.monitor().publish_report().await;
    if let Some(dir) = cli.export_dir {
        services.monitor().export_data(dir);
    }
    Ok(())
}
