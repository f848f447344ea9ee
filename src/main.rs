//! pollwatch - report file changes under a set of directories by polling.
//!
//! Usage:
//!   pollwatch [ROOTS...]                 Watch roots with the environment's config file
//!   pollwatch --config app.json          Use an explicit config file
//!   pollwatch -e txt -x ./tmp ./data     Only .txt files, skipping ./tmp
//!   pollwatch --format json ./data       Print events as JSON lines
//!   pollwatch --help                     Show help

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use pollwatch_core::{AppConfig, parse_duration};
use pollwatch_watch::{Event, OverflowPolicy, Watcher, WatcherConfig};

#[derive(Parser)]
#[command(
    name = "pollwatch",
    version,
    about = "Report created, updated and deleted files by polling",
    long_about = "pollwatch rescans each watched directory every poll interval and \
                  prints one line per created, updated or deleted file.\n\n\
                  Settings come from config/app.<ENV>.json when present; command \
                  line options extend or override them."
)]
struct Cli {
    /// Directories to watch, in addition to those in the config file
    roots: Vec<PathBuf>,

    /// Config file (defaults to config/app.<env>.json if it exists)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment used to pick the default config file (defaults to $ENV, then "local")
    #[arg(long)]
    env: Option<String>,

    /// Poll interval (e.g., "500ms", "2s", "1m")
    #[arg(short, long)]
    interval: Option<String>,

    /// Only report files with this extension (repeatable)
    #[arg(short, long = "ext")]
    extensions: Vec<String>,

    /// Skip directories whose path starts with this prefix (repeatable)
    #[arg(short = 'x', long = "exclude")]
    excluded: Vec<String>,

    /// Record existing files at startup instead of reporting them as created
    #[arg(long)]
    baseline: bool,

    /// Drop events instead of pausing polling when output falls behind
    #[arg(long)]
    drop_overflow: bool,

    /// Number of events buffered between the watcher and the output
    #[arg(long, default_value = "64")]
    buffer: usize,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let app = load_app_config(&cli)?;

    init_logging(&app.watcher.log.level);

    let config = build_config(&cli, &app)?;
    if config.watch.roots.is_empty() {
        bail!("Nothing to watch: pass directories or set watcher.dirs.watch in the config file");
    }

    run(config, cli.format).await
}

/// Load the config file named on the command line, or the environment's
/// default file when it exists.
fn load_app_config(cli: &Cli) -> Result<AppConfig> {
    if let Some(path) = &cli.config {
        return AppConfig::load(path).wrap_err("Failed to load config");
    }

    let env = cli.env.clone().unwrap_or_else(AppConfig::environment);
    let path = AppConfig::path_for(&env);
    if path.exists() {
        AppConfig::load(&path).wrap_err("Failed to load config")
    } else {
        Ok(AppConfig::default())
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the config file.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge command line options into the config file's watcher settings.
fn build_config(cli: &Cli, app: &AppConfig) -> Result<WatcherConfig> {
    let mut watch = app.watcher.watch_set();
    watch
        .add_watch(cli.roots.iter().cloned())
        .add_extensions(cli.extensions.iter().cloned())
        .add_excluded(cli.excluded.iter().cloned());

    let poll_interval = match &cli.interval {
        Some(interval) => parse_duration(interval)?,
        None => app.watcher.poll_interval()?,
    };

    let overflow = if cli.drop_overflow {
        OverflowPolicy::Drop
    } else {
        OverflowPolicy::Block
    };

    let config = WatcherConfig::builder()
        .poll_interval(poll_interval)
        .watch(watch)
        .overflow(overflow)
        .event_buffer(cli.buffer)
        .baseline_on_start(cli.baseline)
        .build()
        .wrap_err("Invalid watcher configuration")?;

    debug!(?config, "configuration loaded");
    Ok(config)
}

/// Print events until interrupted or until the watcher shuts itself down.
async fn run(config: WatcherConfig, format: OutputFormat) -> Result<()> {
    let (mut watcher, mut events) = Watcher::channel(config);
    watcher.start().await.wrap_err("Failed to start watcher")?;

    let shutdown = watcher.shutdown_signal();
    let term = termination();
    tokio::pin!(term);
    let mut failed = false;

    loop {
        tokio::select! {
            _ = &mut term => {
                info!("received term signal");
                break;
            }
            _ = shutdown.cancelled() => {
                error!("watcher shut down after a failed scan");
                failed = true;
                break;
            }
            Some(event) = events.recv() => print_event(&event, format)?,
        }
    }

    watcher.stop().await.wrap_err("Failed to stop watcher")?;

    if failed {
        bail!("Watching stopped because a directory could not be scanned");
    }
    Ok(())
}

fn print_event(event: &Event, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let now = chrono::Local::now();
            println!(
                "{} {:<12} {}",
                now.format("%H:%M:%S"),
                event.operation.to_string(),
                event.path.display()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

/// Resolve on SIGINT, or SIGTERM on unix.
async fn termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
