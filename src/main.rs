//! midimap - map MIDI Control-Change messages onto sliders and a transport

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midimap::config::{AppConfig, ConfigWatcher};
use midimap::mapping::{InputPort, MidiCenter};
use midimap::paths::AppPaths;
use midimap::state::{AppAction, StoreHandle};
use midimap::{cli, sniffer, view};

/// midimap - drive two sliders and a play/stop transport from MIDI CC
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,

    /// Input port pattern, overrides midi.input_port
    #[arg(short, long)]
    input: Option<String>,

    /// Print every incoming MIDI message with its routing
    #[arg(long)]
    monitor: bool,

    /// Run without the interactive prompt
    #[arg(long)]
    no_repl: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let paths = AppPaths::detect(args.config.as_deref());

    let config_found = paths.config.exists();
    let config = AppConfig::load_or_default(&paths.config)
        .await
        .with_context(|| format!("Failed to load config {}", paths.config.display()))?;

    let _log_guard = init_logging(&args.log_level, &config, &paths)?;

    info!("Starting midimap...");
    if config_found {
        info!("Configuration file: {}", paths.config.display());
    } else {
        info!(
            "Config file {} not found, using defaults",
            paths.config.display()
        );
    }

    if args.list_ports {
        sniffer::list_ports_formatted()?;
        return Ok(());
    }

    run_app(args, config, paths).await?;

    info!("midimap shutdown complete");
    Ok(())
}

async fn run_app(args: Args, config: AppConfig, paths: AppPaths) -> Result<()> {
    let center = Arc::new(MidiCenter::new());

    let mut input_port = connect_input(&center, &args, &config);

    let store = StoreHandle::spawn(center.clone(), config.cc_map());

    if args.monitor {
        sniffer::attach_monitor(&center, config.cc_map())?;
    }

    if config.session.auto_start {
        store.send(AppAction::OnAppear);
    }

    tokio::spawn(view::run_status_printer(store.subscribe()));

    let mut watcher = if paths.config.exists() {
        match ConfigWatcher::new(&paths.config) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Config hot-reload disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    // The REPL blocks on stdin, so it gets its own thread
    let mut repl_done = if args.no_repl {
        None
    } else {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let repl_store = store.clone();
        let repl_center = center.clone();
        std::thread::Builder::new()
            .name("repl".to_string())
            .spawn(move || {
                if let Err(e) = cli::run_repl(repl_store, repl_center) {
                    warn!("REPL stopped: {}", e);
                }
                let _ = done_tx.send(());
            })
            .context("Failed to spawn REPL thread")?;
        Some(done_rx)
    };

    info!("Ready to process MIDI events!");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(new_config) = next_config(&mut watcher) => {
                info!("📝 Configuration file changed, reloading mapping");
                store.update_mapping(new_config.cc_map());
            }

            _ = repl_closed(&mut repl_done) => {
                info!("REPL closed");
                break;
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }

    info!("Shutting down...");
    store.send(AppAction::OnDisappear);
    store.shutdown().await;
    if let Some(port) = input_port.as_mut() {
        port.close();
    }

    Ok(())
}

/// Open the configured input port; failures leave the center detached
fn connect_input(center: &Arc<MidiCenter>, args: &Args, config: &AppConfig) -> Option<InputPort> {
    let pattern = args.input.as_ref().or(config.midi.input_port.as_ref())?;

    match center.connect_input(&config.midi.client_name, pattern) {
        Ok(port) => {
            info!("✅ Listening on {}", port.name());
            Some(port)
        }
        Err(e) => {
            warn!("⚠️  {} - running without a MIDI input", e);
            None
        }
    }
}

async fn repl_closed(done: &mut Option<oneshot::Receiver<()>>) {
    match done {
        Some(rx) => {
            let _ = rx.await;
        }
        None => std::future::pending().await,
    }
}

async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

fn init_logging(level: &str, config: &AppConfig, paths: &AppPaths) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = if config.logging.file {
        std::fs::create_dir_all(&paths.logs_dir).with_context(|| {
            format!("Failed to create logs dir {}", paths.logs_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&paths.logs_dir, "midimap.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
