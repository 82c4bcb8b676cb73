mod badge;
mod cache;
mod color;
mod config;
mod constants;
mod error;
mod models;
mod server;
mod svg;
#[cfg(test)]
mod testing;
mod updown;

use std::{
    env,
    fs::OpenOptions,
    future::Future,
    path::{Path, PathBuf},
    process,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::Router;
use badge::BadgeResolver;
use cache::BadgeCache;
use clap::Parser;
use config::Config;
use constants::{APP_NAME, DEFAULT_CONFIG_PATH};
use error::ConfigError;
use server::{AppState, build_router};
use tokio::{net::TcpListener, sync::Notify};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use updown::UpdownClient;

#[derive(Parser)]
#[command(
    name = "updown-badge-server",
    version,
    about = "Service for generating badges for updown.io checks"
)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Disable colors in log output.
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config, env::var("UPDOWN_API_KEY").ok()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    init_tracing(&config, cli.no_color)?;

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(procs) = config.main.max_procs {
        runtime.worker_threads(procs);
    }

    runtime.build()?.block_on(run(config))
}

/// Reads the config file, applies the environment API key and validates the result.
fn load_config(path: &Path, api_key: Option<String>) -> Result<Config, ConfigError> {
    let mut config = Config::from_file(path)?;
    config.apply_env(api_key);
    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &Config, no_color: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = config.log_filter();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("updown_badge_server={level},tower_http={level}").into()
    });

    if config.log.file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(!no_color)
            .compact()
            .init();
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log.file)?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .compact()
            .init();
    }

    Ok(())
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let style = config.style()?;
    let redirect = config.redirect()?;
    let addr = config
        .listen_addr()
        .ok_or("server.ip is not a valid IP address")?;

    let updown = Arc::new(UpdownClient::new(
        config.api_url()?,
        config.updown.api_key.clone(),
    )?);

    let cache = BadgeCache::new(
        config.cache_period(),
        config.cache_sweep(),
        config.cache.capacity,
    );
    let sweeper = cache.spawn_sweeper();

    let state = AppState {
        resolver: Arc::new(BadgeResolver::new(cache, updown, style)),
        redirect,
    };
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "{APP_NAME} {} listening on {addr} (style: {style}, cache period: {}s)",
        env!("CARGO_PKG_VERSION"),
        config.cache.period
    );

    serve(listener, app, shutdown_signal(), config.shutdown_timeout()).await?;

    sweeper.abort();
    info!("{APP_NAME} stopped");

    Ok(())
}

/// Serves until `shutdown` resolves, then drains in-flight requests for at
/// most `drain_timeout`.
async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()>,
    drain_timeout: Duration,
) -> std::io::Result<()> {
    let drain = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown({
            let drain = drain.clone();
            async move { drain.notified().await }
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        _ = shutdown => {}
    }

    info!(
        "waiting up to {}s for in-flight requests",
        drain_timeout.as_secs()
    );
    drain.notify_one();

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(result) => result,
        Err(_) => {
            warn!("graceful shutdown timed out, dropping remaining connections");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            sigterm.recv().await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received INT signal, shutting down"),
        _ = terminate => info!("received TERM signal, shutting down"),
    }
}
