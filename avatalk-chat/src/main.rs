//! avatalk-chat - talking-head chat service
//!
//! **Module Identity:**
//! - Name: avatalk-chat
//! - Default port: 5730
//!
//! Serves the speech → reply → cloned voice → video pipeline over HTTP and
//! exposes direct language-model queries and provider diagnostics.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use avatalk_common::config::{default_config_path, load_toml_config, ProcessEnv, RootFolderResolver};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use avatalk_chat::config::{TomlConfig, MODULE_NAME, ROOT_FOLDER_ENV};
use avatalk_chat::pipeline::{PipelineController, PipelinePaths};
use avatalk_chat::providers::{ConfigSource, FileConfigSource};
use avatalk_chat::AppState;

/// Command-line arguments for avatalk-chat
#[derive(Parser, Debug)]
#[command(name = "avatalk-chat")]
#[command(about = "Talking-head chat pipeline service")]
#[command(version)]
struct Args {
    /// Service root holding static/, config/ and the engine checkouts
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Bootstrap TOML file (default: ~/.config/avatalk/chat.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the TOML value)
    #[arg(short, long, env = "AVATALK_CHAT_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Start at info; the configured level is applied once the config is loaded
    let (filter, filter_handle) = reload::Layer::new(log_filter("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting avatalk-chat v{} ({}) built {} [{}]",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config: TomlConfig = match args.config.clone().or_else(|| default_config_path(MODULE_NAME)) {
        Some(path) => load_toml_config(&path),
        None => {
            info!("No config directory on this platform, using compiled defaults");
            TomlConfig::default()
        }
    };
    if let Err(e) = filter_handle.reload(log_filter(&config.logging.level)) {
        warn!("Failed to apply configured log level: {}", e);
    }

    // Root folder: CLI > env > TOML > working directory
    let root_folder = RootFolderResolver::new(ROOT_FOLDER_ENV)
        .with_cli_arg(args.root_folder)
        .with_toml_value(config.root_folder.clone())
        .resolve();
    info!("Root folder: {}", root_folder.display());

    let paths = config.pipeline_paths(&root_folder);
    for dir in ["static/audios", "static/text", "static/videos"] {
        let dir = paths.resolve(dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    if !paths.sentinel_video().is_file() {
        warn!(
            path = %paths.sentinel_video().display(),
            "Fallback video missing; degraded runs will point at a file that does not exist"
        );
    }

    // Provider configuration is reloaded per request; log the startup view once
    let providers: Arc<dyn ConfigSource> =
        Arc::new(FileConfigSource::under_root(&root_folder, Arc::new(ProcessEnv)));
    for profile in providers.load().profiles() {
        info!(
            backend = %profile.backend,
            enabled = profile.enabled,
            configured = profile.has_usable_key(),
            model = %profile.model,
            "Provider"
        );
    }

    let engines = config
        .build_engines(&root_folder, &ProcessEnv, providers.clone())
        .context("Failed to initialize engines")?;
    let chat = engines.chat.clone();
    let controller = PipelineController::new(paths, engines);

    let state = AppState::new(controller, providers, chat);
    let app = avatalk_chat::build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "avatalk_chat={level},avatalk_common={level},tower_http=info",
            level = level
        )
        .into()
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
