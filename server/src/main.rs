use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use lounge_server::config::{generate_config_template, Cli, Config};
use lounge_server::presence::{sweeper, PresenceRegistry};
use lounge_server::{routes, state};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Handle --generate-config: print template and exit
    if cli.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load(&cli)?;

    // Initialize tracing/logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lounge_server=info"));
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(env_filter)
            .init();
    }

    tracing::info!("Lounge presence server v{} starting", env!("CARGO_PKG_VERSION"));

    // Presence state is process-local; a restart means every listener is gone
    let registry = Arc::new(PresenceRegistry::new(config.presence.expiry_window_ms));
    let ambient = config.ambient_baseline();
    tracing::info!(
        expiry_window_ms = config.presence.expiry_window_ms,
        ambient_enabled = ambient.enabled,
        ambient_bucket_ms = ambient.bucket_ms,
        "Presence registry ready"
    );

    if config.presence.sweep_interval_secs > 0 {
        sweeper::spawn_periodic_sweep(registry.clone(), config.presence.sweep_interval_secs);
        tracing::info!(
            "Background presence sweep every {}s",
            config.presence.sweep_interval_secs
        );
    }

    let app_state = state::AppState::new(registry, ambient);

    // Build router
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
