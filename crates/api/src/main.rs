use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use api::config::{AppConfig, ENV_CONFIG};
use api::{AppState, router};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config_path = config_path_from_args().or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        classifier = ?config.classifier,
        "Configuration loaded"
    );

    let bind = config.bind.clone();
    let app = router(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("Server listening on http://{}", bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}
