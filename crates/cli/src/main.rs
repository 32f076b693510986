mod app;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use activity_core::{
    config::{self, AppConfig, BackendKind},
    ActivityApi, HttpApi, MemoryApi, SessionStore,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::app::{ActivityApp, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load_from(&config_path)?;
    info!(path = %config_path.display(), backend = ?config.backend, "configuration loaded");

    let command = Command::parse(std::env::args().skip(1))?;
    let backend = match command {
        Command::Demo => BackendKind::Memory,
        _ => config.backend,
    };
    let api: Arc<dyn ActivityApi> = match backend {
        BackendKind::Http => Arc::new(HttpApi::from_config(&config)?),
        BackendKind::Memory => Arc::new(MemoryApi::with_sample_catalog()),
    };
    let store = SessionStore::new(api);

    let app = ActivityApp::new(store, config);
    app.run(command).await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("activity.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
