//! PeachTree Wholesale - wholesale pricing service for the storefront.
//!
//! # Architecture
//!
//! - Axum web framework, Askama for the admin page
//! - Wholesale directory in `PostgreSQL` when a database URL is configured,
//!   in process memory otherwise
//! - Shopify Admin REST API for price rules and discount codes
//!
//! # Security
//!
//! This binary holds the Shopify Admin API token. The admin page and
//! directory API carry no authentication of their own; deploy behind a
//! private network or an authenticating proxy.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use peachtree_wholesale::config::WholesaleConfig;
use peachtree_wholesale::directory::{InMemoryDirectory, PgDirectory, WholesaleDirectory};
use peachtree_wholesale::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WholesaleConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = WholesaleConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "peachtree_wholesale=info,tower_http=debug".into());

    // JSON logs when LOG_FORMAT=json, text otherwise
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    let json_layer =
        json_logs.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json_logs).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let directory: Arc<dyn WholesaleDirectory> = if let Some(url) = &config.database_url {
        let directory = PgDirectory::connect(url)
            .await
            .expect("Failed to create database pool");
        tracing::info!("Using PostgreSQL wholesale directory");
        // NOTE: Migrations are NOT run automatically on startup.
        // Run them explicitly via: cargo run -p peachtree-cli -- migrate
        Arc::new(directory)
    } else {
        tracing::warn!("No database configured, wholesale directory is in-memory only");
        Arc::new(InMemoryDirectory::new())
    };

    let state =
        AppState::from_config(&config, directory).expect("Failed to create application state");

    let app = peachtree_wholesale::app(state, &config.cors_origins);

    let addr = config.socket_addr();
    tracing::info!("wholesale listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
