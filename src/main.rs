//! My Cafe API - Main Application Entry Point
//!
//! REST backend for the café storefront and its admin panel: accounts with
//! an OTP password-reset flow, role-gated user administration, and the
//! category/product catalog.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: HS256 session tokens, Argon2 password hashes
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load and check configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations (and seed the demo menu if asked)
//! 4. Wire the auth service, OTP store and mailer
//! 5. Build HTTP router with routes and middleware
//! 6. Serve until Ctrl+C / SIGTERM

mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod stores;
#[cfg(test)]
mod test_support;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::HeaderValue;
use chrono::Utc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::{
    services::{
        auth_service::AuthService, mailer, password::SecretHasher, token_service::TokenService,
    },
    state::AppState,
    stores::{otp_store::InMemoryOtpStore, user_store::PgUserStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env().context("failed to load configuration")?;
    config.validate()?;
    tracing::info!(?config, "Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if config.seed_demo_data {
        let inserted = db::seed_demo_catalog(&pool).await?;
        tracing::info!(inserted, "Demo catalog seeded");
    }

    let otps = Arc::new(InMemoryOtpStore::new());
    if config.otp_sweep_interval_secs > 0 {
        spawn_otp_sweeper(otps.clone(), Duration::from_secs(config.otp_sweep_interval_secs));
    }

    let tokens = TokenService::new(&config.jwt_secret, config.reset_secret());
    let auth = AuthService::new(
        Arc::new(PgUserStore::new(pool.clone())),
        otps,
        mailer::from_config(&config)?,
        tokens.clone(),
        SecretHasher::default(),
        config.frontend_base(),
    );

    let state = AppState {
        pool,
        auth: Arc::new(auth),
        tokens,
    };
    let origin = HeaderValue::from_str(config.frontend_base())
        .context("FRONTEND_URL is not a valid header value")?;
    let app = routes::build_router(state, routes::cors_layer(origin));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically drop reset codes nobody came back for.
fn spawn_otp_sweeper(store: Arc<InMemoryOtpStore>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired(Utc::now());
            if purged > 0 {
                tracing::debug!(purged, "Expired OTP records purged");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
