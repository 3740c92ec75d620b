//! Seatshare API server.
//!
//! Loads configuration, connects to PostgreSQL, applies migrations and
//! serves the HTTP API until interrupted.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::ExposeSecret;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seatshare::adapters::http::{api_router, AppState};
use seatshare::adapters::postgres::{
    run_migrations, PostgresEarningsLedger, PostgresGroupRepository,
    PostgresGroupTransactionRepository, PostgresInviteRepository, PostgresJoinIntentRepository,
    PostgresWalletLedger, PostgresWithdrawalRepository,
};
use seatshare::adapters::razorpay::{RazorpayConfig, RazorpayGateway};
use seatshare::adapters::settings::SharedSettings;
use seatshare::config::{AppConfig, ConfigError, PaymentConfig, ServerConfig, ValidationError};
use seatshare::domain::foundation::DomainError;
use seatshare::domain::webhook::SignatureVerifier;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Migration(#[from] DomainError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = %config.server.environment,
        gateway_test_mode = config.payment.is_test_mode(),
        "Starting seatshare"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!(max_connections = config.database.max_connections, "Database pool ready");

    if config.database.run_migrations {
        run_migrations(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let settings = Arc::new(SharedSettings::new(config.platform_settings()?));
    let gateway = Arc::new(RazorpayGateway::new(razorpay_config(&config.payment)));

    let state = AppState {
        groups: Arc::new(PostgresGroupRepository::new(pool.clone())),
        invites: Arc::new(PostgresInviteRepository::new(pool.clone())),
        intents: Arc::new(PostgresJoinIntentRepository::new(pool.clone())),
        transactions: Arc::new(PostgresGroupTransactionRepository::new(pool.clone())),
        wallet: Arc::new(PostgresWalletLedger::new(pool.clone())),
        earnings: Arc::new(PostgresEarningsLedger::new(pool.clone())),
        withdrawals: Arc::new(PostgresWithdrawalRepository::new(pool)),
        gateway,
        settings,
        webhook_verifier: SignatureVerifier::new(
            config.payment.webhook_secret.expose_secret().clone(),
        ),
        checkout_verifier: SignatureVerifier::new(
            config.payment.key_secret.expose_secret().clone(),
        ),
        payout_timeout: config.payment.request_timeout(),
    };
    if state.webhook_verifier.is_unconfigured() {
        tracing::warn!("Webhook secret is not set; gateway webhooks will be ignored");
    }

    let app = api_router(
        state,
        cors_layer(&config.server),
        Some(config.server.request_timeout()),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

/// JSON lines in production, human-readable output elsewhere. `RUST_LOG`
/// overrides the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

fn razorpay_config(payment: &PaymentConfig) -> RazorpayConfig {
    let config = RazorpayConfig::new(
        payment.key_id.clone(),
        payment.key_secret.expose_secret().clone(),
    )
    .with_base_url(payment.api_base_url.clone())
    .with_timeout(payment.request_timeout());

    match &payment.payout_account_number {
        Some(account) => config.with_payout_account(account.clone()),
        None => config,
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        if server.is_production() {
            return CorsLayer::new();
        }
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
