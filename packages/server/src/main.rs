use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api::auth::{GitHubOAuth, SessionTokenCodec};
use api::db::{PgNoteStore, PgStateStore};
use api::users::HttpUserRegistry;
use api::Config;
use server::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,server=debug,api=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    let pool = api::db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    api::db::migrate(&pool)
        .await
        .context("Failed to run migrations")?;

    let http = config
        .http_client()
        .context("Failed to build HTTP client")?;
    let codec = Arc::new(SessionTokenCodec::new(&config.session));
    let users = Arc::new(HttpUserRegistry::new(
        config.users_service.clone(),
        http.clone(),
    ));
    let oauth = GitHubOAuth::new(
        config.oauth.clone(),
        http,
        Arc::new(PgStateStore::new(pool.clone())),
        users.clone(),
        codec.clone(),
    );

    let app = server::router(AppState {
        notes: Arc::new(PgNoteStore::new(pool)),
        users,
        codec,
        oauth: Arc::new(oauth),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
