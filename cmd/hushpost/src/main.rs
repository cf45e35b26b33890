//! # Hushpost Binary
//!
//! Assembles the application from configuration and compile-time features,
//! then serves the API until Ctrl-C or SIGTERM.

#[cfg(not(feature = "web-axum"))]
compile_error!("the hushpost binary needs the `web-axum` feature");

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, Paging};
use auth_adapters::GatewayIdentityResolver;
use configs::{AppConfig, AuthConfig, AuthMode, LogConfig, StorageBackend, StorageConfig};
use domains::{IdentityResolver, Repositories};
use services::{ContentLimits, DenylistPolicy, Services};
use storage_adapters::MemoryStore;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let repos = build_repositories(&config.storage).await?;
    let identity = build_identity(&config.auth)?;

    let policy = match &config.content.denylist {
        Some(words) => DenylistPolicy::new(words),
        None => DenylistPolicy::default(),
    };
    let limits = ContentLimits {
        post_max_chars: config.content.post_max_chars,
        comment_max_chars: config.content.comment_max_chars,
    };
    let paging = Paging {
        default_limit: config.content.default_page_size,
        max_limit: config.content.max_page_size,
    };

    let services = Services::new(repos, Arc::new(policy), limits);
    let app = router(AppState::new(services, identity, paging));

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, backend = ?config.storage.backend, auth = ?config.auth.mode, "hushpost listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("hushpost stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if log.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn build_repositories(storage: &StorageConfig) -> anyhow::Result<Repositories> {
    match storage.backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage; all content is lost on restart");
            Ok(Repositories::from_store(Arc::new(MemoryStore::new())))
        }
        StorageBackend::Postgres => postgres_repositories(storage).await,
    }
}

#[cfg(feature = "db-postgres")]
async fn postgres_repositories(storage: &StorageConfig) -> anyhow::Result<Repositories> {
    use secrecy::ExposeSecret;
    use storage_adapters::PgStore;

    let url = storage
        .url
        .as_ref()
        .context("storage.url is required for the postgres backend")?;
    let store = PgStore::connect(url.expose_secret(), storage.max_connections)
        .await
        .context("failed to connect to postgres")?;
    store.migrate().await.context("failed to run migrations")?;
    info!("postgres storage ready");
    Ok(Repositories::from_store(Arc::new(store)))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres_repositories(_storage: &StorageConfig) -> anyhow::Result<Repositories> {
    anyhow::bail!("storage.backend = \"postgres\" requires the `db-postgres` feature")
}

fn build_identity(auth: &AuthConfig) -> anyhow::Result<Arc<dyn IdentityResolver>> {
    match auth.mode {
        AuthMode::Header => {
            warn!("trusting bearer values as user ids; only run behind an authenticating gateway");
            Ok(Arc::new(GatewayIdentityResolver::new()))
        }
        AuthMode::Jwt => jwt_identity(auth),
    }
}

#[cfg(feature = "auth-jwt")]
fn jwt_identity(auth: &AuthConfig) -> anyhow::Result<Arc<dyn IdentityResolver>> {
    use auth_adapters::JwtIdentityResolver;
    use secrecy::ExposeSecret;

    let secret = auth
        .jwt_secret
        .as_ref()
        .context("auth.jwt_secret is required in jwt mode")?;
    Ok(Arc::new(JwtIdentityResolver::new(secret.expose_secret().as_bytes())))
}

#[cfg(not(feature = "auth-jwt"))]
fn jwt_identity(_auth: &AuthConfig) -> anyhow::Result<Arc<dyn IdentityResolver>> {
    anyhow::bail!("auth.mode = \"jwt\" requires the `auth-jwt` feature")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
