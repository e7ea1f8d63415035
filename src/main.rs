use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chado_jbrowse::{
    Config,
    backend::{Backend, Deadline, MemoryBackend},
    handlers::{AppState, create_router},
    policy::ErrorPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let backend = open_backend(&config).await?;
    let backend = match config.query_timeout() {
        Some(limit) => {
            tracing::info!("Backend query deadline: {:?}", limit);
            Arc::new(Deadline::new(backend, limit)) as Arc<dyn Backend>
        }
        None => backend,
    };

    let policy = if config.strict_errors {
        ErrorPolicy::strict()
    } else {
        ErrorPolicy::default()
    };

    let service_address = config.effective_base_url()?;
    let state = AppState::new(backend, service_address.clone(), policy);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting chado-jbrowse server on {}", addr);
    tracing::info!("Service address: {}", service_address);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_backend(config: &Config) -> anyhow::Result<Arc<dyn Backend>> {
    if let Some(path) = &config.fixture {
        tracing::info!("Serving dataset from {:?}", path);
        return Ok(Arc::new(MemoryBackend::from_path(path)?));
    }

    match &config.database_url {
        Some(url) => connect_database(url).await,
        None => anyhow::bail!("no backend configured: pass --fixture or --database-url"),
    }
}

#[cfg(feature = "postgres")]
async fn connect_database(url: &str) -> anyhow::Result<Arc<dyn Backend>> {
    tracing::info!("Connecting to Chado database");
    let backend = chado_jbrowse::backend::PostgresBackend::connect(url).await?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "postgres"))]
async fn connect_database(_url: &str) -> anyhow::Result<Arc<dyn Backend>> {
    anyhow::bail!("built without the postgres feature; use --fixture")
}
