use actix_web::{App, HttpServer, web};
use cinelist::data::list_repository::InMemoryListRepository;
use cinelist::data::postgres::{PostgresListRepository, PostgresUserRepository, create_pool};
use cinelist::data::user_repository::InMemoryUserRepository;
use cinelist::domain::gateway::MetadataGateway;
use cinelist::domain::repository::{ListRepository, UserRepository};
use cinelist::infrastructure::config::Config;
use cinelist::infrastructure::logging::init_logging;
use cinelist::infrastructure::tmdb::TmdbGateway;
use cinelist::presentation::handlers::AppState;
use cinelist::presentation::middleware::{RequestIdMiddleware, SessionMiddleware, TimingMiddleware};
use cinelist::presentation::routes::configure;
use std::sync::Arc;
use tracing::{info, instrument, warn};

type Stores = (Arc<dyn UserRepository>, Arc<dyn ListRepository>);

async fn build_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.database_url.as_deref() {
        Some(url) => {
            info!("Connecting to PostgreSQL");
            let pool = create_pool(url, config.database_max_connections).await?;
            Ok((
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresListRepository::new(pool)),
            ))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            Ok((
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryListRepository::new()),
            ))
        }
    }
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    init_logging();
    info!("Logging initialized successfully");

    let config = Config::from_env()?;
    info!(
        tmdb_api_url = %config.tmdb_api_url,
        persistent = config.database_url.is_some(),
        "Configuration loaded"
    );

    let (user_repository, list_repository) = build_stores(&config).await?;
    let gateway: Arc<dyn MetadataGateway> = Arc::new(TmdbGateway::new(
        config.api_key.clone(),
        config.tmdb_api_url.clone(),
        config.metadata_timeout(),
    )?);

    let state = web::Data::new(AppState::new(
        user_repository,
        list_repository,
        gateway,
        &config,
    ));
    info!("Application state initialized");

    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .wrap(SessionMiddleware)
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .configure(configure)
    });

    let (host, port) = config.bind_address();
    let server = server.bind((host.as_str(), port))?;
    info!(host = %host, port = port, "Starting HTTP server");

    server.run().await?;
    Ok(())
}
