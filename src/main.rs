use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kindred_match::config::{Settings, StorageBackend};
use kindred_match::core::{CompatibilityScorer, ScoringWeights};
use kindred_match::routes::{self, AppState};
use kindred_match::services::{
    LogNotifier, MatchService, Notifier, RedisNotifier, SearchLimits, SearchService,
};
use kindred_match::store::{MemoryStore, PostgresStore, Store};

fn init_tracing(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io_error("Configuration error", e)
    })?;

    init_tracing(&settings.logging.level, &settings.logging.format);
    info!("Starting Kindred matching service...");

    let store: Arc<dyn Store> = match settings.storage.backend {
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(&settings.database).await.map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io_error("PostgreSQL connection error", e)
            })?;
            info!(
                "PostgreSQL store initialized (max: {} connections)",
                settings.database.max_connections
            );
            Arc::new(store)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // Notifications degrade to logging without a broker
    let notifier: Arc<dyn Notifier> = match &settings.redis {
        Some(redis) => match RedisNotifier::new(&redis.url, redis.channel_prefix.clone()).await {
            Ok(notifier) => {
                info!("Redis notifier initialized");
                Arc::new(notifier)
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), logging notifications instead", e);
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    };

    let weights = ScoringWeights::default().merged(&settings.scoring.weights);
    info!("Scoring weights: {:?}", weights);
    let scorer = CompatibilityScorer::new(weights);

    let app_state = AppState {
        search: Arc::new(SearchService::new(
            store.clone(),
            scorer.clone(),
            SearchLimits::from(&settings.matching),
        )),
        matches: Arc::new(MatchService::new(store.clone(), notifier, scorer)),
        store,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
