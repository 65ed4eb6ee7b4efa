use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info, warn};

use taskkeeper::{routes, store::PgStore, AppState, Config, Stores};

fn cors(origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);
    match origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors.allow_any_origin(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let pg = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections, config.store_timeout)
                .await
                .map_err(|e| {
                    error!("database connection error: {}", e);
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
                })?;
            store
                .migrate()
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
            info!("connected to Postgres");
            Some(store)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store; data will not survive a restart");
            None
        }
    };

    let stores = match &pg {
        Some(store) => Stores::postgres(store.clone()),
        None => Stores::memory(),
    };

    let state = AppState::new(&config, stores)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    let state = web::Data::new(state);

    let sweeper = state.ledger.clone().spawn_sweeper(config.sweep_interval);

    info!("Starting taskkeeper server at {}", config.server_url());
    let cors_origin = config.cors_origin.clone();
    let server_state = state.clone();
    let result = HttpServer::new(move || {
        App::new()
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .configure(|cfg| routes::config(cfg, server_state.clone()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await;

    sweeper.shutdown().await;
    if let Some(store) = pg {
        store.close().await;
    }
    info!("taskkeeper stopped");

    result
}
