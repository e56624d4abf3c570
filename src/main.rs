mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod search;
mod store;
mod validation;
mod workflows;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use crate::config::{AppConfig, StoreSettings};
use crate::handlers::AppState;
use crate::store::{MemoryRecordStore, PgRecordStore, RecordStore, RestRecordStore};

async fn build_store(settings: &StoreSettings) -> std::io::Result<Option<Arc<dyn RecordStore>>> {
    let store: Arc<dyn RecordStore> = match settings {
        StoreSettings::Postgres { database_url } => {
            let store = PgRecordStore::connect(database_url).await.map_err(|err| {
                log::error!("Failed to initialize database: {err:?}");
                std::io::Error::new(std::io::ErrorKind::Other, err)
            })?;
            log::info!("Record store: postgres (migrations applied)");
            Arc::new(store)
        }
        StoreSettings::Rest { url, service_key } => {
            log::info!("Record store: REST endpoint at {url}");
            Arc::new(RestRecordStore::new(url, service_key.clone()))
        }
        StoreSettings::Memory => {
            log::warn!("Record store: in-memory, data is lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
        StoreSettings::Unconfigured => {
            log::warn!("No record store configured; directory endpoints will answer 500");
            return Ok(None);
        }
    };
    Ok(Some(store))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(|err| {
        log::error!("Invalid configuration: {err}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    })?;
    let bind_address = config.bind_address();

    let store = build_store(&config.store).await?;
    let state = web::Data::new(AppState::new(store, config.submission));

    log::info!("Starting business directory service on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(handlers::routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
