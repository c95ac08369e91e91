// src/server/mod.rs - actix-web server assembly

pub mod middleware;
pub mod routes;

use crate::core::prelude::*;
use crate::stats::{RefreshGate, StatsCache};
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared state handed to every handler via `web::Data`.
#[derive(Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Mutex<StatsCache>,
    pub refresh_gate: RefreshGate,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        let cache = Mutex::new(StatsCache::new(config.stats.cache_capacity));
        let refresh_gate =
            RefreshGate::new(Duration::from_secs(config.stats.refresh_cooldown_secs));
        Self {
            config,
            cache,
            refresh_gate,
        }
    }
}

/// Validate the config, then run the HTTP server until shutdown.
pub async fn run(config: Config) -> Result<()> {
    config.validate()?;
    tokio::fs::create_dir_all(&config.storage.data_dir)
        .await
        .map_err(AppError::Io)?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let config = Arc::new(config);
    let state = web::Data::new(AppState::new(Arc::clone(&config)));
    let workers = config.server.workers;

    log::info!(
        "Starting hookwatch v{} on {} ({} routes, data dir {:?})",
        crate::core::constants::VERSION,
        bind_addr,
        config.routes.len(),
        config.storage.data_dir
    );

    let app_config = Arc::clone(&config);
    let mut server = HttpServer::new(move || {
        let cors = if app_config.server.cors_enabled {
            Cors::permissive()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
        } else {
            Cors::default()
        };

        App::new()
            .app_data(state.clone())
            .wrap(middleware::SecurityHeaders)
            .wrap(middleware::RequestLog)
            .wrap(cors)
            .configure(|app| routes::register_routes(app, &app_config))
    });

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    let server = server.bind(&bind_addr).map_err(AppError::Io)?;
    server.run().await.map_err(AppError::Io)
}
