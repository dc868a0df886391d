use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod channels;
mod config;
mod controllers;
mod db;
pub mod http;
mod models;
mod notes_client;

use channels::dispatcher::MessageDispatcher;
use channels::telegram::TelegramChannel;
use config::Config;
use db::Database;
use notes_client::NotesApiClient;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    log::info!("Notes bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    // The dispatcher submits completed notes through the HTTP API, the
    // same path external clients use.
    let api_client = Arc::new(NotesApiClient::new(config::api_base_url()));
    let dispatcher = Arc::new(MessageDispatcher::new(api_client));

    // Sweep abandoned dialogs so the state map never grows unbounded
    {
        let sweep_dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(120));
            interval.tick().await; // skip immediate tick
            loop {
                interval.tick().await;
                let removed = sweep_dispatcher.expire_stale_dialogs(chrono::Duration::minutes(30));
                if removed > 0 {
                    log::info!("[DIALOG] Expired {} abandoned dialog(s)", removed);
                }
            }
        });
    }

    // Telegram channel is optional — without a token the HTTP API runs alone
    let telegram_cancel = tokio_util::sync::CancellationToken::new();
    match config.telegram_bot_token.as_deref() {
        Some(token) => {
            let channel = TelegramChannel::new(token, dispatcher.clone(), telegram_cancel.clone());
            channel.start();
            log::info!("[TELEGRAM] Channel started (long polling)");
        }
        None => {
            log::warn!("[TELEGRAM] TELEGRAM_BOT_TOKEN not set — chat channel disabled");
        }
    }

    log::info!("Starting notes server on port {}", port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::notes::config)
    })
    .bind(("0.0.0.0", port))?
    .run();

    let server_handle = server.handle();

    // Ctrl+C: stop the Telegram channel, then the HTTP server
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        log::info!("Received Ctrl+C, shutting down...");
        telegram_cancel.cancel();
        server_handle.stop(true).await;
        log::info!("Shutdown complete");
    });

    server.await
}
