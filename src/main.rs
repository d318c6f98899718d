mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod models;
mod routes;
mod service;
mod telegram;
mod utils;

use std::sync::Arc;

use config::Config;
use db::DBClient;
use dotenv::dotenv;
use handler::router::UpdateRouter;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use telegram::client::TelegramClient;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("🔥 Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(
            config
                .log_level
                .parse::<LevelFilter>()
                .unwrap_or(LevelFilter::INFO),
        )
        .init();

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            tracing::error!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("🔥 Failed to run migrations: {}", err);
        std::process::exit(1);
    }

    let db_client = Arc::new(DBClient::new(pool));

    match service::staff_service::bootstrap_staff(db_client.as_ref(), &config.admin_user_ids).await {
        Ok(count) => tracing::info!("Staff bootstrap complete ({} accounts)", count),
        Err(err) => tracing::error!("Staff bootstrap failed: {}", err),
    }

    if config.support_channel_id.is_none() {
        tracing::warn!("SUPPORT_CHANNEL_ID not set - new tickets will not be announced to staff");
    }

    let client = Arc::new(TelegramClient::new(&config));
    let router = Arc::new(UpdateRouter::new(
        db_client.clone(),
        client.clone(),
        config.support_channel_id,
    ));

    tokio::spawn(service::poller::start_update_poller(client, router));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("🔥 Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("🚀 Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, create_router()).await {
        tracing::error!("🔥 Server error: {}", err);
        std::process::exit(1);
    }
}
