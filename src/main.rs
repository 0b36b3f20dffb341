#![forbid(unsafe_code)]
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod ai;
mod blog;
mod chain;
mod chat;
mod cli;
mod config;
mod db;
mod realtime;
mod utils;
mod web;

use chat::ChatCore;
use cli::Cli;
use config::Config;
use realtime::SubscriptionHub;
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)?;
    cli.apply_to(&mut config);
    utils::logging::init_tracing(&config.logging);
    let config = Arc::new(config);

    info!("cryptorafts server starting up");

    // The database client is built once; a startup failure is fatal rather
    // than retried per request.
    let db_manager = Arc::new(db::DatabaseManager::new(&config.database).await?);
    db_manager.migrate().await?;

    if cli.migrate_only {
        info!("migrations applied, exiting");
        return Ok(());
    }

    let hub = Arc::new(SubscriptionHub::new(config.limits.room_event_buffer));
    let chat = ChatCore::new(db_manager.clone(), hub, config.limits.clone());

    let web_server = WebServer::new(config.clone(), chat, db_manager).await?;

    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });

    tokio::select! {
        _ = web_handle => {},
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        },
    }

    info!("cryptorafts server shutting down");
    Ok(())
}
