mod config;
mod handlers;
mod models;
mod server;
mod services;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use config::Config;
use server::create_router;
use services::{AIService, GeminiService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting food analysis gateway...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Configuration error: {:#}", e);
            return Err(e);
        }
    };

    let gemini = Arc::new(GeminiService::new(config.gemini.clone())?);
    let ai = gemini as Arc<dyn AIService>;
    log::info!("✅ Gemini service initialized with model: {}", config.gemini.model);

    let app = create_router(&config, ai);
    log::info!("🌐 CORS origins: {:?}", config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    log::info!("🎉 Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("🛑 Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for shutdown signal: {}", e);
    }
}
