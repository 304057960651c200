//! # Inkwell API Server
//!
//! Blog posts with like, dislike and view counters behind an admission
//! pipeline of CORS, input sanitizing, rate limiting and API key checks.

use actix_web::HttpServer;
use inkwell_core::ports::TaskQueue;

mod app;
#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);

    let state = AppState::build(config).await.inspect_err(|e| {
        tracing::error!(error = %e, "Failed to initialize application state");
    })?;

    #[cfg(feature = "scheduler")]
    let mut scheduler = start_scheduler(&state).await?;

    tracing::info!("Starting Inkwell API Server on {}:{}", host, port);

    let server_state = state.clone();
    HttpServer::new(move || app::build_app(server_state.clone()))
        .bind((host.as_str(), port))?
        .run()
        .await?;

    #[cfg(feature = "scheduler")]
    scheduler.shutdown().await?;

    let stats = state.view_queue.stats();
    tracing::info!(
        pending = stats.pending,
        completed = stats.completed,
        failed = stats.failed,
        "Server stopped"
    );
    Ok(())
}

#[cfg(feature = "scheduler")]
async fn start_scheduler(state: &AppState) -> anyhow::Result<background::Scheduler> {
    use std::sync::Arc;

    use inkwell_core::ports::RateLimiter;

    let scheduler = background::Scheduler::new(state.config.scheduler_enabled).await?;

    let limiters: Vec<(&'static str, Arc<dyn RateLimiter>)> = vec![
        ("admin", state.admin_limiter.clone()),
        ("public", state.public_limiter.clone()),
    ];
    background::register_rate_limit_sweep(&scheduler, limiters, state.config.rate_limits.window)
        .await?;
    scheduler.start().await?;

    Ok(scheduler)
}
