use actix_web::middleware::from_fn;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use gatekeep_server::config::DEVELOPMENT_SESSION_SECRET;
use gatekeep_server::routes::{self, not_found};
use gatekeep_server::session::session_middleware;
use gatekeep_server::{AppState, Settings, Variant};
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new().context("Failed to load configuration")?;
    info!("Configuration loaded successfully (environment: {})", config.environment);

    if config.session.secret == DEVELOPMENT_SESSION_SECRET && !config.is_development() {
        warn!("Using the built-in session secret outside development; set APP_SESSION__SECRET");
    }
    if config.security.variant == Variant::Vulnerable {
        warn!("Running the SQL-injectable credential store; do not expose this server");
    }

    // Initialize application state
    let state = AppState::new(config.clone())
        .await
        .context("Failed to initialize application state")?;
    if let Some(status) = state.database().map(|db| db.pool_status()) {
        info!(
            "Database pool ready ({} open, {} idle, max {})",
            status.total_connections, status.idle_connections, config.database.max_connections
        );
    }
    let state = web::Data::new(state);

    // Sweep expired sessions in the background
    let sweep_state = state.clone();
    let sweep_interval = Duration::from_secs(config.session.cleanup_interval_secs.max(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_interval).await;
            sweep_state.sessions.sweep_expired().await;
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;

    info!(
        "Server running at http://{}:{} ({} variant)",
        config.server.host, config.server.port, config.security.variant
    );

    let app_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(from_fn(session_middleware))
            .configure(routes::configure)
            .default_service(web::to(not_found))
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .context("HTTP server terminated with an error")?;

    state.shutdown().await?;
    info!("Server shut down");

    Ok(())
}
