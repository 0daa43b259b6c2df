//! desk-server - Support Desk MCP server binary.

use desk_core::Database;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use desk_server::{config::Config, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("desk_server=info".parse()?))
        .init();

    info!("desk-server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Using database at {:?}", config.database_path);

    let db = Database::open_path(&config.database_path)?;
    db.init_schema()?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, db);
    let router = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down...");
}
