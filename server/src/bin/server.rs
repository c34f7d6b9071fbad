//! Hotel booking server.
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL, Redis and Elasticsearch
//! docker compose up -d
//!
//! # Run server
//! cargo run --bin server
//! ```

use hotel_booking::{Application, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hotel_booking=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hotel booking server...");

    let config = Config::from_env();
    tracing::info!(
        postgres_max_connections = config.postgres.max_connections,
        search_enabled = config.search.enabled,
        address = %config.bind_address(),
        "Configuration loaded"
    );

    let app = Application::build(config).await?;
    tracing::info!("Press Ctrl+C to shutdown");
    app.run().await?;

    Ok(())
}
