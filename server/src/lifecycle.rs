//! Application lifecycle management and graceful shutdown.
//!
//! 1. **Startup**: connect PostgreSQL and Redis, run migrations, spawn the
//!    pub/sub relay, prepare the search index and bind the listener
//! 2. **Runtime**: serve HTTP and WebSocket traffic
//! 3. **Shutdown**: on Ctrl+C or SIGTERM stop accepting connections,
//!    broadcast shutdown to background tasks and wait for them with a timeout
//!
//! ```rust,ignore
//! let app = Application::build(Config::from_env()).await?;
//! app.run().await?;
//! ```

use crate::auth::{RedisHealth, RedisSessionStore};
use crate::config::Config;
use crate::metrics;
use crate::realtime::{RedisPublisher, RedisRelay};
use crate::server::{AppState, Repositories, build_router};
use hotel_booking_core::SystemClock;
use hotel_booking_core::providers::{HealthCheck, SearchIndex};
use hotel_booking_postgres::{
    PoolSettings, PostgresBookingRepository, PostgresChatRepository, PostgresHealth,
    PostgresHotelRepository, PostgresNotificationRepository, PostgresReviewRepository,
    PostgresRoomRepository, PostgresUserRepository,
};
use hotel_booking_search::{ElasticsearchIndex, ElasticsearchSettings, NoopSearchIndex};
use hotel_booking_web::TopicBroadcaster;
use redis::aio::ConnectionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Failure while bringing the application up.
#[derive(Debug, Error)]
pub enum StartupError {
    /// PostgreSQL unreachable
    #[error("failed to connect to PostgreSQL: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed
    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Redis unreachable
    #[error("failed to connect to Redis: {0}")]
    Redis(#[from] redis::RedisError),

    /// Prometheus recorder
    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// Listener bind or accept failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running application with its background tasks.
pub struct Application {
    listener: TcpListener,
    app: axum::Router,
    background: Vec<(&'static str, JoinHandle<()>)>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_timeout: Duration,
}

impl Application {
    /// Connect every backing service and assemble the router.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if PostgreSQL or Redis are unreachable, the
    /// migrations fail or the listener cannot bind. An unreachable search
    /// backend is logged and tolerated.
    pub async fn build(config: Config) -> Result<Self, StartupError> {
        info!("Connecting to PostgreSQL");
        let pool = hotel_booking_postgres::connect(&PoolSettings {
            url: config.postgres.url.clone(),
            max_connections: config.postgres.max_connections,
            min_connections: config.postgres.min_connections,
            connect_timeout: Duration::from_secs(config.postgres.connect_timeout),
        })
        .await?;
        hotel_booking_postgres::run_migrations(&pool).await?;
        info!("✓ PostgreSQL ready");

        let repos = Repositories {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            hotels: Arc::new(PostgresHotelRepository::new(pool.clone())),
            rooms: Arc::new(PostgresRoomRepository::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepository::new(pool.clone())),
            reviews: Arc::new(PostgresReviewRepository::new(pool.clone())),
            chat: Arc::new(PostgresChatRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        };

        info!("Connecting to Redis");
        let redis_client = redis::Client::open(config.redis.url.as_str())?;
        let redis_conn = ConnectionManager::new(redis_client.clone()).await?;
        info!("✓ Redis ready");

        let (shutdown_tx, _) = broadcast::channel(1);
        let broadcaster = TopicBroadcaster::new();
        let relay = RedisRelay::new(redis_client, config.redis.channel_prefix.clone(), broadcaster.clone())
            .spawn(shutdown_tx.subscribe());

        let mut health_checks: Vec<Arc<dyn HealthCheck>> = vec![
            Arc::new(PostgresHealth::new(pool)),
            Arc::new(RedisHealth::new(redis_conn.clone())),
        ];

        let search: Arc<dyn SearchIndex> = if config.search.enabled {
            let index = Arc::new(ElasticsearchIndex::new(ElasticsearchSettings {
                url: config.search.url.clone(),
                index: config.search.index.clone(),
                username: config.search.username.clone(),
                password: config.search.password.clone(),
            }));
            match index.ensure_index().await {
                Ok(()) => info!(index = %config.search.index, "✓ Search index ready"),
                Err(e) => warn!(error = %e, "Search index unavailable, continuing without it"),
            }
            health_checks.push(index.clone());
            index
        } else {
            info!("Search disabled, using no-op index");
            Arc::new(NoopSearchIndex)
        };

        let prometheus = metrics::install_recorder()?;

        let state = AppState::new(
            repos,
            Arc::new(RedisSessionStore::new(redis_conn.clone())),
            search,
            Arc::new(RedisPublisher::new(redis_conn, config.redis.channel_prefix.clone())),
            broadcaster,
            Arc::new(SystemClock),
        )
        .with_health_checks(health_checks)
        .with_session_ttl(config.session_ttl())
        .with_metrics(prometheus);

        let app = build_router(state, &config.server.cors_allowed_origins);

        let address = config.bind_address();
        let listener = TcpListener::bind(&address).await?;
        info!(address = %address, "✓ Listener bound");

        Ok(Self {
            listener,
            app,
            background: vec![("redis_relay", relay)],
            shutdown_tx,
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the socket has no local address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Io`] if the server fails.
    pub async fn run(self) -> Result<(), StartupError> {
        info!("HTTP server listening for requests");
        axum::serve(
            self.listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("HTTP server stopped, initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(());

        for (name, handle) in self.background {
            match tokio::time::timeout(self.shutdown_timeout, handle).await {
                Ok(Ok(())) => info!(task = name, "Background task stopped gracefully"),
                Ok(Err(e)) => warn!(task = name, error = %e, "Background task failed"),
                Err(_) => warn!(task = name, "Background task shutdown timed out"),
            }
        }

        info!("Graceful shutdown complete");
        Ok(())
    }
}

/// Wait for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the failure is logged and that signal
/// is never awaited.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
}
