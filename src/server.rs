//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, tier and lock backend selection, coherence
//! task spawning, and Axum server lifecycle.

use crate::application::services::{
    CoherenceSubscriber, RedirectResolver, StampedeGuard, spawn_coherence_subscriber,
};
use crate::config::Config;
use crate::infrastructure::backoff::Backoff;
use crate::infrastructure::cache::{CacheService, LocalCache, NullCache, RedisCache, SharedCache};
use crate::infrastructure::coherence::RedisCoherenceListener;
use crate::infrastructure::lock::{LockService, MemoryLockService, RedisLockService};
use crate::infrastructure::persistence::PgRedirectStore;
use crate::metrics::{CacheMetrics, install_prometheus_recorder};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Backends chosen at startup depending on Redis availability.
struct Backends {
    cache: Arc<dyn CacheService>,
    locks: Arc<dyn LockService>,
    redis: RedisStatus,
}

enum RedisStatus {
    Connected(String),
    /// Configured but unreachable at startup; retried in the background.
    Pending(String),
    Disabled,
}

fn redis_locks(redis: &RedisCache, config: &Config) -> RedisLockService {
    let settings = config.guard_settings();
    RedisLockService::new(
        redis.connection(),
        settings.poll_interval,
        settings.backend_timeout,
    )
}

async fn select_backends(config: &Config) -> Backends {
    let fallback_locks = Arc::new(MemoryLockService::new(config.guard_settings().poll_interval));

    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Shared cache disabled (NullCache), in-process locks");
        return Backends {
            cache: Arc::new(NullCache::new()),
            locks: fallback_locks,
            redis: RedisStatus::Disabled,
        };
    };

    match RedisCache::connect(redis_url).await {
        Ok(redis) => {
            tracing::info!("Shared cache and locks enabled (Redis)");
            Backends {
                locks: Arc::new(redis_locks(&redis, config)),
                cache: Arc::new(redis),
                redis: RedisStatus::Connected(redis_url.clone()),
            }
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to Redis: {}. Using NullCache and in-process locks until it is reachable.",
                e
            );
            Backends {
                cache: Arc::new(NullCache::new()),
                locks: fallback_locks,
                redis: RedisStatus::Pending(redis_url.clone()),
            }
        }
    }
}

/// Starts the coherence worker and its Pub/Sub listener.
fn start_coherence(
    redis_url: String,
    config: &Config,
    local: Arc<LocalCache>,
    shared: Arc<SharedCache>,
) {
    let subscriber = Arc::new(CoherenceSubscriber::new(local, shared));
    let (event_tx, _subscriber_task) =
        spawn_coherence_subscriber(subscriber, config.coherence_queue_capacity);
    RedisCoherenceListener::new(redis_url, config.coherence_channel.clone(), event_tx).start();
    tracing::info!(channel = %config.coherence_channel, "Coherence listener started");
}

/// Retries Redis after a failed startup connect, then moves L2, locks and
/// coherence over to it.
fn spawn_redis_recovery(
    redis_url: String,
    config: Config,
    local: Arc<LocalCache>,
    shared: Arc<SharedCache>,
    resolver: Arc<RedirectResolver>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = Backoff::new();

        loop {
            let delay = backoff.next_delay();
            tokio::time::sleep(delay).await;

            match RedisCache::connect(&redis_url).await {
                Ok(redis) => {
                    resolver
                        .guard()
                        .replace_locks(Arc::new(redis_locks(&redis, &config)));
                    shared.replace_backend(Arc::new(redis));
                    start_coherence(redis_url, &config, local, shared);
                    tracing::info!("Redis reachable, shared cache and locks enabled");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backoff_secs = delay.as_secs(),
                        "Redis still unreachable"
                    );
                }
            }
        }
    })
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis tier and locks (or NullCache + in-process locks, upgraded in the
///   background once a configured Redis becomes reachable)
/// - L1, L2, stampede guard and resolver
/// - Coherence subscriber and its Pub/Sub listener
/// - Prometheus recorder
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let metrics_handle = match install_prometheus_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Metrics recorder not installed: {}", e);
            None
        }
    };

    let settings = config.cache_settings();
    let metrics = Arc::new(CacheMetrics::new());
    let backends = select_backends(&config).await;

    let local = Arc::new(LocalCache::new(
        settings.l1_capacity,
        settings.l1_ttl,
        metrics.clone(),
    ));
    let shared = Arc::new(SharedCache::new(
        backends.cache,
        settings.l2_ttl,
        settings.l2_timeout,
        metrics.clone(),
    ));
    let guard = StampedeGuard::new(backends.locks, config.guard_settings(), metrics.clone());
    let store = Arc::new(PgRedirectStore::new(Arc::new(pool)));

    let resolver = Arc::new(RedirectResolver::new(
        local.clone(),
        shared.clone(),
        guard,
        store,
        metrics,
    ));

    match backends.redis {
        RedisStatus::Connected(redis_url) => {
            start_coherence(redis_url, &config, local, shared.clone());
        }
        RedisStatus::Pending(redis_url) => {
            tracing::info!("Coherence deferred until Redis is reachable");
            spawn_redis_recovery(
                redis_url,
                config.clone(),
                local,
                shared.clone(),
                resolver.clone(),
            );
        }
        RedisStatus::Disabled => {
            tracing::info!("Coherence disabled (no Redis), tiers fill on read only");
        }
    }

    let state = AppState::new(resolver, shared, metrics_handle);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
