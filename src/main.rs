//! Message service binary: loads configuration, opens the configured
//! backend and serves the HTTP API until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use eyre::WrapErr;
use message_service::{
    config::{ServiceConfig, StorageBackend},
    http::{AppState, router},
    message::{
        adapters::{
            amqp::AmqpMessagePublisher,
            key_value::KeyValueMessageRepository,
            memory::InMemoryKeyValueStore,
            postgres::{PostgresMessageRepository, build_pool},
            redis_store::RedisKeyValueStore,
        },
        ports::MessageRepository,
        services::MessageService,
    },
    telemetry,
};
use mockable::DefaultClock;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = ServiceConfig::from_env().wrap_err("failed to load configuration")?;
    telemetry::init_tracing()?;
    info!(?config, "starting message service");

    let repository = open_repository(&config).await?;
    let mut service = MessageService::new(repository, Arc::new(DefaultClock))
        .with_deadline(config.request_timeout);

    if config.storage_backend == StorageBackend::Memory {
        warn!("in-memory backend selected; messages are not persisted");
    }
    if config.storage_backend.publishes_created_messages() {
        let publisher =
            AmqpMessagePublisher::connect(&config.rabbitmq_url, config.message_queue.as_str())
                .await
                .wrap_err("failed to connect to the message broker")?;
        info!(queue = publisher.queue(), "publishing created messages");
        service = service.with_publisher(Arc::new(publisher));
    } else {
        info!(backend = %config.storage_backend, "created messages are not published");
    }

    let app = router(AppState::new(service, config.page_size));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;
    info!("message service stopped");
    Ok(())
}

async fn open_repository(config: &ServiceConfig) -> eyre::Result<Arc<dyn MessageRepository>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url()
                .wrap_err("invalid PostgreSQL settings")?;
            let pool_size = config.database_pool_size;
            let statement_timeout = config.statement_timeout;
            let pool =
                tokio::task::spawn_blocking(move || build_pool(&url, pool_size, statement_timeout))
                    .await
                    .wrap_err("connection pool task failed")?
                    .wrap_err("failed to connect to PostgreSQL")?;
            let repository = PostgresMessageRepository::new(pool)
                .with_self_healing(config.database_self_heal);
            repository
                .migrate()
                .await
                .wrap_err("failed to apply message schema")?;
            info!(address = %config.postgres_address, "using PostgreSQL backend");
            Ok(Arc::new(repository))
        }
        StorageBackend::Redis => {
            let store = RedisKeyValueStore::connect(&config.redis_url())
                .await
                .wrap_err("failed to connect to Redis")?;
            info!(address = %config.redis_address, "using Redis backend");
            Ok(Arc::new(KeyValueMessageRepository::new(store)))
        }
        StorageBackend::Memory => Ok(Arc::new(KeyValueMessageRepository::new(
            InMemoryKeyValueStore::new(),
        ))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
