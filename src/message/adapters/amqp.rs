//! AMQP implementation of the `MessagePublisher` port using `lapin`.
//!
//! Projections are published as JSON to a durable queue through the default
//! exchange, with the queue name as routing key. The queue is declared before
//! every publish, so a queue deleted on the broker is recreated instead of the
//! message being dropped as unroutable. The channel runs in confirm mode, so
//! `publish` returns only after the broker acknowledged the message.

use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, options::*, types::FieldTable,
};
use std::future::Future;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::message::{
    domain::MessageProjection,
    ports::publisher::{MessagePublisher, PublishError, PublishResult},
};

/// Persistent delivery mode.
const PERSISTENT: u8 = 2;

#[derive(Debug, Error)]
#[error("broker rejected the message")]
struct NegativeAcknowledgement;

#[derive(Debug, Error)]
#[error("connection to the broker is closed")]
struct ConnectionClosed;

/// Broker operations one publish needs from an open channel.
#[async_trait]
trait QueueChannel: Send + Sync {
    /// Reports whether the channel can still carry commands.
    fn is_open(&self) -> bool;

    /// Declares `queue` as durable. Redeclaring an existing queue is a no-op.
    async fn declare_durable(&self, queue: &str) -> PublishResult<()>;

    /// Publishes `payload` to `queue` and returns whether the broker acked it.
    async fn publish_confirmed(&self, queue: &str, payload: &[u8]) -> PublishResult<bool>;
}

#[async_trait]
impl QueueChannel for Channel {
    fn is_open(&self) -> bool {
        self.status().connected()
    }

    async fn declare_durable(&self, queue: &str) -> PublishResult<()> {
        self.queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map(|_declared| ())
        .map_err(|err| PublishError::declare(queue, err))
    }

    async fn publish_confirmed(&self, queue: &str, payload: &[u8]) -> PublishResult<bool> {
        let confirmation = self
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT),
            )
            .await
            .map_err(|err| PublishError::publish(queue, err))?
            .await
            .map_err(|err| PublishError::publish(queue, err))?;
        Ok(!confirmation.is_nack())
    }
}

/// Declares the queue, then publishes and checks the confirmation.
async fn declare_and_publish(
    channel: &impl QueueChannel,
    queue: &str,
    payload: &[u8],
) -> PublishResult<()> {
    channel.declare_durable(queue).await?;
    if channel.publish_confirmed(queue, payload).await? {
        Ok(())
    } else {
        warn!(queue, "broker nacked projection");
        Err(PublishError::publish(queue, NegativeAcknowledgement))
    }
}

/// Shared channel that is replaced once it closes.
struct ChannelSlot<C> {
    current: RwLock<C>,
}

impl<C: QueueChannel + Clone> ChannelSlot<C> {
    /// Returns the open channel, reopening it with `reopen` if it closed.
    ///
    /// Only one caller reopens; callers that queued behind it reuse its
    /// channel.
    async fn get_or_reopen<F, Fut>(&self, reopen: F) -> PublishResult<C>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = PublishResult<C>> + Send,
    {
        {
            let current = self.current.read().await;
            if current.is_open() {
                return Ok(current.clone());
            }
        }

        let mut slot = self.current.write().await;
        if slot.is_open() {
            return Ok(slot.clone());
        }
        let reopened = reopen().await?;
        *slot = reopened.clone();
        Ok(reopened)
    }
}

/// [`MessagePublisher`] backed by an AMQP 0-9-1 broker such as `RabbitMQ`.
///
/// Holds one connection and one channel. A channel closed by the broker is
/// reopened on the next publish.
pub struct AmqpMessagePublisher {
    connection: Connection,
    channel: ChannelSlot<Channel>,
    queue: String,
}

impl std::fmt::Debug for AmqpMessagePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmqpMessagePublisher")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl AmqpMessagePublisher {
    /// Connects to the broker at `url` and declares `queue` as durable.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Connection`] if the broker cannot be reached
    /// and [`PublishError::Declare`] if the queue cannot be declared.
    pub async fn connect(url: &str, queue: impl Into<String>) -> PublishResult<Self> {
        let queue_name = queue.into();
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(PublishError::connection)?;
        let channel = open_channel(&connection).await?;
        channel.declare_durable(&queue_name).await?;

        Ok(Self {
            connection,
            channel: ChannelSlot {
                current: RwLock::new(channel),
            },
            queue: queue_name,
        })
    }

    /// Returns the name of the target queue.
    #[must_use]
    pub fn queue(&self) -> &str {
        &self.queue
    }

    async fn channel(&self) -> PublishResult<Channel> {
        if !self.connection.status().connected() {
            return Err(PublishError::connection(ConnectionClosed));
        }
        self.channel
            .get_or_reopen(|| async {
                debug!(queue = %self.queue, "reopening closed channel");
                open_channel(&self.connection).await
            })
            .await
    }
}

async fn open_channel(connection: &Connection) -> PublishResult<Channel> {
    let channel = connection
        .create_channel()
        .await
        .map_err(PublishError::connection)?;
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await
        .map_err(PublishError::connection)?;
    Ok(channel)
}

#[async_trait]
impl MessagePublisher for AmqpMessagePublisher {
    async fn publish(&self, projection: &MessageProjection) -> PublishResult<()> {
        let payload = serde_json::to_vec(projection).map_err(PublishError::serialization)?;
        let channel = self.channel().await?;
        declare_and_publish(&channel, &self.queue, &payload).await
    }
}
