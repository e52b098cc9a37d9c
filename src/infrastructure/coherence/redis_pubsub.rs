//! Redis Pub/Sub transport for "record created" notifications.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

use crate::domain::record_created::RecordCreated;
use crate::infrastructure::backoff::Backoff;
use crate::infrastructure::cache::CacheError;
use crate::infrastructure::coherence::CoherencePublisher;

/// Subscribes to the coherence channel and feeds decoded events to a queue.
///
/// ## How It Works
///
/// 1. Subscribe to the configured channel (default `redirect:created`)
/// 2. Decode each payload into a [`RecordCreated`]
/// 3. `try_send` it to the subscriber queue; a full queue drops the event
/// 4. Reconnect with exponential backoff if the connection is lost; the
///    backoff starts over after every successful subscribe
///
/// Messages published while disconnected are lost; the resolver falls back
/// to the store for any key that was not warmed.
pub struct RedisCoherenceListener {
    redis_url: String,
    channel: String,
    tx: mpsc::Sender<RecordCreated>,
}

impl RedisCoherenceListener {
    pub fn new(redis_url: String, channel: String, tx: mpsc::Sender<RecordCreated>) -> Self {
        Self {
            redis_url,
            channel,
            tx,
        }
    }

    /// Spawns the listener loop. It ends when the subscriber queue closes.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut backoff = Backoff::new();

            loop {
                match self.run(&mut backoff).await {
                    Ok(()) => {
                        tracing::info!(channel = %self.channel, "Coherence queue closed, listener exiting");
                        return;
                    }
                    Err(e) => {
                        let delay = backoff.next_delay();
                        tracing::warn!(
                            channel = %self.channel,
                            error = %e,
                            backoff_secs = delay.as_secs(),
                            "Coherence listener disconnected, reconnecting..."
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        })
    }

    /// Returns `Ok(())` only when the downstream queue is closed.
    async fn run(&self, backoff: &mut Backoff) -> Result<(), CacheError> {
        let client = redis::Client::open(self.redis_url.as_str())
            .map_err(|e| CacheError::ConnectionError(format!("failed to create Redis client: {e}")))?;

        let mut pubsub = client.get_async_pubsub().await.map_err(|e| {
            CacheError::ConnectionError(format!("failed to get pub/sub connection: {e}"))
        })?;

        pubsub
            .subscribe(self.channel.as_str())
            .await
            .map_err(|e| CacheError::ConnectionError(format!("failed to subscribe: {e}")))?;

        tracing::info!(channel = %self.channel, "Subscribed to coherence channel");
        backoff.reset();

        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let payload = match msg.get_payload::<String>() {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(error = %e, "non-text coherence payload dropped");
                    continue;
                }
            };

            if forward(&self.tx, &payload).is_closed() {
                return Ok(());
            }
        }

        Err(CacheError::ConnectionError(
            "pub/sub connection closed".to_string(),
        ))
    }
}

/// Result of handing one payload to the subscriber queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Forwarded {
    Queued,
    Malformed,
    Dropped,
    Closed,
}

impl Forwarded {
    fn is_closed(self) -> bool {
        self == Forwarded::Closed
    }
}

/// Decodes `payload` and enqueues it without waiting.
pub(crate) fn forward(tx: &mpsc::Sender<RecordCreated>, payload: &str) -> Forwarded {
    let event = match RecordCreated::from_payload(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed coherence payload dropped");
            return Forwarded::Malformed;
        }
    };

    match tx.try_send(event) {
        Ok(()) => Forwarded::Queued,
        Err(TrySendError::Full(event)) => {
            tracing::warn!(event_id = %event.event_id, "coherence queue full, event dropped");
            Forwarded::Dropped
        }
        Err(TrySendError::Closed(_)) => Forwarded::Closed,
    }
}

/// Publishes "record created" notifications for other instances.
///
/// Called by the create side after the store write commits.
pub struct RedisCoherencePublisher {
    client: ConnectionManager,
    channel: String,
}

impl RedisCoherencePublisher {
    pub fn new(client: ConnectionManager, channel: String) -> Self {
        Self { client, channel }
    }
}

#[async_trait]
impl CoherencePublisher for RedisCoherencePublisher {
    async fn publish(&self, event: &RecordCreated) -> Result<usize, CacheError> {
        let payload = event
            .to_payload()
            .map_err(|e| CacheError::OperationError(format!("encode event: {e}")))?;
        let mut conn = self.client.clone();

        let receivers = conn
            .publish::<_, _, usize>(self.channel.as_str(), payload)
            .await
            .map_err(|e| CacheError::OperationError(format!("failed to publish: {e}")))?;

        tracing::debug!(
            event_id = %event.event_id,
            short_code = %event.short_code,
            receivers,
            "published coherence event"
        );
        Ok(receivers)
    }
}
