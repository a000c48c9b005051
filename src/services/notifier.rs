use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors that can occur while publishing
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Real-time delivery of events to connected clients
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), NotifyError>;
}

/// Redis pub/sub publisher
///
/// Channels are `{channel_prefix}{topic}`.
pub struct RedisNotifier {
    redis: Arc<Mutex<ConnectionManager>>,
    channel_prefix: String,
}

impl RedisNotifier {
    pub async fn new(redis_url: &str, channel_prefix: impl Into<String>) -> Result<Self, NotifyError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Arc::new(Mutex::new(redis)),
            channel_prefix: channel_prefix.into(),
        })
    }

    fn channel(&self, topic: &str) -> String {
        format!("{}{}", self.channel_prefix, topic)
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), NotifyError> {
        let message = serde_json::to_string(payload)?;
        let channel = self.channel(topic);

        let mut conn = self.redis.lock().await;
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(&channel)
            .arg(message)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!(channel = %channel, receivers, "Published notification");
        Ok(())
    }
}

/// Fallback when no broker is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), NotifyError> {
        tracing::info!(topic, payload = %payload, "Notification");
        Ok(())
    }
}

/// Keeps every published message in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), NotifyError> {
        self.published
            .lock()
            .await
            .push((topic.to_string(), payload.clone()));
        Ok(())
    }
}
