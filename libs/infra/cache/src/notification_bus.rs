use std::collections::HashMap;
use std::sync::Mutex;

use futures::StreamExt;
use logflux_models::ErrorNotification;
use redis::AsyncCommands;
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use crate::errors::CacheError;
use crate::redis_client::RedisSubstrate;

const LOCAL_CHANNEL_CAPACITY: usize = 256;

/// Per-process fan-out for one project's notifications: every SSE
/// subscriber on this gateway instance gets its own `Receiver` cloned from
/// one `Sender`, keyed per project rather than a single global channel.
pub struct NotificationHub {
    channels: Mutex<HashMap<String, broadcast::Sender<ErrorNotification>>>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn subscribe(&self, project_id: &str) -> broadcast::Receiver<ErrorNotification> {
        let mut channels = self.channels.lock().expect("notification hub mutex poisoned");
        channels
            .entry(project_id.to_string())
            .or_insert_with(|| broadcast::channel(LOCAL_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    fn publish_local(&self, project_id: &str, notification: ErrorNotification) {
        let channels = self.channels.lock().expect("notification hub mutex poisoned");
        if let Some(sender) = channels.get(project_id) {
            // No subscribers is not an error: it just means nobody has an
            // open SSE stream for this project right now.
            let _ = sender.send(notification);
        }
    }
}

/// C2/C3's notification bus: publishes to Redis so every gateway instance
/// observes every project's error notifications, and runs one background
/// subscriber per gateway process that re-broadcasts into the local
/// per-project `NotificationHub` for SSE delivery.
pub struct NotificationBus {
    redis: RedisSubstrate,
}

impl NotificationBus {
    pub fn new(redis: RedisSubstrate) -> Self {
        Self { redis }
    }

    #[instrument(skip(self, notification))]
    pub async fn publish(&self, notification: &ErrorNotification) -> Result<(), CacheError> {
        let channel = ErrorNotification::channel_name(&notification.project_id);
        let payload = serde_json::to_vec(notification).map_err(|e| CacheError::Decode(e.to_string()))?;
        let mut conn = self.redis.connection();
        let _: i64 = conn.publish(channel, payload).await.map_err(CacheError::from)?;
        Ok(())
    }

    /// Runs until the connection drops; callers spawn this once per
    /// gateway process and let the supervising task restart it on error.
    pub async fn run_local_fanout(&self, hub: &NotificationHub) -> Result<(), CacheError> {
        let connection = self.redis.client().get_async_connection().await.map_err(CacheError::from)?;
        let mut pubsub = connection.into_pubsub();
        pubsub.psubscribe("notifications:errors:*").await.map_err(CacheError::from)?;

        let mut stream = pubsub.on_message();
        while let Some(msg) = stream.next().await {
            let channel: String = msg.get_channel_name().to_string();
            let Some(project_id) = channel.strip_prefix("notifications:errors:") else {
                continue;
            };
            let payload: Vec<u8> = match msg.get_payload() {
                Ok(p) => p,
                Err(err) => {
                    warn!(error = %err, "failed to read notification payload");
                    continue;
                }
            };
            match serde_json::from_slice::<ErrorNotification>(&payload) {
                Ok(notification) => hub.publish_local(project_id, notification),
                Err(err) => warn!(error = %err, "failed to decode notification payload"),
            }
        }
        Ok(())
    }
}
