use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::errors::SplitsyncError;
use crate::core::models::{Notification, NotificationKind};
use crate::infrastructure::storage::Storage;

/// Payload pushed over the duplex channel as `receive-notification`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WireNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Notification> for WireNotification {
    fn from(notification: &Notification) -> Self {
        WireNotification {
            kind: notification.kind.as_str().to_string(),
            message: notification.message.clone(),
            settlement_id: notification.kind.settlement_id().map(String::from),
            timestamp: notification.created_at,
        }
    }
}

type ConnectionMap = HashMap<String, HashMap<String, mpsc::UnboundedSender<Notification>>>;

/// Maps a user id to the set of connections currently subscribed to that
/// user's channel and fans events out to them. The durable notification row
/// is written before any fan-out, so a user with no live connection catches
/// up from storage on reconnect; delivery itself is best effort and a failed
/// send is logged and the connection pruned, never surfaced to the caller.
pub struct NotificationRouter<S: Storage> {
    storage: Arc<S>,
    channels: RwLock<ConnectionMap>,
}

impl<S: Storage> NotificationRouter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        NotificationRouter {
            storage,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes a connection to a user's channel. Re-joining from the same
    /// connection replaces the previous sender, so a repeated `join` on
    /// reconnect is a no-op rather than a duplicate subscription.
    pub async fn join(
        &self,
        user_id: &str,
        connection_id: &str,
        sender: mpsc::UnboundedSender<Notification>,
    ) {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id.to_string())
            .or_default()
            .insert(connection_id.to_string(), sender);
        debug!(user_id, connection_id, "connection joined channel");
    }

    /// Unsubscribes a connection from every channel it sits on.
    pub async fn leave(&self, connection_id: &str) {
        let mut channels = self.channels.write().await;
        for connections in channels.values_mut() {
            connections.remove(connection_id);
        }
        channels.retain(|_, connections| !connections.is_empty());
        debug!(connection_id, "connection left");
    }

    /// Stores the notification, then delivers it to every live connection of
    /// the recipient. Events published for one user reach each connection in
    /// publish order; there is no ordering across users and no redelivery.
    pub async fn publish(
        &self,
        recipient_id: &str,
        kind: NotificationKind,
        message: String,
    ) -> Result<Notification, SplitsyncError> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            recipient_id: recipient_id.to_string(),
            kind,
            message,
            read: false,
            created_at: Utc::now(),
        };
        self.storage.save_notification(notification.clone()).await?;

        let mut channels = self.channels.write().await;
        if let Some(connections) = channels.get_mut(recipient_id) {
            connections.retain(|connection_id, sender| {
                if sender.send(notification.clone()).is_err() {
                    warn!(
                        recipient_id,
                        %connection_id, "dropping dead connection during fan-out"
                    );
                    false
                } else {
                    true
                }
            });
        }

        Ok(notification)
    }

    /// Number of live connections subscribed to a user's channel.
    pub async fn connection_count(&self, user_id: &str) -> usize {
        self.channels
            .read()
            .await
            .get(user_id)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}
