use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::handlers::AppService;
use crate::core::models::{Notification, NotificationKind};
use crate::core::pending::{PendingQueue, SettlementPrompt};
use crate::infrastructure::storage::Storage;
use crate::realtime::WireNotification;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum ClientMessage {
    Join {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ServerEvent<'a> {
    ReceiveNotification(&'a WireNotification),
    /// The head of the pending queue, or null once it drains.
    SettlementPrompt(Option<&'a SettlementPrompt>),
}

pub async fn ws_handler(State(service): State<AppService>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| client_session(service, socket))
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: ServerEvent<'_>,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(&event).unwrap_or_default();
    sink.send(Message::Text(json.into())).await
}

/// One duplex connection. The client joins with its user id, then receives
/// every published notification in order plus a `settlement-prompt` event
/// whenever the head of its pending queue changes.
async fn client_session(service: AppService, socket: WebSocket) {
    let connection_id = Uuid::new_v4().to_string();
    let router = service.router();
    let (mut sink, mut stream) = socket.split();

    let Some(user_id) = wait_for_join(&mut sink, &mut stream).await else {
        return;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
    router.join(&user_id, &connection_id, tx.clone()).await;
    debug!(%user_id, %connection_id, "client session started");

    // Durable catch-up: rebuild the prompt queue from unread
    // offline-settlement notifications, oldest first.
    let mut queue = PendingQueue::new();
    match service.storage().get_notifications(&user_id).await {
        Ok(notifications) => {
            for notification in notifications.iter().rev().filter(|n| !n.read) {
                queue.push(notification);
            }
        }
        Err(e) => warn!(%user_id, error = %e, "failed to seed pending queue"),
    }
    if queue.head().is_some()
        && send_event(&mut sink, ServerEvent::SettlementPrompt(queue.head()))
            .await
            .is_err()
    {
        router.leave(&connection_id).await;
        return;
    }

    loop {
        tokio::select! {
            notification = rx.recv() => {
                let Some(notification) = notification else { break };
                let wire = WireNotification::from(&notification);
                if send_event(&mut sink, ServerEvent::ReceiveNotification(&wire)).await.is_err() {
                    break;
                }
                let head_changed = match &notification.kind {
                    NotificationKind::OfflineSettlement { .. } => queue.push(&notification),
                    NotificationKind::SettlementResolved { settlement_id, .. } => {
                        queue.resolve(settlement_id)
                    }
                    NotificationKind::Generic => false,
                };
                if head_changed
                    && send_event(&mut sink, ServerEvent::SettlementPrompt(queue.head()))
                        .await
                        .is_err()
                {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        // Re-joining the channel already held is a no-op.
                        if let Ok(ClientMessage::Join { user_id: joined }) =
                            serde_json::from_str::<ClientMessage>(&text)
                        {
                            if joined == user_id {
                                router.join(&user_id, &connection_id, tx.clone()).await;
                            } else {
                                warn!(%user_id, %joined, "join for a different user ignored");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(%user_id, error = %e, "websocket receive error");
                        break;
                    }
                }
            }
        }
    }

    router.leave(&connection_id).await;
    debug!(%user_id, %connection_id, "client session closed");
}

/// Reads frames until the client identifies itself with a join event.
async fn wait_for_join(
    sink: &mut SplitSink<WebSocket, Message>,
    stream: &mut SplitStream<WebSocket>,
) -> Option<String> {
    loop {
        match stream.next().await? {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Join { user_id }) => return Some(user_id),
                Err(e) => debug!(error = %e, "ignoring frame before join"),
            },
            Ok(Message::Ping(payload)) => {
                if sink.send(Message::Pong(payload)).await.is_err() {
                    return None;
                }
            }
            Ok(Message::Close(_)) => return None,
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "websocket error before join");
                return None;
            }
        }
    }
}
