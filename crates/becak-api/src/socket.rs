//! WebSocket endpoint feeding the subscription registry.
//!
//! # Frames
//!
//! Client → server, tagged by `type`:
//!
//! ```json
//! { "type": "join", "channel": "driver:6f1c0d3e-2b8a-4c39-9d39-2a9b1b7e0f11" }
//! { "type": "leave", "channel": "driver:6f1c0d3e-2b8a-4c39-9d39-2a9b1b7e0f11" }
//! { "type": "update_status", "ride_id": "…", "status": "picked_up", "driver_id": "…" }
//! ```
//!
//! Server → client: acknowledgements tagged by `type` (`joined`, `left`,
//! `updated`, `error`), and notifications shaped
//! `{"channel": …, "event": …, "data": …}`.
//!
//! The connection is registered on upgrade, so it receives `broadcast`
//! notifications right away. Closing the socket from either side
//! disconnects it from the registry.

use std::sync::Arc;

use axum::{
  extract::{
    State, WebSocketUpgrade,
    ws::{Message, WebSocket},
  },
  response::Response,
};
use becak_core::{
  channel::Channel,
  geo::AddressResolver,
  lifecycle::RideStatus,
  profile::DriverProfiles,
  store::RideStore,
};
use becak_notify::{DeliveryError, EndpointId, Notification};
use futures::{SinkExt as _, StreamExt as _};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{error::ApiError, service::RideService};

/// Shared state of the `/ws` route.
pub struct SocketState<S, A> {
  pub service:         Arc<RideService<S, A>>,
  /// Capacity of each connection's notification queue.
  pub endpoint_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
  Join {
    channel: Channel,
  },
  Leave {
    channel: Channel,
  },
  UpdateStatus {
    ride_id:   Uuid,
    status:    RideStatus,
    driver_id: Option<Uuid>,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
  Joined {
    channel: Channel,
  },
  Left {
    channel: Channel,
  },
  Updated {
    ride_id:  Uuid,
    status:   RideStatus,
    applied:  bool,
    warnings: Vec<DeliveryError>,
  },
  Error {
    error: String,
    kind:  &'static str,
  },
}

impl From<ApiError> for ServerFrame {
  fn from(e: ApiError) -> Self { ServerFrame::Error { kind: e.kind(), error: e.to_string() } }
}

/// `GET /ws`
pub async fn handle<S, A>(ws: WebSocketUpgrade, State(state): State<Arc<SocketState<S, A>>>) -> Response
where
  S: RideStore + DriverProfiles + 'static,
  A: AddressResolver + 'static,
{
  ws.on_upgrade(move |socket| run(socket, state))
}

async fn run<S, A>(socket: WebSocket, state: Arc<SocketState<S, A>>)
where
  S: RideStore + DriverProfiles + 'static,
  A: AddressResolver + 'static,
{
  let registry = Arc::clone(state.service.registry());
  let buffer = state.endpoint_buffer.max(1);
  let (notify_tx, mut notifications) = mpsc::channel::<Notification>(buffer);
  let (reply_tx, mut replies) = mpsc::channel::<ServerFrame>(buffer);
  let endpoint = registry.connect(notify_tx).await;
  info!(%endpoint, "socket connected");

  let (mut sink, mut stream) = socket.split();

  let mut send_task = tokio::spawn(async move {
    loop {
      let encoded = tokio::select! {
        Some(notification) = notifications.recv() => serde_json::to_string(&notification),
        Some(reply) = replies.recv() => serde_json::to_string(&reply),
        else => break,
      };
      let text = match encoded {
        Ok(text) => text,
        Err(e) => {
          warn!(error = %e, "failed to encode frame");
          continue;
        }
      };
      if sink.send(Message::Text(text.into())).await.is_err() {
        break;
      }
    }
  });

  let service = Arc::clone(&state.service);
  let mut recv_task = tokio::spawn(async move {
    while let Some(Ok(message)) = stream.next().await {
      match message {
        Message::Text(text) => {
          let reply = handle_frame(&service, endpoint, text.as_str()).await;
          if reply_tx.send(reply).await.is_err() {
            break;
          }
        }
        Message::Close(_) => break,
        Message::Binary(_) => debug!(%endpoint, "ignoring binary frame"),
        Message::Ping(_) | Message::Pong(_) => {}
      }
    }
  });

  tokio::select! {
    _ = (&mut send_task) => recv_task.abort(),
    _ = (&mut recv_task) => send_task.abort(),
  }

  registry.disconnect(endpoint).await;
  info!(%endpoint, "socket disconnected");
}

/// Apply one client frame on behalf of `endpoint` and build the reply.
pub async fn handle_frame<S, A>(
  service: &RideService<S, A>,
  endpoint: EndpointId,
  text: &str,
) -> ServerFrame
where
  S: RideStore + DriverProfiles,
  A: AddressResolver,
{
  let frame = match serde_json::from_str::<ClientFrame>(text) {
    Ok(frame) => frame,
    Err(e) => return ApiError::BadRequest(e.to_string()).into(),
  };

  match frame {
    ClientFrame::Join { channel } => match service.registry().join(endpoint, channel).await {
      Ok(_) => {
        info!(%endpoint, %channel, "joined channel");
        ServerFrame::Joined { channel }
      }
      Err(e) => ApiError::BadRequest(e.to_string()).into(),
    },
    ClientFrame::Leave { channel } => match service.registry().leave(endpoint, channel).await {
      Ok(_) => {
        debug!(%endpoint, %channel, "left channel");
        ServerFrame::Left { channel }
      }
      Err(e) => ApiError::BadRequest(e.to_string()).into(),
    },
    ClientFrame::UpdateStatus { ride_id, status, driver_id } => {
      match service.update_status(ride_id, status, driver_id).await {
        Ok(committed) => ServerFrame::Updated {
          ride_id,
          status:   committed.value.ride.status,
          applied:  committed.value.applied,
          warnings: committed.delivery.failures,
        },
        Err(e) => ApiError::from(e).into(),
      }
    }
  }
}
