//! Publishing events to channel members.
//!
//! Delivery is at-most-once and best-effort. Every member send is attempted
//! concurrently and bounded by the dispatcher's send timeout; failures are
//! collected into the [`DeliveryReport`] and never returned as errors.

use std::{sync::Arc, time::Duration};

use becak_core::{channel::Channel, event::Event};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
  notification::{Notification, NotificationKind, route},
  registry::{Endpoint, EndpointId, SubscriptionRegistry},
};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryFailure {
  /// The endpoint's queue was dropped; it has been pruned from the registry.
  #[error("endpoint closed")]
  Closed,
  /// The endpoint's queue stayed full for the whole send timeout.
  #[error("send timed out")]
  TimedOut,
}

/// A notification one member did not receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{event} to endpoint {endpoint} on {channel}: {reason}")]
pub struct DeliveryError {
  pub endpoint: EndpointId,
  pub channel:  Channel,
  pub event:    NotificationKind,
  pub reason:   DeliveryFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
  pub delivered: usize,
  pub failures:  Vec<DeliveryError>,
}

impl DeliveryReport {
  pub fn is_clean(&self) -> bool { self.failures.is_empty() }

  pub fn merge(&mut self, other: DeliveryReport) {
    self.delivered += other.delivered;
    self.failures.extend(other.failures);
  }
}

pub struct Dispatcher {
  registry:     Arc<SubscriptionRegistry>,
  send_timeout: Duration,
}

impl Dispatcher {
  pub fn new(registry: Arc<SubscriptionRegistry>, send_timeout: Duration) -> Self {
    Self { registry, send_timeout }
  }

  pub fn registry(&self) -> &Arc<SubscriptionRegistry> { &self.registry }

  /// Route `event` and push each resulting notification to the current
  /// members of its channel.
  pub async fn publish(&self, event: &Event) -> DeliveryReport {
    let mut sends = Vec::new();
    for notification in route(event) {
      for (endpoint, tx) in self.registry.members_of(notification.channel).await {
        sends.push(self.send(endpoint, tx, notification.clone()));
      }
    }

    let mut report = DeliveryReport::default();
    for outcome in join_all(sends).await {
      match outcome {
        Ok(()) => report.delivered += 1,
        Err(failure) => report.failures.push(failure),
      }
    }

    for failure in &report.failures {
      warn!(
        ride_id = %event.ride_id(),
        endpoint = %failure.endpoint,
        channel = %failure.channel,
        event = %failure.event,
        reason = %failure.reason,
        "notification not delivered"
      );
      if failure.reason == DeliveryFailure::Closed {
        self.registry.disconnect(failure.endpoint).await;
      }
    }

    debug!(
      ride_id = %event.ride_id(),
      event = event.name(),
      delivered = report.delivered,
      failed = report.failures.len(),
      "event published"
    );
    report
  }

  async fn send(
    &self,
    endpoint: EndpointId,
    tx: Endpoint,
    notification: Notification,
  ) -> Result<(), DeliveryError> {
    let channel = notification.channel;
    let event = notification.event;
    let reason = match tokio::time::timeout(self.send_timeout, tx.send(notification)).await {
      Ok(Ok(())) => return Ok(()),
      Ok(Err(_)) => DeliveryFailure::Closed,
      Err(_) => DeliveryFailure::TimedOut,
    };
    Err(DeliveryError { endpoint, channel, event, reason })
  }
}

#[cfg(test)]
mod tests {
  use becak_core::lifecycle::RideStatus;
  use tokio::sync::mpsc;
  use uuid::Uuid;

  use super::*;

  fn dispatcher(timeout_ms: u64) -> Dispatcher {
    Dispatcher::new(Arc::new(SubscriptionRegistry::new()), Duration::from_millis(timeout_ms))
  }

  fn status_update(driver_id: Option<Uuid>) -> Event {
    Event::RideStatusUpdated {
      ride_id: Uuid::new_v4(),
      passenger_id: Uuid::new_v4(),
      status: RideStatus::PickedUp,
      driver_id,
    }
  }

  #[tokio::test]
  async fn delivers_to_members_of_each_target_channel() {
    let dispatcher = dispatcher(250);
    let driver_id = Uuid::new_v4();

    let (driver_tx, mut driver_rx) = mpsc::channel(8);
    let (viewer_tx, mut viewer_rx) = mpsc::channel(8);
    let driver = dispatcher.registry().connect(driver_tx).await;
    dispatcher.registry().connect(viewer_tx).await;
    dispatcher.registry().join(driver, Channel::Driver(driver_id)).await.unwrap();

    let report = dispatcher.publish(&status_update(Some(driver_id))).await;
    assert!(report.is_clean());
    assert_eq!(report.delivered, 3);

    // The bound driver hears it on broadcast and on its own channel.
    let first = driver_rx.recv().await.unwrap();
    let second = driver_rx.recv().await.unwrap();
    let mut channels = vec![first.channel, second.channel];
    channels.sort_by_key(|c| c.to_string());
    assert_eq!(channels, vec![Channel::Broadcast, Channel::Driver(driver_id)]);

    let seen = viewer_rx.recv().await.unwrap();
    assert_eq!(seen.channel, Channel::Broadcast);
    assert!(viewer_rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn disconnected_endpoints_are_skipped() {
    let dispatcher = dispatcher(250);
    let (tx, mut rx) = mpsc::channel(8);
    let id = dispatcher.registry().connect(tx).await;
    dispatcher.registry().disconnect(id).await;

    let report = dispatcher.publish(&status_update(None)).await;
    assert_eq!(report, DeliveryReport::default());
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn closed_endpoints_are_reported_and_pruned() {
    let dispatcher = dispatcher(250);
    let (tx, rx) = mpsc::channel(8);
    let id = dispatcher.registry().connect(tx).await;
    drop(rx);

    let report = dispatcher.publish(&status_update(None)).await;
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].endpoint, id);
    assert_eq!(report.failures[0].reason, DeliveryFailure::Closed);
    assert_eq!(dispatcher.registry().endpoint_count().await, 0);
  }

  #[tokio::test]
  async fn slow_members_time_out_without_blocking_others() {
    let dispatcher = dispatcher(20);
    let (slow_tx, _slow_rx) = mpsc::channel(1);
    let (fast_tx, mut fast_rx) = mpsc::channel(8);
    let slow = dispatcher.registry().connect(slow_tx.clone()).await;
    dispatcher.registry().connect(fast_tx).await;

    // Fill the slow member's queue so the next send has to wait.
    slow_tx
      .send(Notification {
        channel: Channel::Broadcast,
        event:   NotificationKind::NewRideRequest,
        data:    serde_json::Value::Null,
      })
      .await
      .unwrap();

    let report = dispatcher.publish(&status_update(None)).await;
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].endpoint, slow);
    assert_eq!(report.failures[0].reason, DeliveryFailure::TimedOut);
    assert!(fast_rx.recv().await.is_some());

    // Timed-out members stay registered.
    assert_eq!(dispatcher.registry().endpoint_count().await, 2);
  }
}
