//! The subscription registry.
//!
//! Every connected endpoint is an implicit member of [`Channel::Broadcast`];
//! passenger and driver channels are joined explicitly. All state sits
//! behind one [`RwLock`], so a disconnect removes the endpoint and all of
//! its memberships atomically with respect to fan-out reads.

use std::{
  collections::{HashMap, HashSet},
  fmt,
};

use becak_core::channel::Channel;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::{Error, Result, notification::Notification};

/// Identifies one connected endpoint for the lifetime of its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(Uuid);

impl EndpointId {
  fn new() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for EndpointId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// The sending half of an endpoint's outbound queue.
pub type Endpoint = mpsc::Sender<Notification>;

#[derive(Default)]
struct Inner {
  endpoints:   HashMap<EndpointId, Endpoint>,
  /// Explicit memberships only. Empty sets are removed.
  memberships: HashMap<Channel, HashSet<EndpointId>>,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
  inner: RwLock<Inner>,
}

impl SubscriptionRegistry {
  pub fn new() -> Self { Self::default() }

  /// Register an endpoint's outbound queue and return its fresh id.
  pub async fn connect(&self, sender: Endpoint) -> EndpointId {
    let id = EndpointId::new();
    self.inner.write().await.endpoints.insert(id, sender);
    id
  }

  /// Add `endpoint` to `channel`. Returns `false` if it was already a member.
  pub async fn join(&self, endpoint: EndpointId, channel: Channel) -> Result<bool> {
    let mut inner = self.inner.write().await;
    if !inner.endpoints.contains_key(&endpoint) {
      return Err(Error::UnknownEndpoint(endpoint));
    }
    if channel == Channel::Broadcast {
      return Ok(false);
    }
    Ok(inner.memberships.entry(channel).or_default().insert(endpoint))
  }

  /// Remove `endpoint` from `channel`. Returns `false` if it was not a
  /// member. Broadcast membership lasts until disconnect.
  pub async fn leave(&self, endpoint: EndpointId, channel: Channel) -> Result<bool> {
    let mut inner = self.inner.write().await;
    if !inner.endpoints.contains_key(&endpoint) {
      return Err(Error::UnknownEndpoint(endpoint));
    }
    let Some(members) = inner.memberships.get_mut(&channel) else {
      return Ok(false);
    };
    let removed = members.remove(&endpoint);
    if members.is_empty() {
      inner.memberships.remove(&channel);
    }
    Ok(removed)
  }

  /// Forget `endpoint` and every channel it had joined. Returns `false` if
  /// it was not connected.
  pub async fn disconnect(&self, endpoint: EndpointId) -> bool {
    let mut inner = self.inner.write().await;
    if inner.endpoints.remove(&endpoint).is_none() {
      return false;
    }
    inner.memberships.retain(|_, members| {
      members.remove(&endpoint);
      !members.is_empty()
    });
    true
  }

  /// Current members of `channel` with their queues.
  pub async fn members_of(&self, channel: Channel) -> Vec<(EndpointId, Endpoint)> {
    let inner = self.inner.read().await;
    match channel {
      Channel::Broadcast => inner
        .endpoints
        .iter()
        .map(|(id, tx)| (*id, tx.clone()))
        .collect(),
      _ => inner
        .memberships
        .get(&channel)
        .into_iter()
        .flatten()
        .filter_map(|id| inner.endpoints.get(id).map(|tx| (*id, tx.clone())))
        .collect(),
    }
  }

  /// Channels `endpoint` has explicitly joined.
  pub async fn channels_of(&self, endpoint: EndpointId) -> Vec<Channel> {
    let inner = self.inner.read().await;
    inner
      .memberships
      .iter()
      .filter(|(_, members)| members.contains(&endpoint))
      .map(|(channel, _)| *channel)
      .collect()
  }

  pub async fn endpoint_count(&self) -> usize { self.inner.read().await.endpoints.len() }
}
