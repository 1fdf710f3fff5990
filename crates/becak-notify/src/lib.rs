//! Real-time fan-out of ride lifecycle events.
//!
//! [`SubscriptionRegistry`] tracks which connected endpoints belong to which
//! [`Channel`](becak_core::channel::Channel); [`Dispatcher`] turns a committed
//! [`Event`](becak_core::event::Event) into [`Notification`]s and pushes them
//! to the members of each target channel.

pub mod dispatcher;
pub mod error;
pub mod notification;
pub mod registry;

pub use dispatcher::{DeliveryError, DeliveryFailure, DeliveryReport, Dispatcher};
pub use error::{Error, Result};
pub use notification::{Notification, NotificationKind, route};
pub use registry::{EndpointId, SubscriptionRegistry};
