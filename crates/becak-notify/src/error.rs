use thiserror::Error;

use crate::registry::EndpointId;

#[derive(Debug, Error)]
pub enum Error {
  /// The endpoint was never connected, or has already been disconnected.
  #[error("unknown endpoint: {0}")]
  UnknownEndpoint(EndpointId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
