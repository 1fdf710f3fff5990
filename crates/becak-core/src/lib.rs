//! Core types and trait definitions for the Becak ride dispatcher.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage, address resolution and driver profiles are reached through the
//! collaborator traits in [`store`], [`geo`] and [`profile`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod channel;
pub mod error;
pub mod event;
pub mod geo;
pub mod lifecycle;
pub mod machine;
pub mod pricing;
pub mod profile;
pub mod ride;
pub mod store;

pub use error::{Error, Result};
