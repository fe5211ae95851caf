//! Core types and trait definitions for the kudos service.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::KudosStore`], chat-platform clients implement
//! [`chat::ChatPlatform`], and the higher layers only ever talk to those
//! traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod chat;
pub mod error;
pub mod kudos;
pub mod store;
pub mod submission;
pub mod visibility;

pub use error::{Error, Result};

#[cfg(test)]
mod testing;
