//! Process wiring for the kudos web service: configuration, backend
//! selection, and the top-level router that adds health and static assets
//! around [`kudos_api::api_router`].

pub mod app;
pub mod config;

pub use app::{router, run};
pub use config::{ServerConfig, StoreLocator};
