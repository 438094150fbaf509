//! Client core for the AI news aggregation service.
//!
//! - [`session`]: bearer token, cached profile and listing filters, persisted
//!   through a [`storage::StateStorage`]
//! - [`api`]: the typed REST gateway
//! - [`view`]: per-page fetch/loading/error state machines
//! - [`ui`]: plain-text rendering and the interactive browser

pub mod api;
pub mod config;
pub mod session;
pub mod storage;
pub mod ui;
pub mod util;
pub mod view;
