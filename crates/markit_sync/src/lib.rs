//! # MarkIt Sync
//!
//! Bookmark sync controller and remote gateways for MarkIt.
//!
//! This crate provides:
//! - `SyncController`, the state machine (uninitialized → loading → ready)
//! - The `RemoteGateway` abstraction over the hosted data service
//! - `MemoryGateway`, an in-process reference service
//! - `RestGateway`, an HTTP gateway for PostgREST-style services
//! - Resubscription with exponential backoff and reconciling re-fetches
//!
//! ## Architecture
//!
//! The controller follows a **confirm-then-apply** model:
//! 1. Load the owner's full list and populate the store
//! 2. Subscribe to the owner's change events
//! 3. Send writes to the service, never to the store
//! 4. Apply `created`/`deleted` events as the single writer of the store
//!
//! ## Key Invariants
//!
//! - The store is only written by the initial load and the event worker
//! - Event application is idempotent (duplicate or late events are harmless)
//! - After `stop()` returns, no event changes any store
//! - Gateway failures surface as `FetchFailed`, `MutationFailed` or
//!   `SubscriptionLost`, never as raw transport errors

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod controller;
mod error;
mod gateway;
mod memory;
mod rest;
mod state;
mod worker;

pub use config::{RetryConfig, ServiceConfig, SyncConfig, SERVICE_KEY_ENV, SERVICE_URL_ENV};
pub use controller::SyncController;
pub use error::{ConfigError, ErrorKind, ServiceError, ServiceResult, SyncError, SyncResult};
pub use gateway::{RemoteGateway, Subscription};
pub use memory::{GatewayOp, MemoryGateway};
pub use rest::{diff_rows, RestGateway, BOOKMARKS_PATH, MAX_POLL_FAILURES};
pub use state::{SyncState, SyncStats};
