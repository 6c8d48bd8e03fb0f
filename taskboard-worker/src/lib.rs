//! # Taskboard Worker Library
//!
//! Background side of the board deletion cascade.
//!
//! ## Modules
//!
//! - `config`: Worker configuration from the environment
//! - `relay`: Publishes outbox entries the API could not publish inline
//! - `consumer`: Deletes a board's tasks on `BoardDeleted`
//! - `backoff`: Retry delays for both loops
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskboard_shared::events::memory::InMemoryBus;
//! use taskboard_shared::services::CascadeNotifier;
//! use taskboard_shared::store::InMemoryBoardStore;
//! use taskboard_worker::relay::{OutboxRelay, RelayConfig};
//!
//! # async fn example() {
//! let boards = InMemoryBoardStore::new();
//! let notifier = CascadeNotifier::new(Arc::new(InMemoryBus::new()), Arc::new(boards));
//! let relay = OutboxRelay::new(notifier, RelayConfig::default());
//! relay.run_once().await.ok();
//! # }
//! ```

pub mod backoff;
pub mod config;
pub mod consumer;
pub mod relay;
