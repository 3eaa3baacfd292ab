//! Core systems for Horizon Grid.
//!
//! This crate provides the foundational pieces the grid model is built on:
//!
//! - **Signal/Slot System**: Type-safe change notification ([`Signal`])
//! - **Deferred Tasks**: A per-turn FIFO queue flushed before the client
//!   response is produced ([`DeferredQueue`])
//! - **Logging**: `tracing` targets, performance spans and a generic tree
//!   formatter for hierarchy dumps
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Deferred Task Example
//!
//! ```
//! use horizon_grid_core::DeferredQueue;
//!
//! let mut queue = DeferredQueue::<Vec<&'static str>>::new();
//! queue.post("refresh", |out| out.push("refresh"));
//! queue.post("indicators", |out| out.push("indicators"));
//!
//! let mut sent = Vec::new();
//! queue.flush(&mut sent);
//! assert_eq!(sent, vec!["refresh", "indicators"]);
//! ```

pub mod logging;
pub mod signal;
mod task;

pub use logging::{DebugTree, PerfSpan, TreeFormatOptions, TreeFormatter, TreeStyle};
pub use signal::{ConnectionId, Signal};
pub use task::{DeferredQueue, TaskId};
