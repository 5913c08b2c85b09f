//! Webview bridge runtime - transport, call queue and correlation
//!
//! This crate owns everything between a generated stub and the backend socket:
//!
//! - **Transport**: two lazily connected line-delimited JSON streams (sync, async)
//! - **Sync channel**: mutex-serialized blocking exchanges for fields and schema discovery
//! - **Async queue**: FIFO of pending calls with a single request in flight
//! - **Correlation table**: call id -> continuation, tagged with the owning context
//! - **Decoder**: settles one continuation per reply line
//!
//! # Architecture
//!
//! ```text
//! stub ──► Bridge::call_async ──► AsyncQueue ──► drain task ──► async socket
//!                                                    │
//!                     CorrelationTable ◄── decoder ◄─┘ (one reply line)
//!
//! field ──► Bridge::get_field / set_field ──► SyncChannel ──► sync socket
//! ```
//!
//! The [`Bridge`] is constructed once per process and shared as `Arc<Bridge>`.

pub mod bridge;
pub mod config;
pub mod context;
pub mod counter;
pub mod decoder;
pub mod error;
pub mod pending;
pub mod sync_channel;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use bridge::{Bridge, ResetSummary};
pub use config::BridgeConfig;
pub use context::{ContextId, ResetScope};
pub use counter::CallCounter;
pub use error::{Error, Result};
pub use pending::PendingCall;
pub use sync_channel::SyncChannel;
pub use transport::{AsyncConnection, ChannelRole, SyncConnection};
