//! wvb: schema-driven proxy objects for a scripting context backed by an out-of-process backend
//!
//! The backend describes what it exposes with a binding schema. This crate turns that schema
//! into a graph of [`ProxyObject`]s inside a [`ScriptContext`]: methods become [`MethodStub`]s
//! that queue async calls, fields become [`FieldAccessor`]s that validate the assigned value
//! before any round trip.
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use wvb::{ExtensionHost, RemoteBackend};
//! use wvb_runtime::{Bridge, BridgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = Bridge::new(BridgeConfig::from_env()?, tokio::runtime::Handle::current());
//!     let backend: Arc<dyn RemoteBackend> = Arc::new(bridge);
//!     let host = ExtensionHost::new(backend, Default::default());
//!
//!     let ctx = host.on_context_created();
//!     let greeting = ctx.call("go.main.App.Greet", &["world".into()])?.await?;
//!     println!("{greeting:?}");
//!
//!     ctx.set("go.main.App.Count", 3.0.into())?;
//!     host.on_context_cleared(&ctx);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod bindings;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod field;
pub mod host;
pub mod proxy;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::RemoteBackend;
pub use bindings::{BindingGenerator, InstallReport};
pub use config::BindingConfig;
pub use console::{Console, ScriptError};
pub use context::ScriptContext;
pub use error::{Error, Result};
pub use field::FieldAccessor;
pub use host::ExtensionHost;
pub use proxy::{Member, MethodStub, ProxyObject};
pub use wvb_protocol::{BindingSchema, ScriptValue, ValueKind};
pub use wvb_runtime::{ContextId, PendingCall, ResetScope, ResetSummary};
