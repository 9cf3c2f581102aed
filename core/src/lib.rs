//! Client-side synchronization core for the todo service.
//!
//! # Overview
//! Keeps a local `TodoStore` in step with the remote todo API. User intents
//! (toggle, add, edit, delete) go through `TodoSyncController`, which
//! mutates the store optimistically where that is safe, issues exactly one
//! remote call through `RemoteTodoClient`, and reconciles the store with the
//! outcome.
//!
//! # Design
//! - `TodoStore` is pure and synchronous; it knows nothing of the network.
//! - `RemoteTodoClient` splits every operation into `build_*` / `parse_*`
//!   around a `Transport`, so the I/O boundary is one trait.
//! - The controller runs on a single thread. Intents may overlap, but store
//!   borrows never span an await point.
//! - Failures never escape as errors; every intent ends in an
//!   `IntentOutcome` carrying a user-facing message.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::RemoteTodoClient;
pub use config::{SyncConfig, ToggleFailurePolicy, DEFAULT_API_URL};
pub use controller::{ControllerOptions, FailureKind, Intent, IntentOutcome, TodoSyncController};
pub use error::{ConfigError, IntentError, RemoteError, StoreError, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use store::TodoStore;
pub use transport::ReqwestTransport;
pub use types::{ParseStatusError, ReplacedTodo, Status, Todo, TodoId, TodoPayload};
