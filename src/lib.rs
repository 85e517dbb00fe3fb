//! Result-set remapping middleware for libpq-style client libraries.
//!
//! The adapter sits between an application and its database client library. Each
//! connection carries at most one piece of engine state; with it attached, outgoing
//! statements are offered to a [`TransformEngine`] for rewriting and every fetched
//! result is remapped before the application sees it. Without it, every call passes
//! straight through.
//!
//! Results are remapped with one of two protocols: in place, where the engine may only
//! shrink cell values inside their existing buffers, or by reconstruction, where the
//! engine returns a new grid of columns and values and the adapter builds a fresh
//! result from it.

pub mod bridge;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod interceptor;
pub mod lifecycle;
pub mod prelude;
pub mod remap;
pub mod results;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use client::ClientLibrary;
pub use config::{RemapOptions, RemapOptionsBuilder};
pub use diagnostics::{Diagnostic, EntryPoint};
pub use engine::{ExtensionState, TransformEngine};
pub use error::{EngineError, RemapMiddlewareError};
pub use lifecycle::{RemapConnection, RemapMiddleware};
pub use remap::{ProtocolSelection, RemapProtocol};
pub use results::{Cell, CellValue, ColumnDescriptor, ResultObject};
pub use types::{ConnStatus, ExecStatus, Oid, QueryParams, ValueFormat};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteClient;
