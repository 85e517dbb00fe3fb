//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::bridge::{MappableCell, MappedValueSet, TabularValueSet};
pub use crate::client::ClientLibrary;
pub use crate::config::{RemapOptions, RemapOptionsBuilder};
pub use crate::diagnostics::{Diagnostic, EntryPoint};
pub use crate::engine::{ExtensionState, TransformEngine};
pub use crate::error::{EngineError, RemapMiddlewareError};
pub use crate::interceptor::{
    ParamsRequest, PrepareRequest, PreparedRequest, QueryRequest, Rewrite, SideStatements,
};
pub use crate::lifecycle::{RemapConnection, RemapMiddleware};
pub use crate::remap::{ProtocolSelection, RemapProtocol};
pub use crate::results::{Cell, CellValue, ColumnDescriptor, ResultObject};
pub use crate::types::{ConnStatus, ExecStatus, Oid, QueryParams, ValueFormat};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{OpenMode, SqliteClient, SqliteConnInfo, SqliteSession};
