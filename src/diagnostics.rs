//! Diagnostics the adapter reports instead of failing a call.
//!
//! Every diagnostic is logged through `tracing` and then offered to the engine's
//! diagnostic sink. None of them changes what the wrapped entry point returns beyond
//! "unmapped" or "absent".

use std::fmt;

use crate::engine::TransformEngine;
use crate::error::EngineError;
use crate::remap::RemapProtocol;

/// Wrapped entry point a diagnostic was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Connect,
    Reset,
    SendQuery,
    SendQueryParams,
    SendPrepare,
    SendQueryPrepared,
    GetResult,
    Finish,
}

impl EntryPoint {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::Connect => "connect",
            EntryPoint::Reset => "reset",
            EntryPoint::SendQuery => "send_query",
            EntryPoint::SendQueryParams => "send_query_params",
            EntryPoint::SendPrepare => "send_prepare",
            EntryPoint::SendQueryPrepared => "send_query_prepared",
            EntryPoint::GetResult => "get_result",
            EntryPoint::Finish => "finish",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No extension state is attached; the call passed through unmodified.
    Degraded { entry_point: EntryPoint },
    /// The engine could not create state for a connection being opened or reset.
    InitFailed {
        entry_point: EntryPoint,
        db_name: String,
        error: EngineError,
    },
    /// The engine failed to rewrite an outgoing statement; it was not sent.
    RewriteFailed {
        entry_point: EntryPoint,
        error: EngineError,
    },
    /// The engine failed to map a result; the original was returned.
    MappingFailed {
        protocol: RemapProtocol,
        error: EngineError,
    },
    /// Intermediate structures could not be allocated; no result was returned.
    AllocationFailed { message: String },
    /// The per-statement value cache could not be cleared at end of stream.
    CacheClearFailed { error: EngineError },
    /// The engine reported an error while releasing connection state.
    TeardownFailed { error: EngineError },
}

impl Diagnostic {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Diagnostic::AllocationFailed { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Degraded { entry_point } => write!(
                f,
                "{entry_point}: driver initialisation failed which may be due to misconfiguration"
            ),
            Diagnostic::InitFailed {
                entry_point,
                db_name,
                error,
            } => write!(
                f,
                "{entry_point}: no extension state for database {db_name:?}: {error}"
            ),
            Diagnostic::RewriteFailed { entry_point, error } => {
                write!(f, "{entry_point}: statement not sent: {error}")
            }
            Diagnostic::MappingFailed { protocol, error } => {
                write!(f, "get_result: {protocol} mapping failed, result left unmapped: {error}")
            }
            Diagnostic::AllocationFailed { message } => {
                write!(f, "FATAL: unable to allocate memory while mapping results: {message}")
            }
            Diagnostic::CacheClearFailed { error } => {
                write!(f, "get_result: failed to clear the value cache: {error}")
            }
            Diagnostic::TeardownFailed { error } => write!(
                f,
                "{}: failed to release extension state: {error}",
                EntryPoint::Finish
            ),
        }
    }
}

pub(crate) fn emit<E: TransformEngine>(engine: &E, diagnostic: &Diagnostic) {
    if diagnostic.is_fatal() {
        tracing::error!(target: "sql_remap_middleware", "{diagnostic}");
    } else {
        tracing::warn!(target: "sql_remap_middleware", "{diagnostic}");
    }
    engine.diagnostic(diagnostic);
}
