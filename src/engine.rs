//! The value-transformation engine seen from the adapter.
//!
//! The engine is opaque: the adapter creates one [`ExtensionState`] per connection
//! through [`TransformEngine::init`], hands it back on every call, and releases it
//! through [`TransformEngine::teardown`]. It never looks inside the state.

use crate::bridge::{MappableCell, MappedValueSet, TabularValueSet};
use crate::diagnostics::Diagnostic;
use crate::error::EngineError;
use crate::interceptor::{
    ParamsRequest, PrepareRequest, PreparedRequest, QueryRequest, Rewrite, SideStatements,
};
use crate::remap::RemapProtocol;

/// Capabilities the adapter consumes from a transformation engine.
///
/// Only [`init`](Self::init) and [`clear_cache`](Self::clear_cache) are required. The
/// mapping hooks default to "leave the result alone" and the rewrite hooks default to
/// "no rewrite needed", so an engine implements just the protocol it speaks.
pub trait TransformEngine {
    /// Per-connection state. The adapter only stores and forwards it.
    type State;

    /// Create the state for a connection to `db_name`.
    ///
    /// # Errors
    /// Any error leaves the connection in degraded (pass-through) mode.
    fn init(&self, db_name: &str) -> Result<Self::State, EngineError>;

    /// Release the state of a connection that is being finished.
    ///
    /// # Errors
    /// Errors are reported as diagnostics; the connection is finished regardless.
    fn teardown(&self, state: Self::State) -> Result<(), EngineError> {
        drop(state);
        Ok(())
    }

    /// Sink for adapter diagnostics. Diagnostics are also logged through `tracing`.
    fn diagnostic(&self, _diagnostic: &Diagnostic) {}

    /// Drop whatever was cached for the result stream that just ended.
    ///
    /// # Errors
    /// Reported as a non-fatal diagnostic.
    fn clear_cache(&self, state: &mut Self::State) -> Result<(), EngineError>;

    /// Remap protocol this engine speaks for the given connection.
    fn protocol(&self, _state: &Self::State) -> RemapProtocol {
        RemapProtocol::InPlace
    }

    /// In-place (V1) mapping over every cell of a result, column-outer, row-inner.
    ///
    /// Values may only shrink. On error, cells the engine wrote to or resized keep the
    /// engine's value and every other cell keeps its original value.
    ///
    /// # Errors
    /// The result is returned unmapped.
    fn map_in_place(
        &self,
        _state: &mut Self::State,
        _cells: &mut [MappableCell<'_>],
    ) -> Result<(), EngineError> {
        Ok(())
    }

    /// Reconstruction (V2) mapping. Returning a value set with no columns leaves the
    /// result unchanged.
    ///
    /// # Errors
    /// The result is returned unmapped.
    fn map_reconstruct(
        &self,
        _state: &mut Self::State,
        _values: &TabularValueSet<'_>,
    ) -> Result<MappedValueSet, EngineError> {
        Ok(MappedValueSet::passthrough())
    }

    /// Rewrite the text of a simple query.
    ///
    /// # Errors
    /// The statement is not sent and the entry point reports failure.
    fn rewrite_query(
        &self,
        _state: &mut Self::State,
        _request: &mut QueryRequest,
        _side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        Ok(Rewrite::Unchanged)
    }

    /// Rewrite a parameterized query.
    ///
    /// # Errors
    /// The statement is not sent and the entry point reports failure.
    fn rewrite_params(
        &self,
        _state: &mut Self::State,
        _request: &mut ParamsRequest,
        _side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        Ok(Rewrite::Unchanged)
    }

    /// Rewrite a statement being prepared.
    ///
    /// # Errors
    /// The statement is not sent and the entry point reports failure.
    fn rewrite_prepare(
        &self,
        _state: &mut Self::State,
        _request: &mut PrepareRequest,
        _side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        Ok(Rewrite::Unchanged)
    }

    /// Rewrite the parameters of a prepared-statement execution.
    ///
    /// # Errors
    /// The statement is not sent and the entry point reports failure.
    fn rewrite_prepared(
        &self,
        _state: &mut Self::State,
        _request: &mut PreparedRequest,
        _side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        Ok(Rewrite::Unchanged)
    }
}

/// Engine state attached to one connection.
///
/// Move-only: it is created on a successful connect, lives inside the connection and is
/// consumed by teardown when the connection is finished.
#[derive(Debug)]
pub struct ExtensionState<S> {
    db_name: String,
    inner: S,
}

impl<S> ExtensionState<S> {
    pub(crate) fn new(db_name: impl Into<String>, inner: S) -> Self {
        Self {
            db_name: db_name.into(),
            inner,
        }
    }

    /// Database name the state was initialised for.
    #[must_use]
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub(crate) fn get(&self) -> &S {
        &self.inner
    }

    pub(crate) fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub(crate) fn into_inner(self) -> S {
        self.inner
    }
}
