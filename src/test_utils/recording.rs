use crate::bridge::{MappableCell, MappedValueSet, TabularValueSet};
use crate::diagnostics::{Diagnostic, EntryPoint};
use crate::engine::TransformEngine;
use crate::error::EngineError;
use crate::interceptor::{
    ParamsRequest, PrepareRequest, PreparedRequest, QueryRequest, Rewrite, SideStatements,
};
use crate::remap::RemapProtocol;

use super::EventLog;

/// One call into the recording engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Init { db_name: String },
    Teardown { db_name: String },
    ClearCache { db_name: String },
    Diagnostic(Diagnostic),
    MapInPlace { cells: usize },
    MapReconstruct { rows: usize, columns: usize },
    Rewrite { entry_point: EntryPoint },
}

/// State handed out by [`RecordingEngine::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingState {
    pub db_name: String,
    pub results_mapped: usize,
    pub cache_clears: usize,
}

type TeardownFn = Box<dyn Fn(&RecordingState) + Send + Sync>;
type InPlaceFn = Box<dyn Fn(&mut [MappableCell<'_>]) -> Result<(), EngineError> + Send + Sync>;
type ReconstructFn =
    Box<dyn Fn(&TabularValueSet<'_>) -> Result<MappedValueSet, EngineError> + Send + Sync>;
type RewriteFn<R> =
    Box<dyn Fn(&mut R, &mut SideStatements<'_>) -> Result<Rewrite, EngineError> + Send + Sync>;

/// Transformation engine double whose behaviour is set per test.
///
/// Unconfigured hooks behave like the trait defaults: no rewrite, results left alone.
pub struct RecordingEngine {
    protocol: RemapProtocol,
    init_error: Option<EngineError>,
    clear_error: Option<EngineError>,
    teardown_error: Option<EngineError>,
    on_teardown: Option<TeardownFn>,
    in_place: Option<InPlaceFn>,
    reconstruct: Option<ReconstructFn>,
    rewrite_query: Option<RewriteFn<QueryRequest>>,
    rewrite_params: Option<RewriteFn<ParamsRequest>>,
    rewrite_prepare: Option<RewriteFn<PrepareRequest>>,
    rewrite_prepared: Option<RewriteFn<PreparedRequest>>,
    events: EventLog<EngineEvent>,
}

impl std::fmt::Debug for RecordingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingEngine")
            .field("protocol", &self.protocol)
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            protocol: RemapProtocol::InPlace,
            init_error: None,
            clear_error: None,
            teardown_error: None,
            on_teardown: None,
            in_place: None,
            reconstruct: None,
            rewrite_query: None,
            rewrite_params: None,
            rewrite_prepare: None,
            rewrite_prepared: None,
            events: EventLog::default(),
        }
    }

    /// Protocol the engine negotiates.
    #[must_use]
    pub fn with_protocol(mut self, protocol: RemapProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub fn failing_init(mut self, message: impl Into<String>) -> Self {
        self.init_error = Some(EngineError::InitFailed(message.into()));
        self
    }

    #[must_use]
    pub fn failing_cache_clear(mut self, message: impl Into<String>) -> Self {
        self.clear_error = Some(EngineError::CacheClearFailed(message.into()));
        self
    }

    #[must_use]
    pub fn failing_teardown(mut self, message: impl Into<String>) -> Self {
        self.teardown_error = Some(EngineError::Other(message.into()));
        self
    }

    /// Run `f` when a connection's state is released.
    #[must_use]
    pub fn on_teardown(mut self, f: impl Fn(&RecordingState) + Send + Sync + 'static) -> Self {
        self.on_teardown = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_map_in_place(
        mut self,
        f: impl Fn(&mut [MappableCell<'_>]) -> Result<(), EngineError> + Send + Sync + 'static,
    ) -> Self {
        self.in_place = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_reconstruct(
        mut self,
        f: impl Fn(&TabularValueSet<'_>) -> Result<MappedValueSet, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.reconstruct = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_rewrite_query(
        mut self,
        f: impl Fn(&mut QueryRequest, &mut SideStatements<'_>) -> Result<Rewrite, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.rewrite_query = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_rewrite_params(
        mut self,
        f: impl Fn(&mut ParamsRequest, &mut SideStatements<'_>) -> Result<Rewrite, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.rewrite_params = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_rewrite_prepare(
        mut self,
        f: impl Fn(&mut PrepareRequest, &mut SideStatements<'_>) -> Result<Rewrite, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.rewrite_prepare = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_rewrite_prepared(
        mut self,
        f: impl Fn(&mut PreparedRequest, &mut SideStatements<'_>) -> Result<Rewrite, EngineError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.rewrite_prepared = Some(Box::new(f));
        self
    }

    /// Handle on the event log.
    #[must_use]
    pub fn events(&self) -> EventLog<EngineEvent> {
        self.events.clone()
    }

    fn rewrite<R>(
        &self,
        entry_point: EntryPoint,
        hook: Option<&RewriteFn<R>>,
        request: &mut R,
        side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        self.events.push(EngineEvent::Rewrite { entry_point });
        match hook {
            Some(f) => f(request, side),
            None => Ok(Rewrite::Unchanged),
        }
    }
}

impl EventLog<EngineEvent> {
    /// Diagnostics recorded so far, in order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.snapshot()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Diagnostic(d) => Some(d),
                _ => None,
            })
            .collect()
    }
}

impl TransformEngine for RecordingEngine {
    type State = RecordingState;

    fn init(&self, db_name: &str) -> Result<RecordingState, EngineError> {
        self.events.push(EngineEvent::Init {
            db_name: db_name.to_string(),
        });
        if let Some(err) = &self.init_error {
            return Err(err.clone());
        }
        Ok(RecordingState {
            db_name: db_name.to_string(),
            results_mapped: 0,
            cache_clears: 0,
        })
    }

    fn teardown(&self, state: RecordingState) -> Result<(), EngineError> {
        if let Some(f) = &self.on_teardown {
            f(&state);
        }
        self.events.push(EngineEvent::Teardown {
            db_name: state.db_name,
        });
        match &self.teardown_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn diagnostic(&self, diagnostic: &Diagnostic) {
        self.events.push(EngineEvent::Diagnostic(diagnostic.clone()));
    }

    fn clear_cache(&self, state: &mut RecordingState) -> Result<(), EngineError> {
        self.events.push(EngineEvent::ClearCache {
            db_name: state.db_name.clone(),
        });
        state.cache_clears += 1;
        match &self.clear_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn protocol(&self, _state: &RecordingState) -> RemapProtocol {
        self.protocol
    }

    fn map_in_place(
        &self,
        state: &mut RecordingState,
        cells: &mut [MappableCell<'_>],
    ) -> Result<(), EngineError> {
        self.events.push(EngineEvent::MapInPlace { cells: cells.len() });
        state.results_mapped += 1;
        match &self.in_place {
            Some(f) => f(cells),
            None => Ok(()),
        }
    }

    fn map_reconstruct(
        &self,
        state: &mut RecordingState,
        values: &TabularValueSet<'_>,
    ) -> Result<MappedValueSet, EngineError> {
        self.events.push(EngineEvent::MapReconstruct {
            rows: values.num_rows(),
            columns: values.num_columns(),
        });
        state.results_mapped += 1;
        match &self.reconstruct {
            Some(f) => f(values),
            None => Ok(MappedValueSet::passthrough()),
        }
    }

    fn rewrite_query(
        &self,
        _state: &mut RecordingState,
        request: &mut QueryRequest,
        side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        self.rewrite(EntryPoint::SendQuery, self.rewrite_query.as_ref(), request, side)
    }

    fn rewrite_params(
        &self,
        _state: &mut RecordingState,
        request: &mut ParamsRequest,
        side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        self.rewrite(
            EntryPoint::SendQueryParams,
            self.rewrite_params.as_ref(),
            request,
            side,
        )
    }

    fn rewrite_prepare(
        &self,
        _state: &mut RecordingState,
        request: &mut PrepareRequest,
        side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        self.rewrite(
            EntryPoint::SendPrepare,
            self.rewrite_prepare.as_ref(),
            request,
            side,
        )
    }

    fn rewrite_prepared(
        &self,
        _state: &mut RecordingState,
        request: &mut PreparedRequest,
        side: &mut SideStatements<'_>,
    ) -> Result<Rewrite, EngineError> {
        self.rewrite(
            EntryPoint::SendQueryPrepared,
            self.rewrite_prepared.as_ref(),
            request,
            side,
        )
    }
}
