//! The result-fetch wrapper and its two remap protocols.

mod in_place;
mod protocol;
mod reconstruct;

pub use protocol::{ProtocolSelection, RemapProtocol};

use crate::client::ClientLibrary;
use crate::diagnostics::{Diagnostic, EntryPoint};
use crate::engine::TransformEngine;
use crate::error::{EngineError, RemapMiddlewareError};
use crate::lifecycle::RemapConnection;
use crate::results::ResultObject;

use in_place::InPlaceRemapper;
use reconstruct::ReconstructRemapper;

/// What happened to one fetched result.
#[derive(Debug)]
pub(crate) enum RemapOutcome {
    /// The engine mapped the result; this is the one to hand back.
    Mapped(ResultObject),
    /// The engine asked for the result to be left alone.
    PassThrough(ResultObject),
    /// The engine failed; the original result is handed back.
    Unmapped {
        result: ResultObject,
        error: EngineError,
    },
    /// Intermediate structures could not be built; nothing is handed back.
    Absent(RemapMiddlewareError),
}

/// One remap protocol.
pub(crate) trait Remapper<E: TransformEngine> {
    fn remap(&self, engine: &E, state: &mut E::State, result: ResultObject) -> RemapOutcome;
}

pub(crate) fn remap_with<E: TransformEngine>(
    protocol: RemapProtocol,
    engine: &E,
    state: &mut E::State,
    result: ResultObject,
) -> RemapOutcome {
    match protocol {
        RemapProtocol::InPlace => InPlaceRemapper.remap(engine, state, result),
        RemapProtocol::Reconstruct => ReconstructRemapper.remap(engine, state, result),
    }
}

impl<C: ClientLibrary, E: TransformEngine> RemapConnection<C, E> {
    /// Fetch the next result of the current command, remapped by the engine.
    ///
    /// `None` means the stream is exhausted, or that the result could not be mapped
    /// because memory for the intermediate structures ran out; callers treat both the
    /// same way. On end of stream the engine's per-statement value cache is cleared.
    pub fn get_result(&mut self) -> Option<ResultObject> {
        self.get_result_with(remap_with)
    }

    fn get_result_with(
        &mut self,
        remap: impl FnOnce(RemapProtocol, &E, &mut E::State, ResultObject) -> RemapOutcome,
    ) -> Option<ResultObject> {
        let Some(result) = self.shared.client.get_result(&mut self.native) else {
            self.end_of_stream();
            return None;
        };

        let Self { shared, state, .. } = self;

        let Some(ext) = state.as_mut() else {
            shared.degraded(EntryPoint::GetResult);
            return Some(result);
        };

        let protocol = shared
            .options
            .protocol
            .resolve(shared.engine.protocol(ext.get()));
        match remap(protocol, &shared.engine, ext.get_mut(), result) {
            RemapOutcome::Mapped(result) | RemapOutcome::PassThrough(result) => Some(result),
            RemapOutcome::Unmapped { result, error } => {
                shared.report(&Diagnostic::MappingFailed { protocol, error });
                Some(result)
            }
            RemapOutcome::Absent(error) => {
                shared.report(&Diagnostic::AllocationFailed {
                    message: error.to_string(),
                });
                None
            }
        }
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::config::RemapOptions;
    use crate::lifecycle::RemapMiddleware;
    use crate::test_utils::{RecordingEngine, ScriptedClient};

    #[test]
    fn allocation_failure_yields_no_result_and_keeps_state() {
        let engine = RecordingEngine::new();
        let events = engine.events();
        let middleware =
            RemapMiddleware::new(ScriptedClient::new("app"), engine, RemapOptions::default());
        let mut conn = middleware.connectdb("dbname=app").unwrap();
        conn.native_mut().queue(
            ResultObject::from_rows(["n"], vec![vec![Some(b"1".to_vec())]]).unwrap(),
        );

        let fetched = conn.get_result_with(|_, _, _, _| {
            RemapOutcome::Absent(RemapMiddlewareError::AllocationError(
                "memory allocation failed".into(),
            ))
        });
        assert!(fetched.is_none());

        let diagnostics = events.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::AllocationFailed { .. }));
        assert!(diagnostics[0].is_fatal());
        assert!(conn.has_extension_state());

        // The connection keeps working after the failed fetch.
        assert!(conn.send_query("SELECT 1"));
        conn.native_mut().queue(
            ResultObject::from_rows(["n"], vec![vec![Some(b"2".to_vec())]]).unwrap(),
        );
        assert_eq!(conn.get_result().unwrap().value(0, 0), Some(&b"2"[..]));
    }
}
