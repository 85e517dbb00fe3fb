use crate::bridge::TabularValueSet;
use crate::engine::TransformEngine;
use crate::error::RemapMiddlewareError;
use crate::results::ResultObject;

use super::{RemapOutcome, Remapper};

/// V2: the engine answers with a new column set and value grid, and the adapter builds a
/// replacement result from it.
pub(crate) struct ReconstructRemapper;

impl<E: TransformEngine> Remapper<E> for ReconstructRemapper {
    fn remap(&self, engine: &E, state: &mut E::State, result: ResultObject) -> RemapOutcome {
        let mapped = {
            let values = match TabularValueSet::from_result(&result) {
                Ok(values) => values,
                Err(err) => return RemapOutcome::Absent(err),
            };
            engine.map_reconstruct(state, &values)
        };

        let mapped = match mapped {
            Ok(mapped) => mapped,
            Err(error) => return RemapOutcome::Unmapped { result, error },
        };
        if mapped.is_passthrough() {
            return RemapOutcome::PassThrough(result);
        }
        if let Err(error) = mapped.check_shape(result.ntuples()) {
            return RemapOutcome::Unmapped { result, error };
        }

        let num_rows = result.ntuples();
        let tag = result.command_tag().map(str::to_owned);
        match mapped.into_result(result.status(), num_rows) {
            Ok(mut rebuilt) => {
                rebuilt.set_command_tag(tag);
                tracing::trace!(
                    rows = num_rows,
                    from_columns = result.nfields(),
                    to_columns = rebuilt.nfields(),
                    "result reconstructed"
                );
                drop(result);
                RemapOutcome::Mapped(rebuilt)
            }
            Err(RemapMiddlewareError::Engine(error)) => RemapOutcome::Unmapped { result, error },
            Err(err) => RemapOutcome::Absent(err),
        }
    }
}
