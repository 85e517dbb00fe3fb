use crate::bridge::{apply_lengths, mappable_cells, mapped_lengths, written_lengths};
use crate::engine::TransformEngine;
use crate::results::ResultObject;

use super::{RemapOutcome, Remapper};

/// V1: the engine rewrites cell bytes inside the buffers the client library allocated.
///
/// Nothing new is allocated for cells and nothing is freed; the result object that comes
/// in is the one that goes out, with only reported lengths changed.
///
/// If the engine fails part way, cells it never touched keep their original value and
/// the ones it did touch keep the value it wrote, length included.
pub(crate) struct InPlaceRemapper;

impl<E: TransformEngine> Remapper<E> for InPlaceRemapper {
    fn remap(&self, engine: &E, state: &mut E::State, mut result: ResultObject) -> RemapOutcome {
        let (lengths, error) = {
            let mut cells = match mappable_cells(&mut result) {
                Ok(cells) => cells,
                Err(err) => return RemapOutcome::Absent(err),
            };
            let error = engine.map_in_place(state, &mut cells).err();
            let lengths = if error.is_some() {
                written_lengths(&cells)
            } else {
                mapped_lengths(&cells)
            };
            match lengths {
                Ok(lengths) => (lengths, error),
                Err(err) => return RemapOutcome::Absent(err),
            }
        };

        let changed = apply_lengths(&mut result, &lengths);
        match error {
            Some(error) => {
                tracing::debug!(changed, "in-place remap failed after touching cells");
                RemapOutcome::Unmapped { result, error }
            }
            None => {
                tracing::trace!(cells = lengths.len(), changed, "in-place remap applied");
                RemapOutcome::Mapped(result)
            }
        }
    }
}
