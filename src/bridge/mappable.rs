use crate::error::{EngineError, RemapMiddlewareError};
use crate::results::{Cell, ResultObject};

use super::reserve;

/// One entry of the in-place (V1) value list handed to an engine.
///
/// The entry borrows the cell buffer owned by the result object. An engine may rewrite
/// the bytes and shorten the reported length, but the API gives it no way to make a
/// value longer than the buffer that was originally allocated. NULL cells are present
/// in the list (so the flattened order needs no markers) but carry no buffer.
///
/// A cell remembers whether the engine touched it. When mapping fails part way, touched
/// cells keep the value the engine left and untouched cells keep the original, so no
/// cell ends up with new bytes under an old length.
#[derive(Debug)]
pub struct MappableCell<'a> {
    data: Option<&'a mut [u8]>,
    len: usize,
    written: bool,
}

impl<'a> MappableCell<'a> {
    fn from_cell(cell: &'a mut Cell) -> Self {
        match cell.as_mut() {
            Some(value) => {
                let len = value.len();
                Self {
                    data: Some(value.buffer_mut()),
                    len,
                    written: false,
                }
            }
            None => Self {
                data: None,
                len: 0,
                written: false,
            },
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.data.is_none()
    }

    /// Current length of the value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the engine has written to or resized this cell.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Largest length this cell can ever report.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.len())
    }

    /// Current value, `None` for NULL.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        self.data.as_deref().map(|d| &d[..self.len])
    }

    /// Replace the value with `bytes`, which must fit the original buffer.
    ///
    /// # Errors
    /// `EngineError::CellOverflow` if `bytes` is longer than the buffer,
    /// `EngineError::MappingFailed` if the cell is NULL.
    pub fn overwrite(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let Some(data) = self.data.as_deref_mut() else {
            return Err(EngineError::MappingFailed(
                "cannot write a value into a NULL cell".to_string(),
            ));
        };
        if bytes.len() > data.len() {
            return Err(EngineError::CellOverflow {
                capacity: data.len(),
                requested: bytes.len(),
            });
        }
        data[..bytes.len()].copy_from_slice(bytes);
        self.len = bytes.len();
        self.written = true;
        Ok(())
    }

    /// Raw access to the whole buffer for engines that decode in place. Pair with
    /// [`truncate`](Self::truncate) to report the new length.
    pub fn buffer_mut(&mut self) -> Option<&mut [u8]> {
        let data = self.data.as_deref_mut()?;
        self.written = true;
        Some(data)
    }

    /// Report a new length for the value.
    ///
    /// # Errors
    /// `EngineError::CellOverflow` if `len` exceeds the buffer.
    pub fn truncate(&mut self, len: usize) -> Result<(), EngineError> {
        let capacity = self.capacity();
        if len > capacity {
            return Err(EngineError::CellOverflow {
                capacity,
                requested: len,
            });
        }
        self.len = len;
        self.written = true;
        Ok(())
    }
}

/// Flatten every cell of `result` column-outer, row-inner.
///
/// # Errors
/// `RemapMiddlewareError::AllocationError` if the list cannot be allocated.
pub fn mappable_cells(
    result: &mut ResultObject,
) -> Result<Vec<MappableCell<'_>>, RemapMiddlewareError> {
    let num_cols = result.nfields();
    let total = cell_count(result)?;
    let mut cells = reserve(total)?;

    let mut rows = reserve(result.ntuples())?;
    rows.extend(result.rows_mut().iter_mut().map(|r| r.iter_mut()));
    for _ in 0..num_cols {
        for row in &mut rows {
            if let Some(cell) = row.next() {
                cells.push(MappableCell::from_cell(cell));
            }
        }
    }
    Ok(cells)
}

/// Lengths reported by the engine, in the same order as [`mappable_cells`].
///
/// # Errors
/// `RemapMiddlewareError::AllocationError` if the list cannot be allocated.
pub fn mapped_lengths(
    cells: &[MappableCell<'_>],
) -> Result<Vec<Option<usize>>, RemapMiddlewareError> {
    collect_lengths(cells, |_| true)
}

/// Like [`mapped_lengths`], but only for cells the engine touched; every other entry
/// is `None` and leaves its cell alone.
///
/// # Errors
/// `RemapMiddlewareError::AllocationError` if the list cannot be allocated.
pub fn written_lengths(
    cells: &[MappableCell<'_>],
) -> Result<Vec<Option<usize>>, RemapMiddlewareError> {
    collect_lengths(cells, MappableCell::is_written)
}

fn collect_lengths<'c>(
    cells: &[MappableCell<'c>],
    keep: impl Fn(&MappableCell<'c>) -> bool,
) -> Result<Vec<Option<usize>>, RemapMiddlewareError> {
    let mut lengths = reserve(cells.len())?;
    lengths.extend(
        cells
            .iter()
            .map(|c| (!c.is_null() && keep(c)).then_some(c.len)),
    );
    Ok(lengths)
}

/// Walk `result` in the same column-outer, row-inner order and apply `lengths` to
/// each non-null cell. Returns the number of cells whose length changed.
pub fn apply_lengths(result: &mut ResultObject, lengths: &[Option<usize>]) -> usize {
    let num_cols = result.nfields();
    let rows = result.rows_mut();
    let mut lengths = lengths.iter();
    let mut changed = 0;
    for col in 0..num_cols {
        for row in rows.iter_mut() {
            let (Some(cell), Some(len)) = (row.get_mut(col), lengths.next()) else {
                continue;
            };
            if let (Some(value), Some(len)) = (cell.as_mut(), len)
                && value.len() != *len
                && value.set_len(*len)
            {
                changed += 1;
            }
        }
    }
    changed
}

fn cell_count(result: &ResultObject) -> Result<usize, RemapMiddlewareError> {
    result
        .ntuples()
        .checked_mul(result.nfields())
        .ok_or_else(|| RemapMiddlewareError::AllocationError("cell count overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ResultObject {
        ResultObject::from_rows(
            ["a", "b"],
            vec![
                vec![Some(b"r0c0".to_vec()), Some(b"r0c1".to_vec())],
                vec![None, Some(b"r1c1".to_vec())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn flattens_column_outer_row_inner() {
        let mut result = grid();
        let cells = mappable_cells(&mut result).unwrap();
        let values: Vec<Option<&[u8]>> = cells.iter().map(MappableCell::value).collect();
        assert_eq!(
            values,
            vec![Some(&b"r0c0"[..]), None, Some(&b"r0c1"[..]), Some(&b"r1c1"[..])]
        );
    }

    #[test]
    fn overwrite_is_bounded() {
        let mut result = grid();
        let mut cells = mappable_cells(&mut result).unwrap();
        assert_eq!(
            cells[0].overwrite(b"too long!"),
            Err(EngineError::CellOverflow {
                capacity: 4,
                requested: 9
            })
        );
        assert!(cells[1].overwrite(b"x").is_err());
        cells[0].overwrite(b"ok").unwrap();
        assert_eq!(cells[0].value(), Some(&b"ok"[..]));
        assert!(cells[2].truncate(5).is_err());
        cells[2].truncate(1).unwrap();
    }

    #[test]
    fn lengths_round_trip_through_the_same_order() {
        let mut result = grid();
        let ptr = result.cell(1, 1).unwrap().as_ptr();
        let lengths = {
            let mut cells = mappable_cells(&mut result).unwrap();
            cells[3].overwrite(b"R").unwrap();
            mapped_lengths(&cells).unwrap()
        };
        assert_eq!(lengths, vec![Some(4), None, Some(4), Some(1)]);

        let changed = apply_lengths(&mut result, &lengths);
        assert_eq!(changed, 1);
        assert_eq!(result.value(1, 1), Some(&b"R"[..]));
        assert_eq!(result.cell(1, 1).unwrap().as_ptr(), ptr);
        assert!(result.is_null(1, 0));
    }

    #[test]
    fn written_lengths_cover_only_touched_cells() {
        let mut result = grid();
        let mut cells = mappable_cells(&mut result).unwrap();
        assert!(!cells[0].is_written());
        cells[0].overwrite(b"ab").unwrap();
        cells[2].buffer_mut().unwrap()[0] = b'R';
        assert!(cells[1].buffer_mut().is_none());
        assert!(!cells[1].is_written());
        assert_eq!(
            written_lengths(&cells).unwrap(),
            vec![Some(2), None, Some(4), None]
        );
    }

    #[test]
    fn empty_result_has_no_cells() {
        let mut result = ResultObject::from_rows(["a"], Vec::new()).unwrap();
        assert!(mappable_cells(&mut result).unwrap().is_empty());
    }
}
