use crate::error::{EngineError, RemapMiddlewareError};
use crate::results::{ColumnDescriptor, ResultObject};
use crate::types::ExecStatus;

use super::reserve;

/// Protocol-agnostic view of a result handed to an engine for reconstruction (V2).
///
/// Values are row-major and borrow the bytes held by the result object, so building the
/// set allocates only the index vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularValueSet<'a> {
    columns: Vec<&'a str>,
    num_rows: usize,
    values: Vec<Option<&'a [u8]>>,
}

impl<'a> TabularValueSet<'a> {
    /// Build the value set for `result`.
    ///
    /// # Errors
    /// `RemapMiddlewareError::AllocationError` if the intermediate vectors cannot be
    /// allocated.
    pub fn from_result(result: &'a ResultObject) -> Result<Self, RemapMiddlewareError> {
        let num_rows = result.ntuples();
        let num_cols = result.nfields();
        let total = num_rows.checked_mul(num_cols).ok_or_else(|| {
            RemapMiddlewareError::AllocationError("cell count overflow".to_string())
        })?;

        let mut columns = reserve(num_cols)?;
        columns.extend(result.columns().iter().map(|c| c.name.as_str()));

        let mut values = reserve(total)?;
        for row in 0..num_rows {
            for col in 0..num_cols {
                values.push(result.value(row, col));
            }
        }

        Ok(Self {
            columns,
            num_rows,
            values,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[&'a str] {
        &self.columns
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// All values, row-major.
    #[must_use]
    pub fn values(&self) -> &[Option<&'a [u8]>] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<&'a [u8]> {
        if col >= self.columns.len() {
            return None;
        }
        self.values
            .get(row.checked_mul(self.columns.len())?.checked_add(col)?)
            .copied()
            .flatten()
    }

    /// Iterate rows as slices of values.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<&'a [u8]>]> {
        self.values.chunks(self.columns.len().max(1))
    }
}

/// An engine's reconstruction (V2) response.
///
/// A response with no columns is the engine saying "leave the result alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedValueSet {
    columns: Vec<String>,
    values: Vec<Option<Vec<u8>>>,
}

impl MappedValueSet {
    /// A response with new column names and a row-major value grid.
    #[must_use]
    pub fn new(columns: Vec<String>, values: Vec<Option<Vec<u8>>>) -> Self {
        Self { columns, values }
    }

    /// The "do not remap" response.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn values(&self) -> &[Option<Vec<u8>>] {
        &self.values
    }

    /// Check that the grid holds exactly `num_rows` rows of `num_columns()` values.
    ///
    /// # Errors
    /// `EngineError::MappingFailed` describing the mismatch.
    pub fn check_shape(&self, num_rows: usize) -> Result<(), EngineError> {
        let expected = num_rows.checked_mul(self.columns.len()).ok_or_else(|| {
            EngineError::MappingFailed("mapped grid size overflows".to_string())
        })?;
        if self.values.len() != expected {
            return Err(EngineError::MappingFailed(format!(
                "expected {expected} values for {num_rows} rows x {} columns, got {}",
                self.columns.len(),
                self.values.len()
            )));
        }
        Ok(())
    }

    /// Build a replacement result from this response.
    ///
    /// The new result has `status`, one descriptor per mapped column carrying only the
    /// name, and `num_rows` rows in which every non-null mapped value is set.
    ///
    /// # Errors
    /// `RemapMiddlewareError::Engine` if the grid does not match `num_rows`, or
    /// `RemapMiddlewareError::AllocationError` if the new result cannot be allocated.
    pub fn into_result(
        self,
        status: ExecStatus,
        num_rows: usize,
    ) -> Result<ResultObject, RemapMiddlewareError> {
        self.check_shape(num_rows)?;
        let num_cols = self.columns.len();

        let mut descriptors = reserve(num_cols)?;
        descriptors.extend(self.columns.into_iter().map(ColumnDescriptor::named));

        let mut result = ResultObject::empty(status);
        result.set_attributes(descriptors)?;
        result.reserve_rows(num_rows)?;

        for (idx, value) in self.values.iter().enumerate() {
            if let Some(bytes) = value {
                result.set_value(idx / num_cols, idx % num_cols, Some(bytes))?;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ResultObject {
        ResultObject::from_rows(
            ["a", "b", "c"],
            vec![
                vec![Some(b"1".to_vec()), None, Some(b"3".to_vec())],
                vec![Some(b"4".to_vec()), Some(b"5".to_vec()), Some(b"6".to_vec())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn value_set_is_row_major() {
        let result = source();
        let set = TabularValueSet::from_result(&result).unwrap();
        assert_eq!(set.columns(), &["a", "b", "c"]);
        assert_eq!(set.num_rows(), 2);
        assert_eq!(set.values()[1], None);
        assert_eq!(set.values()[3], Some(&b"4"[..]));
        assert_eq!(set.get(1, 2), Some(&b"6"[..]));
        assert_eq!(set.get(0, 3), None);
        assert_eq!(set.rows().count(), 2);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mapped = MappedValueSet::new(vec!["x".into(), "y".into()], vec![None; 3]);
        assert!(mapped.check_shape(2).is_err());
        assert!(mapped.into_result(ExecStatus::TuplesOk, 2).is_err());
    }

    #[test]
    fn builds_named_result_with_nulls() {
        let mapped = MappedValueSet::new(
            vec!["x".into(), "y".into()],
            vec![Some(b"a".to_vec()), None, Some(b"c".to_vec()), Some(b"d".to_vec())],
        );
        let result = mapped.into_result(ExecStatus::TuplesOk, 2).unwrap();
        assert_eq!(result.nfields(), 2);
        assert_eq!(result.ntuples(), 2);
        assert_eq!(result.fname(0), Some("x"));
        assert_eq!(result.column(1), Some(&ColumnDescriptor::named("y")));
        assert!(result.is_null(0, 1));
        assert_eq!(result.value(1, 0), Some(&b"c"[..]));
    }

    #[test]
    fn rows_survive_when_every_value_is_null() {
        let mapped = MappedValueSet::new(vec!["x".into()], vec![None, None, None]);
        let result = mapped.into_result(ExecStatus::TuplesOk, 3).unwrap();
        assert_eq!(result.ntuples(), 3);
    }

    #[test]
    fn passthrough_signal() {
        assert!(MappedValueSet::passthrough().is_passthrough());
        assert!(!MappedValueSet::new(vec!["x".into()], Vec::new()).is_passthrough());
    }
}
