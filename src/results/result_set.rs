use crate::error::RemapMiddlewareError;
use crate::types::ExecStatus;

use super::cell::{Cell, CellValue};
use super::column::ColumnDescriptor;

/// A result object as produced by a client library.
///
/// Rows are ordered sequences of nullable cells aligned to a shared list of column
/// descriptors. The introspection methods follow the usual libpq conventions: out of
/// range cells read as NULL with length zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultObject {
    status: ExecStatus,
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Vec<Cell>>,
    command_tag: Option<String>,
    error_message: Option<String>,
}

impl ResultObject {
    /// Allocate an empty result with the given status and no columns.
    #[must_use]
    pub fn empty(status: ExecStatus) -> Self {
        Self {
            status,
            columns: Vec::new(),
            rows: Vec::new(),
            command_tag: None,
            error_message: None,
        }
    }

    /// A `FatalError` result carrying `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let mut result = Self::empty(ExecStatus::FatalError);
        result.error_message = Some(message.into());
        result
    }

    /// Build a `TuplesOk` result from column names and rows of optional bytes.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ExecutionError` if a row is not as wide as the
    /// column list.
    pub fn from_rows<N, R>(names: N, rows: R) -> Result<Self, RemapMiddlewareError>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        R: IntoIterator<Item = Vec<Option<Vec<u8>>>>,
    {
        let mut result = Self::empty(ExecStatus::TuplesOk);
        result.set_attributes(names.into_iter().map(ColumnDescriptor::named).collect())?;
        for row in rows {
            result.push_row(row.into_iter().map(|v| v.map(CellValue::from_vec)).collect())?;
        }
        Ok(result)
    }

    #[must_use]
    pub fn with_command_tag(mut self, tag: impl Into<String>) -> Self {
        self.command_tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn status(&self) -> ExecStatus {
        self.status
    }

    /// Number of rows.
    #[must_use]
    pub fn ntuples(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn nfields(&self) -> usize {
        self.columns.len()
    }

    /// Name of column `col`.
    #[must_use]
    pub fn fname(&self, col: usize) -> Option<&str> {
        self.columns.get(col).map(|c| c.name.as_str())
    }

    /// Index of the first column named `name`.
    #[must_use]
    pub fn fnumber(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    #[must_use]
    pub fn column(&self, col: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(col)
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    #[must_use]
    pub fn is_null(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_none()
    }

    /// Bytes of a cell, `None` for NULL or out of range.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> Option<&[u8]> {
        self.cell(row, col).map(CellValue::as_bytes)
    }

    /// Reported length of a cell, `0` for NULL or out of range.
    #[must_use]
    pub fn length(&self, row: usize, col: usize) -> usize {
        self.cell(row, col).map_or(0, CellValue::len)
    }

    #[must_use]
    pub fn command_tag(&self) -> Option<&str> {
        self.command_tag.as_deref()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Install the column descriptor list on a result that has none yet.
    ///
    /// Rows reserved before the descriptors were set are widened with NULL cells.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ExecutionError` if descriptors were already set,
    /// or `RemapMiddlewareError::AllocationError` if existing rows cannot be widened.
    pub fn set_attributes(
        &mut self,
        columns: Vec<ColumnDescriptor>,
    ) -> Result<(), RemapMiddlewareError> {
        if !self.columns.is_empty() {
            return Err(RemapMiddlewareError::ExecutionError(
                "column descriptors already set on this result".to_string(),
            ));
        }
        let width = columns.len();
        for row in &mut self.rows {
            row.try_reserve_exact(width.saturating_sub(row.len()))
                .map_err(|e| RemapMiddlewareError::AllocationError(e.to_string()))?;
            row.resize_with(width, || None);
        }
        self.columns = columns;
        Ok(())
    }

    /// Grow the result to `count` rows; new rows are all NULL.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::AllocationError` if the rows cannot be allocated.
    pub fn reserve_rows(&mut self, count: usize) -> Result<(), RemapMiddlewareError> {
        let additional = count.saturating_sub(self.rows.len());
        self.rows
            .try_reserve_exact(additional)
            .map_err(|e| RemapMiddlewareError::AllocationError(e.to_string()))?;
        let width = self.columns.len();
        self.rows.resize_with(count.max(self.rows.len()), || vec![None; width]);
        Ok(())
    }

    /// Set cell (`row`, `col`) to a copy of `value`, or NULL for `None`.
    ///
    /// Writing one past the last row appends a new row.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ExecutionError` if `col` is not a column of this
    /// result or `row` is more than one past the end.
    pub fn set_value(
        &mut self,
        row: usize,
        col: usize,
        value: Option<&[u8]>,
    ) -> Result<(), RemapMiddlewareError> {
        if col >= self.columns.len() {
            return Err(RemapMiddlewareError::ExecutionError(format!(
                "column {col} out of range for a result with {} columns",
                self.columns.len()
            )));
        }
        if row > self.rows.len() {
            return Err(RemapMiddlewareError::ExecutionError(format!(
                "row {row} out of range for a result with {} rows",
                self.rows.len()
            )));
        }
        if row == self.rows.len() {
            self.reserve_rows(row + 1)?;
        }
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|cells| cells.get_mut(col))
            .ok_or_else(|| {
                RemapMiddlewareError::ExecutionError(format!(
                    "cell ({row}, {col}) is missing from this result"
                ))
            })?;
        *cell = value.map(CellValue::new);
        Ok(())
    }

    /// Append a fully built row.
    ///
    /// # Errors
    /// Returns `RemapMiddlewareError::ExecutionError` if the row width does not match.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), RemapMiddlewareError> {
        if row.len() != self.columns.len() {
            return Err(RemapMiddlewareError::ExecutionError(format!(
                "row has {} cells but the result has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub(crate) fn set_command_tag(&mut self, tag: Option<String>) {
        self.command_tag = tag;
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Vec<Cell>] {
        &mut self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultObject {
        ResultObject::from_rows(
            ["id", "name"],
            vec![
                vec![Some(b"1".to_vec()), Some(b"alice".to_vec())],
                vec![Some(b"2".to_vec()), None],
            ],
        )
        .unwrap()
    }

    #[test]
    fn introspection() {
        let result = sample();
        assert_eq!(result.status(), ExecStatus::TuplesOk);
        assert_eq!(result.ntuples(), 2);
        assert_eq!(result.nfields(), 2);
        assert_eq!(result.fname(1), Some("name"));
        assert_eq!(result.fnumber("name"), Some(1));
        assert_eq!(result.value(0, 1), Some(&b"alice"[..]));
        assert_eq!(result.length(0, 1), 5);
        assert!(result.is_null(1, 1));
        assert_eq!(result.length(1, 1), 0);
    }

    #[test]
    fn out_of_range_reads_as_null() {
        let result = sample();
        assert!(result.is_null(9, 0));
        assert!(result.is_null(0, 9));
        assert_eq!(result.value(9, 9), None);
        assert_eq!(result.fname(2), None);
    }

    #[test]
    fn construction_primitives() {
        let mut result = ResultObject::empty(ExecStatus::TuplesOk);
        result
            .set_attributes(vec![ColumnDescriptor::named("a"), ColumnDescriptor::named("b")])
            .unwrap();
        assert!(result.set_attributes(vec![ColumnDescriptor::named("c")]).is_err());

        result.set_value(0, 1, Some(b"x")).unwrap();
        assert_eq!(result.ntuples(), 1);
        assert!(result.is_null(0, 0));
        assert_eq!(result.value(0, 1), Some(&b"x"[..]));

        assert!(result.set_value(0, 2, Some(b"y")).is_err());
        assert!(result.set_value(5, 0, Some(b"y")).is_err());

        result.reserve_rows(3).unwrap();
        assert_eq!(result.ntuples(), 3);
        assert!(result.is_null(2, 1));
    }

    #[test]
    fn rows_reserved_before_attributes_are_widened() {
        let mut result = ResultObject::empty(ExecStatus::TuplesOk);
        result.reserve_rows(1).unwrap();
        result.set_attributes(vec![ColumnDescriptor::named("a")]).unwrap();
        assert!(result.is_null(0, 0));

        result.set_value(0, 0, Some(b"v")).unwrap();
        assert_eq!(result.value(0, 0), Some(&b"v"[..]));
    }

    #[test]
    fn set_value_on_a_short_row_is_an_error() {
        let mut result = ResultObject::empty(ExecStatus::TuplesOk);
        result.rows.push(Vec::new());
        result.columns.push(ColumnDescriptor::named("a"));
        assert!(matches!(
            result.set_value(0, 0, Some(b"v")),
            Err(RemapMiddlewareError::ExecutionError(_))
        ));
    }

    #[test]
    fn push_row_checks_width() {
        let mut result = sample();
        assert!(result.push_row(vec![None]).is_err());
        assert!(result.push_row(vec![None, None]).is_ok());
        assert_eq!(result.ntuples(), 3);
    }
}
