use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Batch, Connection, Statement, params_from_iter};

use crate::error::RemapMiddlewareError;
use crate::results::{Cell, CellValue, ColumnDescriptor, ResultObject};
use crate::types::{ExecStatus, Oid, ValueFormat};

const INT8_OID: Oid = 20;
const FLOAT8_OID: Oid = 701;
const TEXT_OID: Oid = 25;
const BYTEA_OID: Oid = 17;

/// Render one `SQLite` value the way a text-format client would see it.
#[must_use]
pub fn render_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(CellValue::from_vec(i.to_string().into_bytes())),
        ValueRef::Real(f) => Some(CellValue::from_vec(f.to_string().into_bytes())),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(CellValue::new(t)),
    }
}

fn type_of(value: ValueRef<'_>) -> Option<(Oid, i16)> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(_) => Some((INT8_OID, 8)),
        ValueRef::Real(_) => Some((FLOAT8_OID, 8)),
        ValueRef::Text(_) => Some((TEXT_OID, -1)),
        ValueRef::Blob(_) => Some((BYTEA_OID, -1)),
    }
}

/// Run one prepared statement and materialise its outcome into a [`ResultObject`].
///
/// Statements without result columns produce a `CommandOk` result; everything else
/// produces `TuplesOk`, with column types taken from the first non-null value seen in
/// each column.
///
/// # Errors
/// Returns `RemapMiddlewareError::SqliteError` if binding or stepping fails.
pub fn build_result_object(
    stmt: &mut Statement<'_>,
    params: &[Value],
) -> Result<ResultObject, RemapMiddlewareError> {
    let column_count = stmt.column_count();
    if column_count == 0 {
        let changed = stmt.execute(params_from_iter(params.iter()))?;
        return Ok(ResultObject::empty(ExecStatus::CommandOk)
            .with_command_tag(format!("OK {changed}")));
    }

    let mut columns: Vec<ColumnDescriptor> = stmt
        .column_names()
        .iter()
        .map(|name| ColumnDescriptor::named(*name).with_format(ValueFormat::Text))
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut cursor = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for (idx, column) in columns.iter_mut().enumerate() {
            let value = row.get_ref(idx)?;
            if column.type_oid.is_none()
                && let Some((oid, size)) = type_of(value)
            {
                *column = std::mem::take(column).with_type(oid, size);
            }
            cells.push(render_value(value));
        }
        rows.push(cells);
    }

    let row_count = rows.len();
    let mut result = ResultObject::empty(ExecStatus::TuplesOk);
    result.set_attributes(columns)?;
    for row in rows {
        result.push_row(row)?;
    }
    Ok(result.with_command_tag(format!("SELECT {row_count}")))
}

/// Run every statement in `sql`, one result per statement. Stops at the first failing
/// statement, whose error becomes the last result. An empty string yields a single
/// `EmptyQuery` result.
#[must_use]
pub fn run_batch(conn: &Connection, sql: &str) -> Vec<ResultObject> {
    let mut results = Vec::new();
    let mut batch = Batch::new(conn, sql);
    loop {
        match batch.next() {
            Ok(Some(mut stmt)) => match build_result_object(&mut stmt, &[]) {
                Ok(result) => results.push(result),
                Err(err) => {
                    results.push(ResultObject::error(err.to_string()));
                    break;
                }
            },
            Ok(None) => break,
            Err(err) => {
                results.push(ResultObject::error(err.to_string()));
                break;
            }
        }
    }
    if results.is_empty() {
        results.push(ResultObject::empty(ExecStatus::EmptyQuery));
    }
    results
}

/// Prepare and run a single statement with parameters.
#[must_use]
pub fn run_single(conn: &Connection, sql: &str, params: &[Value], cached: bool) -> ResultObject {
    let prepared = if cached {
        conn.prepare_cached(sql).map(StatementHandle::Cached)
    } else {
        conn.prepare(sql).map(StatementHandle::Fresh)
    };
    let outcome = prepared
        .map_err(RemapMiddlewareError::from)
        .and_then(|mut handle| build_result_object(handle.statement(), params));
    outcome.unwrap_or_else(|err| ResultObject::error(err.to_string()))
}

enum StatementHandle<'conn> {
    Fresh(Statement<'conn>),
    Cached(rusqlite::CachedStatement<'conn>),
}

impl<'conn> StatementHandle<'conn> {
    fn statement(&mut self) -> &mut Statement<'conn> {
        match self {
            StatementHandle::Fresh(stmt) => stmt,
            StatementHandle::Cached(stmt) => &mut **stmt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER, name TEXT, score REAL);
             INSERT INTO t VALUES (1, 'alice', 1.5), (2, NULL, 2.0);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn select_renders_text_values() {
        let conn = conn();
        let result = run_single(&conn, "SELECT id, name, score FROM t ORDER BY id", &[], false);
        assert_eq!(result.status(), ExecStatus::TuplesOk);
        assert_eq!(result.ntuples(), 2);
        assert_eq!(result.value(0, 0), Some(&b"1"[..]));
        assert_eq!(result.value(0, 1), Some(&b"alice"[..]));
        assert!(result.is_null(1, 1));
        assert_eq!(result.column(0).unwrap().type_oid, Some(INT8_OID));
        assert_eq!(result.column(1).unwrap().type_oid, Some(TEXT_OID));
        assert_eq!(result.command_tag(), Some("SELECT 2"));
    }

    #[test]
    fn batch_returns_one_result_per_statement() {
        let conn = conn();
        let results = run_batch(&conn, "UPDATE t SET score = 0; SELECT count(*) FROM t;");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status(), ExecStatus::CommandOk);
        assert_eq!(results[0].command_tag(), Some("OK 2"));
        assert_eq!(results[1].value(0, 0), Some(&b"2"[..]));
    }

    #[test]
    fn batch_stops_at_first_error() {
        let conn = conn();
        let results = run_batch(&conn, "SELECT 1; SELECT * FROM missing; SELECT 2;");
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status(), ExecStatus::FatalError);
        assert!(results[1].error_message().unwrap().contains("missing"));
    }

    #[test]
    fn empty_batch() {
        let results = run_batch(&conn(), "  ");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status(), ExecStatus::EmptyQuery);
    }

    #[test]
    fn parameters_bind() {
        let conn = conn();
        let result = run_single(
            &conn,
            "SELECT name FROM t WHERE id = ?1",
            &[Value::Integer(1)],
            true,
        );
        assert_eq!(result.value(0, 0), Some(&b"alice"[..]));
    }
}
