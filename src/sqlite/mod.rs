// SQLite module - a bundled libpq-style client over rusqlite
//
// This module is split into several sub-modules:
// - config: connection string parsing and open flags
// - params: parameter conversion from wire format to SQLite values
// - query: statement execution and result materialisation
// - connection: the session behind each handle

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use config::{OpenMode, SqliteConnInfo};
pub use connection::SqliteSession;

use crate::client::ClientLibrary;
use crate::results::ResultObject;
use crate::types::{ConnStatus, Oid, QueryParams, ValueFormat};

/// [`ClientLibrary`] implementation backed by `rusqlite`.
///
/// Connection strings take `dbname`, `path` and `mode`; see [`SqliteConnInfo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteClient;

impl SqliteClient {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ClientLibrary for SqliteClient {
    type Conn = SqliteSession;

    fn connectdb(&self, conninfo: &str) -> Option<SqliteSession> {
        Some(SqliteSession::open(SqliteConnInfo::parse(conninfo)))
    }

    fn connectdb_params(
        &self,
        keywords: &[&str],
        values: &[&str],
        expand_dbname: bool,
    ) -> Option<SqliteSession> {
        Some(SqliteSession::open(SqliteConnInfo::from_params(
            keywords,
            values,
            expand_dbname,
        )))
    }

    fn reset(&self, conn: &mut SqliteSession) {
        conn.reset();
    }

    fn status(&self, conn: &SqliteSession) -> ConnStatus {
        conn.status()
    }

    fn db_name<'c>(&self, conn: &'c SqliteSession) -> &'c str {
        conn.db_name()
    }

    fn send_query(&self, conn: &mut SqliteSession, query: &str) -> bool {
        conn.send_query(query)
    }

    fn send_query_params(
        &self,
        conn: &mut SqliteSession,
        command: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool {
        conn.send_query_params(command, params, result_format)
    }

    fn send_prepare(
        &self,
        conn: &mut SqliteSession,
        statement_name: &str,
        query: &str,
        param_types: &[Option<Oid>],
    ) -> bool {
        conn.send_prepare(statement_name, query, param_types)
    }

    fn send_query_prepared(
        &self,
        conn: &mut SqliteSession,
        statement_name: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool {
        conn.send_query_prepared(statement_name, params, result_format)
    }

    fn get_result(&self, conn: &mut SqliteSession) -> Option<ResultObject> {
        conn.get_result()
    }

    fn exec_discard(&self, conn: &mut SqliteSession, sql: &str) -> bool {
        conn.exec_discard(sql)
    }

    fn finish(&self, mut conn: SqliteSession) {
        conn.close();
    }
}
