//! The client-library primitives the adapter wraps.
//!
//! Instead of renaming and re-declaring the library's own entry points, the adapter is
//! handed an implementation of [`ClientLibrary`] and forwards to it. Tests substitute a
//! scripted implementation; the `sqlite` feature ships one over `rusqlite`.

use crate::results::ResultObject;
use crate::types::{ConnStatus, Oid, QueryParams, ValueFormat};

/// Blocking, libpq-style client primitives.
///
/// Send primitives return `true` when the command was dispatched and `false` otherwise.
/// Results are pulled one at a time with [`get_result`](Self::get_result) until it returns
/// `None`.
pub trait ClientLibrary {
    /// Native connection handle.
    type Conn;

    /// Open a connection from a `key=value` connection string. `None` only when no
    /// handle could be created at all; a failed attempt is a handle with a `Bad` status.
    fn connectdb(&self, conninfo: &str) -> Option<Self::Conn>;

    /// Open a connection from parallel keyword/value arrays. With `expand_dbname` a
    /// `dbname` value containing `=` is parsed as a connection string.
    fn connectdb_params(
        &self,
        keywords: &[&str],
        values: &[&str],
        expand_dbname: bool,
    ) -> Option<Self::Conn>;

    /// Begin a non-blocking connection attempt.
    fn connect_start(&self, conninfo: &str) -> Option<Self::Conn> {
        self.connectdb(conninfo)
    }

    /// Close and reopen the session behind `conn`.
    fn reset(&self, conn: &mut Self::Conn);

    fn status(&self, conn: &Self::Conn) -> ConnStatus;

    /// Logical database name of the session.
    fn db_name<'c>(&self, conn: &'c Self::Conn) -> &'c str;

    fn send_query(&self, conn: &mut Self::Conn, query: &str) -> bool;

    fn send_query_params(
        &self,
        conn: &mut Self::Conn,
        command: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool;

    fn send_prepare(
        &self,
        conn: &mut Self::Conn,
        statement_name: &str,
        query: &str,
        param_types: &[Option<Oid>],
    ) -> bool;

    fn send_query_prepared(
        &self,
        conn: &mut Self::Conn,
        statement_name: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool;

    /// Next result of the command in flight, `None` at end of stream.
    fn get_result(&self, conn: &mut Self::Conn) -> Option<ResultObject>;

    /// Execute `sql` and throw its results away. Returns whether it succeeded.
    fn exec_discard(&self, conn: &mut Self::Conn, sql: &str) -> bool;

    fn finish(&self, conn: Self::Conn);
}
