use std::collections::{HashMap, VecDeque};
use std::fmt;

use rusqlite::Connection;

use crate::error::RemapMiddlewareError;
use crate::results::ResultObject;
use crate::types::{ConnStatus, ExecStatus, Oid, QueryParams, ValueFormat};

use super::config::SqliteConnInfo;
use super::params::convert_params;
use super::query::{run_batch, run_single};

struct PreparedEntry {
    query: String,
    param_types: Vec<Option<Oid>>,
}

/// One `SQLite` session driven through libpq-style send/get calls.
///
/// Commands run to completion when they are sent; their results queue up until the
/// caller drains them with [`get_result`](Self::get_result). A new command is refused
/// while results are still queued.
pub struct SqliteSession {
    info: Option<SqliteConnInfo>,
    conn: Option<Connection>,
    status: ConnStatus,
    pending: VecDeque<ResultObject>,
    prepared: HashMap<String, PreparedEntry>,
    error_message: Option<String>,
    db_name: String,
}

impl SqliteSession {
    pub(crate) fn open(info: Result<SqliteConnInfo, RemapMiddlewareError>) -> Self {
        let mut session = Self {
            info: None,
            conn: None,
            status: ConnStatus::Bad,
            pending: VecDeque::new(),
            prepared: HashMap::new(),
            error_message: None,
            db_name: String::new(),
        };
        match info {
            Ok(info) => {
                session.db_name.clone_from(&info.dbname);
                session.info = Some(info);
                session.connect();
            }
            Err(err) => {
                tracing::debug!(error = %err, "sqlite connection string rejected");
                session.error_message = Some(err.to_string());
            }
        }
        session
    }

    fn connect(&mut self) {
        let Some(info) = self.info.as_ref() else {
            self.status = ConnStatus::Bad;
            return;
        };
        match Connection::open_with_flags(&info.path, info.mode.flags()) {
            Ok(conn) => {
                tracing::debug!(path = %info.path, dbname = %info.dbname, "sqlite session opened");
                self.conn = Some(conn);
                self.status = ConnStatus::Ok;
                self.error_message = None;
            }
            Err(err) => {
                tracing::debug!(path = %info.path, error = %err, "sqlite open failed");
                self.conn = None;
                self.status = ConnStatus::Bad;
                self.error_message = Some(err.to_string());
            }
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnStatus {
        self.status
    }

    #[must_use]
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Last connection-level or dispatch error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub fn conn_info(&self) -> Option<&SqliteConnInfo> {
        self.info.as_ref()
    }

    /// Close and reopen. Prepared statements and queued results do not survive.
    pub fn reset(&mut self) {
        self.close();
        self.pending.clear();
        self.prepared.clear();
        self.connect();
    }

    pub fn send_query(&mut self, query: &str) -> bool {
        if !self.ready() {
            return false;
        }
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let results = run_batch(conn, query);
        self.pending.extend(results);
        true
    }

    pub fn send_query_params(
        &mut self,
        command: &str,
        params: &QueryParams,
        _result_format: ValueFormat,
    ) -> bool {
        if !self.ready() {
            return false;
        }
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let values = convert_params(params, &[]);
        let result = run_single(conn, command, &values, false);
        self.pending.push_back(result);
        true
    }

    pub fn send_prepare(
        &mut self,
        statement_name: &str,
        query: &str,
        param_types: &[Option<Oid>],
    ) -> bool {
        if !self.ready() {
            return false;
        }
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let result = if !statement_name.is_empty() && self.prepared.contains_key(statement_name) {
            ResultObject::error(format!(
                "prepared statement \"{statement_name}\" already exists"
            ))
        } else {
            match conn.prepare_cached(query) {
                Ok(_) => {
                    self.prepared.insert(
                        statement_name.to_string(),
                        PreparedEntry {
                            query: query.to_string(),
                            param_types: param_types.to_vec(),
                        },
                    );
                    ResultObject::empty(ExecStatus::CommandOk)
                }
                Err(err) => ResultObject::error(err.to_string()),
            }
        };
        self.pending.push_back(result);
        true
    }

    pub fn send_query_prepared(
        &mut self,
        statement_name: &str,
        params: &QueryParams,
        _result_format: ValueFormat,
    ) -> bool {
        if !self.ready() {
            return false;
        }
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let result = match self.prepared.get(statement_name) {
            Some(entry) => {
                let values = convert_params(params, &entry.param_types);
                run_single(conn, &entry.query, &values, true)
            }
            None => ResultObject::error(format!(
                "prepared statement \"{statement_name}\" does not exist"
            )),
        };
        self.pending.push_back(result);
        true
    }

    pub fn get_result(&mut self) -> Option<ResultObject> {
        self.pending.pop_front()
    }

    /// Run `sql` outside the result stream. Refused while results are queued.
    pub fn exec_discard(&mut self, sql: &str) -> bool {
        if !self.ready() {
            return false;
        }
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        match conn.execute_batch(sql) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "side statement failed");
                self.error_message = Some(err.to_string());
                false
            }
        }
    }

    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take()
            && let Err((_, err)) = conn.close()
        {
            tracing::warn!(error = %err, "sqlite close failed");
        }
        self.status = ConnStatus::Bad;
    }

    /// Whether the session can accept a new command.
    fn ready(&mut self) -> bool {
        if self.status.is_bad() || self.conn.is_none() {
            self.error_message = Some("connection is not open".to_string());
            return false;
        }
        if !self.pending.is_empty() {
            self.error_message = Some("another command is already in progress".to_string());
            return false;
        }
        true
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for SqliteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteSession")
            .field("db_name", &self.db_name)
            .field("status", &self.status)
            .field("pending", &self.pending.len())
            .field("prepared", &self.prepared.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> SqliteSession {
        SqliteSession::open(SqliteConnInfo::parse("dbname=test"))
    }

    fn drain(session: &mut SqliteSession) -> Vec<ResultObject> {
        std::iter::from_fn(|| session.get_result()).collect()
    }

    #[test]
    fn opens_in_memory() {
        let session = memory();
        assert_eq!(session.status(), ConnStatus::Ok);
        assert_eq!(session.db_name(), "test");
        assert!(session.error_message().is_none());
    }

    #[test]
    fn bad_conninfo_is_bad_status() {
        let session = SqliteSession::open(SqliteConnInfo::parse("bogus=1"));
        assert!(session.status().is_bad());
        assert!(session.error_message().unwrap().contains("bogus"));
    }

    #[test]
    fn refuses_new_command_while_results_pending() {
        let mut session = memory();
        assert!(session.send_query("SELECT 1"));
        assert!(!session.send_query("SELECT 2"));
        assert!(!session.exec_discard("SELECT 3"));
        assert_eq!(drain(&mut session).len(), 1);
        assert!(session.send_query("SELECT 2"));
    }

    #[test]
    fn prepare_then_execute() {
        let mut session = memory();
        assert!(session.exec_discard("CREATE TABLE t (id INTEGER, name TEXT)"));
        assert!(session.exec_discard("INSERT INTO t VALUES (1, 'a'), (2, 'b')"));

        assert!(session.send_prepare("by_id", "SELECT name FROM t WHERE id = ?1", &[Some(23)]));
        let prepared = drain(&mut session);
        assert_eq!(prepared[0].status(), ExecStatus::CommandOk);

        assert!(session.send_query_prepared("by_id", &QueryParams::text(["2"]), ValueFormat::Text));
        let results = drain(&mut session);
        assert_eq!(results[0].value(0, 0), Some(&b"b"[..]));

        assert!(session.send_prepare("by_id", "SELECT 1", &[]));
        assert_eq!(drain(&mut session)[0].status(), ExecStatus::FatalError);
    }

    #[test]
    fn unknown_prepared_statement() {
        let mut session = memory();
        assert!(session.send_query_prepared("nope", &QueryParams::default(), ValueFormat::Text));
        let results = drain(&mut session);
        assert_eq!(results[0].status(), ExecStatus::FatalError);
        assert!(results[0].error_message().unwrap().contains("does not exist"));
    }

    #[test]
    fn reset_drops_prepared_statements() {
        let mut session = memory();
        assert!(session.send_prepare("s", "SELECT 1", &[]));
        drain(&mut session);
        session.reset();
        assert_eq!(session.status(), ConnStatus::Ok);
        assert!(session.send_query_prepared("s", &QueryParams::default(), ValueFormat::Text));
        assert_eq!(drain(&mut session)[0].status(), ExecStatus::FatalError);
    }
}
