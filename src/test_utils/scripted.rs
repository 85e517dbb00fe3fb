use std::collections::VecDeque;

use crate::client::ClientLibrary;
use crate::results::ResultObject;
use crate::types::{ConnStatus, Oid, QueryParams, ValueFormat};

use super::EventLog;

/// One call into the scripted client library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Connect {
        conninfo: String,
    },
    ConnectParams {
        keywords: Vec<String>,
        values: Vec<String>,
        expand_dbname: bool,
    },
    ConnectStart {
        conninfo: String,
    },
    Reset,
    SendQuery {
        query: String,
    },
    SendQueryParams {
        command: String,
        params: QueryParams,
        result_format: ValueFormat,
    },
    SendPrepare {
        statement_name: String,
        query: String,
        param_types: Vec<Option<Oid>>,
    },
    SendQueryPrepared {
        statement_name: String,
        params: QueryParams,
        result_format: ValueFormat,
    },
    GetResult,
    ExecDiscard {
        sql: String,
    },
    Finish {
        db_name: String,
    },
}

/// Connection handle of a [`ScriptedClient`]. Results queued on it are handed out by
/// `get_result` in order.
#[derive(Debug)]
pub struct ScriptedConn {
    db_name: String,
    status: ConnStatus,
    reset_status: ConnStatus,
    queued: VecDeque<ResultObject>,
}

impl ScriptedConn {
    /// Queue a result for the next `get_result`.
    pub fn queue(&mut self, result: ResultObject) {
        self.queued.push_back(result);
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn set_status(&mut self, status: ConnStatus) {
        self.status = status;
    }
}

/// Scripted client library.
///
/// ```rust
/// use sql_remap_middleware::test_utils::{ClientCall, ScriptedClient};
/// use sql_remap_middleware::prelude::*;
///
/// let client = ScriptedClient::new("app");
/// let calls = client.calls();
/// let mut conn = client.connectdb("dbname=app").unwrap();
/// assert!(client.send_query(&mut conn, "SELECT 1"));
/// assert_eq!(calls.snapshot()[1], ClientCall::SendQuery { query: "SELECT 1".into() });
/// ```
#[derive(Debug)]
pub struct ScriptedClient {
    db_name: String,
    connect_status: ConnStatus,
    reset_status: ConnStatus,
    refuse_connect: bool,
    accept_sends: bool,
    side_statements_succeed: bool,
    calls: EventLog<ClientCall>,
}

impl ScriptedClient {
    /// A client whose connections succeed and report `db_name`.
    #[must_use]
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            connect_status: ConnStatus::Ok,
            reset_status: ConnStatus::Ok,
            refuse_connect: false,
            accept_sends: true,
            side_statements_succeed: true,
            calls: EventLog::default(),
        }
    }

    /// Status new connections report.
    #[must_use]
    pub fn with_status(mut self, status: ConnStatus) -> Self {
        self.connect_status = status;
        self
    }

    /// Status a connection reports after `reset`.
    #[must_use]
    pub fn with_reset_status(mut self, status: ConnStatus) -> Self {
        self.reset_status = status;
        self
    }

    /// Connect primitives return no handle at all.
    #[must_use]
    pub fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Send primitives report failure.
    #[must_use]
    pub fn rejecting_sends(mut self) -> Self {
        self.accept_sends = false;
        self
    }

    /// `exec_discard` reports failure.
    #[must_use]
    pub fn failing_side_statements(mut self) -> Self {
        self.side_statements_succeed = false;
        self
    }

    /// Handle on the call log.
    #[must_use]
    pub fn calls(&self) -> EventLog<ClientCall> {
        self.calls.clone()
    }

    fn open(&self, call: ClientCall) -> Option<ScriptedConn> {
        self.calls.push(call);
        if self.refuse_connect {
            return None;
        }
        Some(ScriptedConn {
            db_name: self.db_name.clone(),
            status: self.connect_status,
            reset_status: self.reset_status,
            queued: VecDeque::new(),
        })
    }

    fn send(&self, conn: &ScriptedConn, call: ClientCall) -> bool {
        self.calls.push(call);
        self.accept_sends && !conn.status.is_bad()
    }
}

impl ClientLibrary for ScriptedClient {
    type Conn = ScriptedConn;

    fn connectdb(&self, conninfo: &str) -> Option<ScriptedConn> {
        self.open(ClientCall::Connect {
            conninfo: conninfo.to_string(),
        })
    }

    fn connectdb_params(
        &self,
        keywords: &[&str],
        values: &[&str],
        expand_dbname: bool,
    ) -> Option<ScriptedConn> {
        self.open(ClientCall::ConnectParams {
            keywords: keywords.iter().map(ToString::to_string).collect(),
            values: values.iter().map(ToString::to_string).collect(),
            expand_dbname,
        })
    }

    fn connect_start(&self, conninfo: &str) -> Option<ScriptedConn> {
        self.open(ClientCall::ConnectStart {
            conninfo: conninfo.to_string(),
        })
    }

    fn reset(&self, conn: &mut ScriptedConn) {
        self.calls.push(ClientCall::Reset);
        conn.status = conn.reset_status;
        conn.queued.clear();
    }

    fn status(&self, conn: &ScriptedConn) -> ConnStatus {
        conn.status
    }

    fn db_name<'c>(&self, conn: &'c ScriptedConn) -> &'c str {
        &conn.db_name
    }

    fn send_query(&self, conn: &mut ScriptedConn, query: &str) -> bool {
        self.send(
            conn,
            ClientCall::SendQuery {
                query: query.to_string(),
            },
        )
    }

    fn send_query_params(
        &self,
        conn: &mut ScriptedConn,
        command: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool {
        self.send(
            conn,
            ClientCall::SendQueryParams {
                command: command.to_string(),
                params: params.clone(),
                result_format,
            },
        )
    }

    fn send_prepare(
        &self,
        conn: &mut ScriptedConn,
        statement_name: &str,
        query: &str,
        param_types: &[Option<Oid>],
    ) -> bool {
        self.send(
            conn,
            ClientCall::SendPrepare {
                statement_name: statement_name.to_string(),
                query: query.to_string(),
                param_types: param_types.to_vec(),
            },
        )
    }

    fn send_query_prepared(
        &self,
        conn: &mut ScriptedConn,
        statement_name: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool {
        self.send(
            conn,
            ClientCall::SendQueryPrepared {
                statement_name: statement_name.to_string(),
                params: params.clone(),
                result_format,
            },
        )
    }

    fn get_result(&self, conn: &mut ScriptedConn) -> Option<ResultObject> {
        self.calls.push(ClientCall::GetResult);
        conn.queued.pop_front()
    }

    fn exec_discard(&self, _conn: &mut ScriptedConn, sql: &str) -> bool {
        self.calls.push(ClientCall::ExecDiscard {
            sql: sql.to_string(),
        });
        self.side_statements_succeed
    }

    fn finish(&self, conn: ScriptedConn) {
        self.calls.push(ClientCall::Finish {
            db_name: conn.db_name,
        });
    }
}
