//! Wrappers for the query-issuing entry points.
//!
//! Each wrapper keeps the wrapped primitive's signature and return value. With extension
//! state attached, the engine sees the outgoing statement first and may rewrite it;
//! without state, the call is forwarded unmodified after a degraded-mode diagnostic.

mod request;
mod side;

pub use request::{ParamsRequest, PrepareRequest, PreparedRequest, QueryRequest, Rewrite};
pub use side::SideStatements;

use crate::client::ClientLibrary;
use crate::diagnostics::{Diagnostic, EntryPoint};
use crate::engine::TransformEngine;
use crate::error::EngineError;
use crate::lifecycle::RemapConnection;
use crate::types::{Oid, QueryParams, ValueFormat};

/// What to do with an outgoing statement after offering it to the engine.
enum Interception {
    /// Forward the (possibly rewritten) request.
    Forward,
    /// The engine failed; do not send anything.
    Abort,
}

impl<C: ClientLibrary, E: TransformEngine> RemapConnection<C, E> {
    /// Offer `request` to the engine through `hook`, giving it access to side statements
    /// on this connection. Callers handle the degraded case before building a request.
    fn intercept<R>(
        &mut self,
        entry_point: EntryPoint,
        request: &mut R,
        hook: impl FnOnce(
            &E,
            &mut E::State,
            &mut R,
            &mut SideStatements<'_>,
        ) -> Result<Rewrite, EngineError>,
    ) -> Interception {
        let Self {
            shared,
            native,
            state,
        } = self;
        let Some(ext) = state.as_mut() else {
            return Interception::Forward;
        };

        let client = &shared.client;
        let mut exec = |sql: &str| client.exec_discard(native, sql);
        let mut side = SideStatements::new(&mut exec);
        match hook(&shared.engine, ext.get_mut(), request, &mut side) {
            Ok(rewrite) => {
                tracing::debug!(
                    entry_point = entry_point.name(),
                    rewritten = rewrite == Rewrite::Rewritten,
                    side_statements = side.issued(),
                    "statement offered to engine"
                );
                Interception::Forward
            }
            Err(error) => {
                shared.report(&Diagnostic::RewriteFailed { entry_point, error });
                Interception::Abort
            }
        }
    }

    /// Send a simple query.
    pub fn send_query(&mut self, query: &str) -> bool {
        if self.state.is_none() {
            self.shared.degraded(EntryPoint::SendQuery);
            return self.shared.client.send_query(&mut self.native, query);
        }

        let mut request = QueryRequest::new(query);
        match self.intercept(EntryPoint::SendQuery, &mut request, |engine, state, req, side| {
            engine.rewrite_query(state, req, side)
        }) {
            Interception::Forward => self
                .shared
                .client
                .send_query(&mut self.native, &request.query),
            Interception::Abort => false,
        }
    }

    /// Send a parameterized query.
    pub fn send_query_params(
        &mut self,
        command: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool {
        if self.state.is_none() {
            self.shared.degraded(EntryPoint::SendQueryParams);
            return self
                .shared
                .client
                .send_query_params(&mut self.native, command, params, result_format);
        }

        let mut request = ParamsRequest {
            command: command.to_owned(),
            params: params.clone(),
            result_format,
        };
        match self.intercept(
            EntryPoint::SendQueryParams,
            &mut request,
            |engine, state, req, side| engine.rewrite_params(state, req, side),
        ) {
            Interception::Forward => self.shared.client.send_query_params(
                &mut self.native,
                &request.command,
                &request.params,
                request.result_format,
            ),
            Interception::Abort => false,
        }
    }

    /// Prepare a named statement.
    pub fn send_prepare(
        &mut self,
        statement_name: &str,
        query: &str,
        param_types: &[Option<Oid>],
    ) -> bool {
        if self.state.is_none() {
            self.shared.degraded(EntryPoint::SendPrepare);
            return self.shared.client.send_prepare(
                &mut self.native,
                statement_name,
                query,
                param_types,
            );
        }

        let mut request = PrepareRequest {
            statement_name: statement_name.to_owned(),
            query: query.to_owned(),
            param_types: param_types.to_vec(),
        };
        match self.intercept(
            EntryPoint::SendPrepare,
            &mut request,
            |engine, state, req, side| engine.rewrite_prepare(state, req, side),
        ) {
            Interception::Forward => self.shared.client.send_prepare(
                &mut self.native,
                &request.statement_name,
                &request.query,
                &request.param_types,
            ),
            Interception::Abort => false,
        }
    }

    /// Execute a previously prepared statement.
    pub fn send_query_prepared(
        &mut self,
        statement_name: &str,
        params: &QueryParams,
        result_format: ValueFormat,
    ) -> bool {
        if self.state.is_none() {
            self.shared.degraded(EntryPoint::SendQueryPrepared);
            return self.shared.client.send_query_prepared(
                &mut self.native,
                statement_name,
                params,
                result_format,
            );
        }

        let mut request = PreparedRequest {
            statement_name: statement_name.to_owned(),
            params: params.clone(),
            result_format,
        };
        match self.intercept(
            EntryPoint::SendQueryPrepared,
            &mut request,
            |engine, state, req, side| engine.rewrite_prepared(state, req, side),
        ) {
            Interception::Forward => self.shared.client.send_query_prepared(
                &mut self.native,
                &request.statement_name,
                &request.params,
                request.result_format,
            ),
            Interception::Abort => false,
        }
    }
}
