//! Connection lifecycle: attaching extension state on connect, releasing it on finish,
//! and clearing the per-statement value cache when a result stream ends.

use std::fmt;
use std::sync::Arc;

use crate::client::ClientLibrary;
use crate::config::RemapOptions;
use crate::diagnostics::{self, Diagnostic, EntryPoint};
use crate::engine::{ExtensionState, TransformEngine};
use crate::types::ConnStatus;

pub(crate) struct Shared<C, E> {
    pub(crate) client: C,
    pub(crate) engine: E,
    pub(crate) options: RemapOptions,
}

impl<C, E: TransformEngine> Shared<C, E> {
    pub(crate) fn report(&self, diagnostic: &Diagnostic) {
        diagnostics::emit(&self.engine, diagnostic);
    }

    pub(crate) fn degraded(&self, entry_point: EntryPoint) {
        if self.options.warn_degraded {
            self.report(&Diagnostic::Degraded { entry_point });
        }
    }
}

/// Entry point of the adapter: owns the client-library primitives and the engine, and
/// opens [`RemapConnection`]s.
///
/// Cloning is cheap; clones share the same client, engine and options.
///
/// # Examples
/// ```rust,no_run
/// use sql_remap_middleware::prelude::*;
/// # fn demo<E: TransformEngine>(engine: E) {
/// let middleware = RemapMiddleware::new(SqliteClient::new(), engine, RemapOptions::default());
/// if let Some(mut conn) = middleware.connectdb("dbname=app path=:memory:") {
///     conn.send_query("SELECT 1");
///     while let Some(result) = conn.get_result() {
///         println!("{:?}", result.value(0, 0));
///     }
///     conn.finish();
/// }
/// # }
/// ```
pub struct RemapMiddleware<C, E> {
    shared: Arc<Shared<C, E>>,
}

impl<C, E> Clone for RemapMiddleware<C, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C, E> fmt::Debug for RemapMiddleware<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemapMiddleware")
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}

impl<C: ClientLibrary, E: TransformEngine> RemapMiddleware<C, E> {
    #[must_use]
    pub fn new(client: C, engine: E, options: RemapOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                engine,
                options,
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> &RemapOptions {
        &self.shared.options
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.shared.client
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.shared.engine
    }

    /// Open a connection from a connection string and attach extension state.
    pub fn connectdb(&self, conninfo: &str) -> Option<RemapConnection<C, E>> {
        let native = self.shared.client.connectdb(conninfo)?;
        Some(self.attach(native))
    }

    /// Open a connection from keyword/value arrays and attach extension state.
    pub fn connectdb_params(
        &self,
        keywords: &[&str],
        values: &[&str],
        expand_dbname: bool,
    ) -> Option<RemapConnection<C, E>> {
        let native = self
            .shared
            .client
            .connectdb_params(keywords, values, expand_dbname)?;
        Some(self.attach(native))
    }

    /// Start a non-blocking connection and attach extension state.
    pub fn connect_start(&self, conninfo: &str) -> Option<RemapConnection<C, E>> {
        let native = self.shared.client.connect_start(conninfo)?;
        Some(self.attach(native))
    }

    fn attach(&self, native: C::Conn) -> RemapConnection<C, E> {
        let mut conn = RemapConnection {
            shared: Arc::clone(&self.shared),
            native,
            state: None,
        };
        conn.try_attach(EntryPoint::Connect);
        conn
    }
}

/// A client-library connection with (at most) one engine state attached.
///
/// Operations take `&mut self`, so a connection is used by one caller at a time, the
/// same way the underlying client library expects.
pub struct RemapConnection<C: ClientLibrary, E: TransformEngine> {
    pub(crate) shared: Arc<Shared<C, E>>,
    pub(crate) native: C::Conn,
    pub(crate) state: Option<ExtensionState<E::State>>,
}

impl<C: ClientLibrary, E: TransformEngine> fmt::Debug for RemapConnection<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemapConnection")
            .field("db_name", &self.db_name())
            .field("status", &self.status())
            .field("extension_state", &self.has_extension_state())
            .finish_non_exhaustive()
    }
}

impl<C: ClientLibrary, E: TransformEngine> RemapConnection<C, E> {
    #[must_use]
    pub fn status(&self) -> ConnStatus {
        self.shared.client.status(&self.native)
    }

    #[must_use]
    pub fn db_name(&self) -> &str {
        self.shared.client.db_name(&self.native)
    }

    /// Whether the connection is running with engine state (as opposed to degraded,
    /// pass-through mode).
    #[must_use]
    pub fn has_extension_state(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn extension_state(&self) -> Option<&ExtensionState<E::State>> {
        self.state.as_ref()
    }

    /// The client library's own handle.
    #[must_use]
    pub fn native(&self) -> &C::Conn {
        &self.native
    }

    /// Mutable access to the client library's own handle. Anything sent through it
    /// bypasses the engine.
    pub fn native_mut(&mut self) -> &mut C::Conn {
        &mut self.native
    }

    /// Reopen the session. Attached state is kept; a connection that had none gets
    /// state once the reset leaves it in a good status.
    pub fn reset(&mut self) {
        self.shared.client.reset(&mut self.native);
        if self.state.is_none() {
            self.try_attach(EntryPoint::Reset);
        }
    }

    /// Release engine state, then close the connection.
    pub fn finish(self) {
        let Self {
            shared,
            native,
            state,
        } = self;
        if let Some(ext) = state {
            tracing::debug!(db_name = ext.db_name(), "releasing extension state");
            if let Err(error) = shared.engine.teardown(ext.into_inner()) {
                shared.report(&Diagnostic::TeardownFailed { error });
            }
        }
        shared.client.finish(native);
    }

    fn try_attach(&mut self, entry_point: EntryPoint) {
        if self.status().is_bad() {
            tracing::debug!("connection is bad; no extension state attached");
            return;
        }
        let db_name = self.db_name().to_owned();
        match self.shared.engine.init(&db_name) {
            Ok(inner) => {
                tracing::debug!(db_name = %db_name, "extension state attached");
                self.state = Some(ExtensionState::new(db_name, inner));
            }
            Err(error) => {
                self.shared.report(&Diagnostic::InitFailed {
                    entry_point,
                    db_name,
                    error,
                });
            }
        }
    }

    /// The result stream ended: drop the engine's per-statement value cache.
    pub(crate) fn end_of_stream(&mut self) {
        let Some(ext) = self.state.as_mut() else {
            return;
        };
        if let Err(error) = self.shared.engine.clear_cache(ext.get_mut()) {
            self.shared
                .report(&Diagnostic::CacheClearFailed { error });
        }
    }
}
