/// Handle through which an engine runs auxiliary statements (for example to look up
/// schema or type information) before the main statement is sent.
///
/// Statements run through the client library's "execute and discard" primitive on the
/// same connection; their results never reach the caller.
pub struct SideStatements<'a> {
    exec: &'a mut dyn FnMut(&str) -> bool,
    issued: usize,
}

impl<'a> SideStatements<'a> {
    pub(crate) fn new(exec: &'a mut dyn FnMut(&str) -> bool) -> Self {
        Self { exec, issued: 0 }
    }

    /// Run `sql` and discard its results. Returns whether it succeeded.
    pub fn execute(&mut self, sql: &str) -> bool {
        self.issued += 1;
        tracing::debug!(sql, "running side statement");
        (self.exec)(sql)
    }

    /// Number of side statements issued so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued
    }
}
