use crate::types::{Oid, QueryParams, ValueFormat};

/// Whether an engine changed an outgoing statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    Rewritten,
    Unchanged,
}

/// Outgoing simple query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Outgoing parameterized query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsRequest {
    pub command: String,
    pub params: QueryParams,
    pub result_format: ValueFormat,
}

/// Outgoing prepare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareRequest {
    pub statement_name: String,
    pub query: String,
    pub param_types: Vec<Option<Oid>>,
}

/// Outgoing execution of a prepared statement. `params.types` is not sent; the types
/// were fixed when the statement was prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub statement_name: String,
    pub params: QueryParams,
    pub result_format: ValueFormat,
}
