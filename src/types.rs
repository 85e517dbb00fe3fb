use serde::{Deserialize, Serialize};

/// Object identifier used for type and table provenance, as in the `PostgreSQL` catalogs.
pub type Oid = u32;

/// Status of a connection handle as reported by the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStatus {
    /// Connection is usable.
    Ok,
    /// Connection attempt failed or the session was lost.
    Bad,
    /// Non-blocking connection attempt still in progress.
    Started,
}

impl ConnStatus {
    /// Whether the handle is unusable. Bad handles never get extension state.
    #[must_use]
    pub fn is_bad(self) -> bool {
        matches!(self, ConnStatus::Bad)
    }
}

/// Overall status of a result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecStatus {
    /// Empty query string was executed.
    EmptyQuery,
    /// Command completed and returned no rows.
    CommandOk,
    /// Query completed and returned rows (possibly zero).
    TuplesOk,
    /// Non-fatal notice or warning.
    NonfatalError,
    /// Command failed.
    FatalError,
}

/// Encoding of a parameter or result value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueFormat {
    #[default]
    Text,
    Binary,
}

impl ValueFormat {
    /// Numeric code used by libpq-style APIs (`0` text, `1` binary).
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            ValueFormat::Text => 0,
            ValueFormat::Binary => 1,
        }
    }

    #[must_use]
    pub fn from_code(code: i32) -> Self {
        if code == 1 {
            ValueFormat::Binary
        } else {
            ValueFormat::Text
        }
    }
}

/// Positional parameters for parameterized and prepared sends.
///
/// Mirrors the parallel arrays of a libpq-style call (`paramTypes`, `paramValues`,
/// `paramLengths`, `paramFormats`) but keeps them in one owned value so an engine
/// can rewrite any subset without touching the others:
/// ```rust
/// use sql_remap_middleware::prelude::*;
///
/// let params = QueryParams::text(["alice", "42"]);
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.lengths(), vec![5, 2]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Declared parameter types; `None` lets the server infer the type.
    pub types: Vec<Option<Oid>>,
    /// Parameter values; `None` is SQL NULL.
    pub values: Vec<Option<Vec<u8>>>,
    /// Per-parameter formats.
    pub formats: Vec<ValueFormat>,
}

impl QueryParams {
    /// Build text-format parameters with inferred types.
    pub fn text<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<Option<Vec<u8>>> = values
            .into_iter()
            .map(|v| Some(v.as_ref().as_bytes().to_vec()))
            .collect();
        Self {
            types: vec![None; values.len()],
            formats: vec![ValueFormat::Text; values.len()],
            values,
        }
    }

    /// Append one parameter.
    pub fn push(&mut self, ty: Option<Oid>, value: Option<Vec<u8>>, format: ValueFormat) {
        self.types.push(ty);
        self.values.push(value);
        self.formats.push(format);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Byte lengths derived from the current values (`0` for NULL). Lengths are never
    /// stored separately.
    #[must_use]
    pub fn lengths(&self) -> Vec<usize> {
        self.values
            .iter()
            .map(|v| v.as_ref().map_or(0, Vec::len))
            .collect()
    }

    /// Format of parameter `idx`, defaulting to text when the formats array is short.
    #[must_use]
    pub fn format(&self, idx: usize) -> ValueFormat {
        self.formats.get(idx).copied().unwrap_or_default()
    }
}
