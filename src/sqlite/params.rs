use rusqlite::types::Value;

use crate::types::{Oid, QueryParams, ValueFormat};

const BOOL_OID: Oid = 16;
const INT8_OID: Oid = 20;
const INT2_OID: Oid = 21;
const INT4_OID: Oid = 23;
const FLOAT4_OID: Oid = 700;
const FLOAT8_OID: Oid = 701;

/// Convert one wire-format parameter into a `SQLite` value.
///
/// Binary parameters bind as blobs. Text parameters bind as text unless a declared
/// integer, float or boolean type lets them be parsed into a native value.
#[must_use]
pub fn param_to_sqlite_value(
    value: Option<&[u8]>,
    declared: Option<Oid>,
    format: ValueFormat,
) -> Value {
    let Some(bytes) = value else {
        return Value::Null;
    };
    if format == ValueFormat::Binary {
        return Value::Blob(bytes.to_vec());
    }

    let text = String::from_utf8_lossy(bytes);
    let parsed = match declared {
        Some(INT2_OID | INT4_OID | INT8_OID) => text.trim().parse::<i64>().ok().map(Value::Integer),
        Some(FLOAT4_OID | FLOAT8_OID) => text.trim().parse::<f64>().ok().map(Value::Real),
        Some(BOOL_OID) => match text.trim() {
            "t" | "true" | "1" | "on" | "yes" => Some(Value::Integer(1)),
            "f" | "false" | "0" | "off" | "no" => Some(Value::Integer(0)),
            _ => None,
        },
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::Text(text.into_owned()))
}

/// Convert a full parameter list, using `declared` types where the list carries none
/// (prepared statements keep their types from the prepare step).
#[must_use]
pub fn convert_params(params: &QueryParams, declared: &[Option<Oid>]) -> Vec<Value> {
    params
        .values
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            let ty = params
                .types
                .get(idx)
                .copied()
                .flatten()
                .or_else(|| declared.get(idx).copied().flatten());
            param_to_sqlite_value(value.as_deref(), ty, params.format(idx))
        })
        .collect()
}
