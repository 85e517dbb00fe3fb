//! Conversion between client-library result objects and the value sets an engine sees.
//!
//! Engines never receive a [`ResultObject`](crate::results::ResultObject). The in-place
//! protocol works on a flat list of [`MappableCell`]s borrowed from the result; the
//! reconstruction protocol works on a [`TabularValueSet`] and answers with a
//! [`MappedValueSet`].

mod mappable;
mod value_set;

pub use mappable::{MappableCell, apply_lengths, mappable_cells, mapped_lengths, written_lengths};
pub use value_set::{MappedValueSet, TabularValueSet};

use crate::error::RemapMiddlewareError;

/// Allocate an empty vector able to hold `capacity` items, reporting allocation
/// failure instead of aborting.
pub(crate) fn reserve<T>(capacity: usize) -> Result<Vec<T>, RemapMiddlewareError> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(capacity)
        .map_err(|e| RemapMiddlewareError::AllocationError(e.to_string()))?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_reports_capacity_overflow() {
        let err = reserve::<u64>(usize::MAX).unwrap_err();
        assert!(matches!(err, RemapMiddlewareError::AllocationError(_)));
        assert!(reserve::<u8>(16).unwrap().capacity() >= 16);
    }
}
