use crate::types::{Oid, ValueFormat};

/// Metadata describing one result column.
///
/// Every field except the name is optional: a reconstructed result only knows the
/// names an engine returned, so type and table provenance are left unset there.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDescriptor {
    /// The column name
    pub name: String,
    /// Table the column was read from, if it came straight from a table
    pub table_oid: Option<Oid>,
    /// Column number within that table
    pub column_number: Option<i16>,
    /// Data type of the column
    pub type_oid: Option<Oid>,
    /// Storage size of the type (negative for variable length)
    pub type_size: Option<i16>,
    /// Type-specific modifier such as a varchar length
    pub type_modifier: Option<i32>,
    /// Encoding of the values in this column
    pub format: ValueFormat,
}

impl ColumnDescriptor {
    /// A descriptor carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_oid: Oid, type_size: i16) -> Self {
        self.type_oid = Some(type_oid);
        self.type_size = Some(type_size);
        self
    }

    #[must_use]
    pub fn with_table(mut self, table_oid: Oid, column_number: i16) -> Self {
        self.table_oid = Some(table_oid);
        self.column_number = Some(column_number);
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }
}
