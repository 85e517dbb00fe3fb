mod cell;
mod column;
mod result_set;

pub use cell::{Cell, CellValue};
pub use column::ColumnDescriptor;
pub use result_set::ResultObject;
