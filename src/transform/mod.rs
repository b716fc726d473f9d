//! Transform implementations for provider tables
//!
//! Turns a [`RawTable`](crate::table::RawTable) into a normalized
//! [`Table`](crate::table::Table): explicit drops, declarative renames, and
//! appended derived columns.

mod column_map;
mod derived;
mod table_transformer;

pub use column_map::ColumnMap;
pub use derived::DerivedColumn;
pub use table_transformer::TableTransformer;
