//! Report generation error taxonomy.

use polars::prelude::PolarsError;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::order::EnumKeyKind;

/// Errors surfaced by the report engine and its collaborators.
///
/// Cell-level problems are not represented here: they degrade to placeholder
/// cells instead of failing the sheet.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The key orderer has no comparator for this key kind.
    #[error("Row collection key kind is not orderable: {0:?}")]
    UnsupportedKeyType(EnumKeyKind),
    /// A key does not match the collection's key kind.
    #[error("Key kind mismatch: collection is keyed by {expected:?}, got {found:?}")]
    KeyTypeMismatch {
        /// Kind carried by the collection.
        expected: EnumKeyKind,
        /// Kind of the offending key.
        found: EnumKeyKind,
    },
    /// A structured record does not map 1:1 onto the column descriptors.
    #[error("Record has {found} fields but the report declares {expected} columns")]
    ColumnCountMismatch {
        /// Number of column descriptors.
        expected: usize,
        /// Number of record fields.
        found: usize,
    },
    /// Query execution failed in the SQLite data source.
    #[error("Query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Reading a DataFrame cell failed.
    #[error("DataFrame access failed: {0}")]
    Polars(#[from] PolarsError),
    /// A caller-supplied loader or data source reported a failure.
    #[error("Row source failed: {0}")]
    RowSource(String),
    /// The container rejected a sheet name.
    #[error("Invalid sheet name {name:?}: {reason}")]
    InvalidSheetName {
        /// Rejected name.
        name: String,
        /// Rejection reason.
        reason: String,
    },
    /// Sheet does not fit Excel worksheet limits.
    #[error("Sheet exceeds Excel limits: {0}")]
    SheetTooLarge(String),
    /// Row or column index does not fit the writer's index type.
    #[error("{axis} index overflow: {value}")]
    IndexOverflow {
        /// `row` or `column`.
        axis: &'static str,
        /// Offending index.
        value: usize,
    },
    /// Cell or sheet operation issued before any sheet/row exists.
    #[error("No active {0} in output container")]
    NoActiveTarget(&'static str),
    /// Workbook writer failure.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Multi-sheet output path is empty.
    #[error("Output file path is empty")]
    EmptyOutputPath,
    /// Writer already closed.
    #[error("Cannot write after close().")]
    Closed,
}
