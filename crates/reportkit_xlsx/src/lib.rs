//! `reportkit_xlsx` v1:
//! Tabular report assembly into styled xlsx sheets.
//!
//! Modules:
//! - `conf`      : limits, colors, number formats and default style presets
//! - `spec`      : specs/models/options
//! - `error`     : error taxonomy
//! - `util`      : pure helper functions (cell references, sheet names)
//! - `infer`     : type inference for numeric-looking text
//! - `cell`      : cell formatter
//! - `order`     : keyed row collections and the key orderer
//! - `source`    : data sources, result sets and row loaders
//! - `layout`    : sheet layout engine
//! - `container` : output containers
//! - `writer`    : multi-sheet orchestration and entry points
pub mod cell;
pub mod conf;
pub mod container;
pub mod error;
pub mod infer;
pub mod layout;
pub mod order;
pub mod source;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
pub use container::{MemoryContainer, OutputContainer, SpecRecordedSheet, XlsxContainer};
pub use error::ReportError;
pub use infer::{classify_numeric_token, infer_typed_value};
pub use layout::{plan_keyed_sheet, plan_result_set_sheet};
pub use order::{EnumKeyKind, EnumKeyValue, KeyComparator, KeyedRowSource, KeyedRows, order_keys};
pub use source::{DataSource, ReportData, ReportRecord, SpecResultSet, SqliteSource};
pub use spec::{
    EnumCellKind, EnumCellValue, EnumRawValue, EnumSheetErrorPolicy, EnumTypedValue,
    SpecCellFormat, SpecReportColumn, SpecReportConfig, SpecReportFormats, SpecReportOutcome,
    SpecReportParams, SpecSheetPlan, SpecSheetSummary, SpecStyledCell,
};
pub use writer::{
    ReportWriter, SpecMultiSheetQuery, SpecMultiSheetReport, excel_from_dataframe, excel_from_db,
    excel_multi_sheet, excel_multi_sheet_from_db, excel_report,
};
