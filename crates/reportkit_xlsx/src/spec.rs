//! Shared report specification models.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::conf::derive_default_report_formats;
use crate::util::derive_default_sheet_name;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell style descriptor, converted to a writer format only by the container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Number format code.
    pub num_format: Option<String>,
    /// Solid background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Style presets consumed by the cell formatter and the layout engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportFormats {
    /// Short text cells.
    pub text: SpecCellFormat,
    /// Integer cells.
    pub integer: SpecCellFormat,
    /// Plain decimal cells.
    pub numeric: SpecCellFormat,
    /// Thousands-grouped decimal cells.
    pub decimal: SpecCellFormat,
    /// Percent cells.
    pub percent: SpecCellFormat,
    /// Currency cells.
    pub currency: SpecCellFormat,
    /// Date cells (alignment only).
    pub date: SpecCellFormat,
    /// Column header cells.
    pub header: SpecCellFormat,
    /// Report title cell.
    pub title: SpecCellFormat,
    /// Patch merged into every cell of an alternate row.
    pub alternate: SpecCellFormat,
    /// Subtotal row cell of a non-aggregate column.
    pub subtotal_plain: SpecCellFormat,
    /// Subtotal row cell of an aggregate column.
    pub subtotal_aggregate: SpecCellFormat,
}

impl Default for SpecReportFormats {
    fn default() -> Self {
        derive_default_report_formats()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueSpecification

/// Semantic output category of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellKind {
    /// Integer display.
    Integer,
    /// Literal text.
    ShortText,
    /// Plain decimal.
    Numeric,
    /// Thousands-grouped with 2 decimals.
    DecimalWithThousands,
    /// Percentage with 2 decimals.
    Percent,
    /// Currency symbol, thousands grouping, 2 decimals.
    Currency,
    /// Date/time value.
    Date,
}

/// Value tagged with its semantic cell kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumTypedValue {
    /// See [`EnumCellKind::Integer`].
    Integer(i64),
    /// See [`EnumCellKind::ShortText`].
    ShortText(String),
    /// See [`EnumCellKind::Numeric`].
    Numeric(f64),
    /// See [`EnumCellKind::DecimalWithThousands`].
    Decimal(f64),
    /// See [`EnumCellKind::Percent`]. Stored as a ratio (`0.5` is 50%).
    Percent(f64),
    /// See [`EnumCellKind::Currency`].
    Currency(f64),
    /// See [`EnumCellKind::Date`].
    Date(NaiveDateTime),
    /// Field whose type has no semantic kind; carries the type name.
    Unrecognized(String),
}

impl EnumTypedValue {
    /// Semantic kind, `None` for [`EnumTypedValue::Unrecognized`].
    pub fn kind(&self) -> Option<EnumCellKind> {
        match self {
            Self::Integer(_) => Some(EnumCellKind::Integer),
            Self::ShortText(_) => Some(EnumCellKind::ShortText),
            Self::Numeric(_) => Some(EnumCellKind::Numeric),
            Self::Decimal(_) => Some(EnumCellKind::DecimalWithThousands),
            Self::Percent(_) => Some(EnumCellKind::Percent),
            Self::Currency(_) => Some(EnumCellKind::Currency),
            Self::Date(_) => Some(EnumCellKind::Date),
            Self::Unrecognized(_) => None,
        }
    }
}

impl From<i64> for EnumTypedValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for EnumTypedValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<String> for EnumTypedValue {
    fn from(value: String) -> Self {
        Self::ShortText(value)
    }
}

impl From<&str> for EnumTypedValue {
    fn from(value: &str) -> Self {
        Self::ShortText(value.to_string())
    }
}

impl From<f64> for EnumTypedValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<f32> for EnumTypedValue {
    fn from(value: f32) -> Self {
        Self::Currency(f64::from(value))
    }
}

impl From<NaiveDateTime> for EnumTypedValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

impl From<bool> for EnumTypedValue {
    fn from(_value: bool) -> Self {
        Self::Unrecognized("bool".to_string())
    }
}

/// Loosely-typed scalar as returned by a result set.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumRawValue {
    /// SQL `NULL` / missing.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating value.
    Real(f64),
    /// Text value; its semantic kind is inferred.
    Text(String),
    /// Timestamp value.
    Timestamp(NaiveDateTime),
    /// Boolean value.
    Boolean(bool),
    /// Binary payload.
    Blob(Vec<u8>),
}

impl EnumRawValue {
    /// Short runtime kind name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Boolean(_) => "boolean",
            Self::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for EnumRawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(val) => write!(f, "{val}"),
            Self::Real(val) => write!(f, "{val}"),
            Self::Text(val) => write!(f, "{val}"),
            Self::Timestamp(val) => write!(f, "{val}"),
            Self::Boolean(val) => write!(f, "{val}"),
            Self::Blob(val) => write!(f, "<{} bytes>", val.len()),
        }
    }
}

/// Normalized cell content handed to the output container.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Blank cell (style only).
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Date/time value.
    DateTime(NaiveDateTime),
    /// Formula with cached result.
    Formula {
        /// Formula text including the leading `=`.
        formula: String,
        /// Cached result shown before recalculation.
        result: f64,
    },
}

/// One styled cell of a sheet plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecStyledCell {
    /// Cell content.
    pub value: EnumCellValue,
    /// Cell style.
    pub format: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportParameters

/// Report column descriptor; order defines left-to-right placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportColumn {
    /// Header text.
    pub title: String,
    /// Emit a subtotal formula for this column.
    pub if_aggregate: bool,
}

impl SpecReportColumn {
    /// Column without subtotal.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            if_aggregate: false,
        }
    }

    /// Column with subtotal.
    pub fn aggregate(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            if_aggregate: true,
        }
    }
}

/// Caller-facing report descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReportParams {
    /// Report title.
    pub title: String,
    /// Explicit sheet name; defaults to the truncated title.
    pub sheet_name: Option<String>,
    /// Column descriptors.
    pub columns: Vec<SpecReportColumn>,
    /// Query text executed against the data source.
    pub query: String,
    /// Output path for single-sheet entry points.
    pub file_out: Option<PathBuf>,
    /// Suppress the title block.
    pub if_no_title_row: bool,
    /// Shade every other data row.
    pub if_alt_bg: bool,
    /// Add an auto-filter over header and data.
    pub if_auto_filter: bool,
}

impl SpecReportParams {
    /// Sheet name, falling back to the title truncated to 30 characters.
    pub fn resolve_sheet_name(&self) -> String {
        match &self.sheet_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => derive_default_sheet_name(&self.title),
        }
    }

    /// Output path, falling back to `<title>.xlsx`.
    pub fn resolve_file_out(&self) -> PathBuf {
        self.file_out
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.xlsx", self.title)))
    }

    /// Whether the column titled `title` is flagged as an aggregate.
    pub fn is_aggregate_title(&self, title: &str) -> bool {
        self.columns
            .iter()
            .any(|col| col.if_aggregate && col.title == title)
    }
}

/// What a multi-sheet run does when one sheet fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSheetErrorPolicy {
    /// Record the failure, skip the sheet, keep going and save.
    #[default]
    Skip,
    /// Return the first sheet failure without saving.
    Abort,
}

/// Engine configuration threaded through every entry point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReportConfig {
    /// Report sheet progress and cell fallbacks.
    pub if_verbose: bool,
    /// Report per-sheet timing.
    pub if_debug: bool,
    /// Never infer a semantic kind for text values.
    pub if_untouch_strings: bool,
    /// Column names whose text values are never inferred.
    pub cols_untouched: BTreeSet<String>,
    /// Multi-sheet failure policy.
    pub rule_sheet_error: EnumSheetErrorPolicy,
}

impl SpecReportConfig {
    /// Whether text in `column` must stay literal.
    pub fn is_untouched_column(&self, column: &str) -> bool {
        self.if_untouch_strings || self.cols_untouched.contains(column)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetPlanSpecification

/// Auto-filter rectangle over header and data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutoFilterRect {
    /// Zero-based first row (the header row).
    pub row_first: usize,
    /// Zero-based first column.
    pub col_first: usize,
    /// Zero-based last row.
    pub row_last: usize,
    /// Zero-based last column.
    pub col_last: usize,
    /// Top-left cell in A1 notation.
    pub cell_top_left: String,
    /// Bottom-right cell in A1 notation.
    pub cell_bottom_right: String,
}

impl SpecAutoFilterRect {
    /// Range text such as `A1:C4`.
    pub fn to_range(&self) -> String {
        format!("{}:{}", self.cell_top_left, self.cell_bottom_right)
    }
}

/// Complete styled-cell sequence of one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetPlan {
    /// Target sheet name.
    pub sheet_name: String,
    /// Rows top to bottom; an empty row is a spacer.
    pub rows: Vec<Vec<SpecStyledCell>>,
    /// Width per emitted column.
    pub column_widths: Vec<f64>,
    /// Auto-filter rectangle, when requested.
    pub auto_filter: Option<SpecAutoFilterRect>,
    /// 1-based header row index (1 or 4).
    pub row_header: usize,
    /// Number of data rows.
    pub n_rows_data: usize,
    /// Number of columns.
    pub n_cols: usize,
    /// Cell-level degradations applied while planning.
    pub warnings: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Summary of one committed sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSummary {
    /// Sheet name in the container.
    pub sheet_name: String,
    /// Number of data rows.
    pub n_rows_data: usize,
    /// Number of columns.
    pub n_cols: usize,
    /// Auto-filter range text, when set.
    pub auto_filter: Option<String>,
}

/// One sheet that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetError {
    /// Requested sheet name.
    pub sheet_name: String,
    /// Error text.
    pub message: String,
}

/// Per-run report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReportOutcome {
    /// Sheets committed to the container.
    pub sheets: Vec<SpecSheetSummary>,
    /// Sheets that failed and were skipped.
    pub errors: Vec<SpecSheetError>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecReportOutcome {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Record a skipped sheet.
    pub fn add_error(&mut self, sheet_name: &str, message: impl fmt::Display) {
        self.errors.push(SpecSheetError {
            sheet_name: sheet_name.to_string(),
            message: message.to_string(),
        });
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_sheet_name_truncates_title_to_30_chars() {
        let params = SpecReportParams {
            title: "Quarterly Revenue By Region And Product".to_string(),
            ..Default::default()
        };
        assert_eq!(params.resolve_sheet_name(), "Quarterly Revenue By Region An");
        assert_eq!(params.resolve_sheet_name().chars().count(), 30);

        let params = SpecReportParams {
            title: "Quarterly Revenue By Region And Product".to_string(),
            sheet_name: Some("Q1".to_string()),
            ..Default::default()
        };
        assert_eq!(params.resolve_sheet_name(), "Q1");
    }

    #[test]
    fn test_resolve_file_out_defaults_to_title() {
        let params = SpecReportParams {
            title: "Customers".to_string(),
            ..Default::default()
        };
        assert_eq!(params.resolve_file_out(), PathBuf::from("Customers.xlsx"));
    }

    #[test]
    fn test_merge_prefers_right_side() {
        let base = SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#000000".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bg_color: Some("#FFFFFF".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.bg_color.as_deref(), Some("#FFFFFF"));
    }

    #[test]
    fn test_record_field_conversions_match_semantic_kinds() {
        assert_eq!(EnumTypedValue::from(3i32).kind(), Some(EnumCellKind::Integer));
        assert_eq!(EnumTypedValue::from("a").kind(), Some(EnumCellKind::ShortText));
        assert_eq!(
            EnumTypedValue::from(1.5f64).kind(),
            Some(EnumCellKind::DecimalWithThousands)
        );
        assert_eq!(EnumTypedValue::from(1.5f32).kind(), Some(EnumCellKind::Currency));
        assert_eq!(EnumTypedValue::from(true).kind(), None);
    }
}
