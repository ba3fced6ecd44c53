//! Cell formatter: semantic values to styled cells.

use crate::conf::C_TEXT_UNIMPLEMENTED;
use crate::infer::infer_typed_value;
use crate::spec::{
    EnumCellValue, EnumRawValue, EnumTypedValue, SpecCellFormat, SpecReportConfig,
    SpecReportFormats, SpecStyledCell,
};

/// Produce the styled cell for one typed value.
///
/// `if_alternate` overlays the alternate-row fill.
pub fn format_typed_value(
    value: &EnumTypedValue,
    if_alternate: bool,
    formats: &SpecReportFormats,
) -> SpecStyledCell {
    let (cell_value, fmt_base) = match value {
        EnumTypedValue::Integer(val) => (EnumCellValue::Number(*val as f64), &formats.integer),
        EnumTypedValue::ShortText(val) => (EnumCellValue::String(val.clone()), &formats.text),
        EnumTypedValue::Numeric(val) => (EnumCellValue::Number(*val), &formats.numeric),
        EnumTypedValue::Decimal(val) => (EnumCellValue::Number(*val), &formats.decimal),
        EnumTypedValue::Percent(val) => (EnumCellValue::Number(*val), &formats.percent),
        EnumTypedValue::Currency(val) => (EnumCellValue::Number(*val), &formats.currency),
        EnumTypedValue::Date(val) => (EnumCellValue::DateTime(*val), &formats.date),
        EnumTypedValue::Unrecognized(_) => (
            EnumCellValue::String(C_TEXT_UNIMPLEMENTED.to_string()),
            &formats.text,
        ),
    };

    SpecStyledCell {
        value: cell_value,
        format: apply_alternate_fill(fmt_base, if_alternate, formats),
    }
}

/// Map one loosely-typed value of `column` to its semantic value.
///
/// Unsupported raw kinds become an empty text cell.
pub fn convert_raw_value(
    column: &str,
    raw: &EnumRawValue,
    config: &SpecReportConfig,
) -> EnumTypedValue {
    match raw {
        EnumRawValue::Integer(val) => EnumTypedValue::Integer(*val),
        EnumRawValue::Text(val) => {
            if config.is_untouched_column(column) {
                EnumTypedValue::ShortText(val.clone())
            } else {
                infer_typed_value(val)
            }
        }
        EnumRawValue::Real(val) => EnumTypedValue::Currency(*val),
        EnumRawValue::Timestamp(val) => EnumTypedValue::Date(*val),
        EnumRawValue::Null | EnumRawValue::Boolean(_) | EnumRawValue::Blob(_) => {
            if config.if_verbose {
                log::warn!(
                    "Invalid column type {:?} for column {column:?} of value {raw}",
                    raw.type_name()
                );
            }
            EnumTypedValue::ShortText(String::new())
        }
    }
}

/// Produce the styled cell for one loosely-typed value.
pub fn format_raw_value(
    column: &str,
    raw: &EnumRawValue,
    if_alternate: bool,
    formats: &SpecReportFormats,
    config: &SpecReportConfig,
) -> SpecStyledCell {
    format_typed_value(&convert_raw_value(column, raw, config), if_alternate, formats)
}

fn apply_alternate_fill(
    fmt_base: &SpecCellFormat,
    if_alternate: bool,
    formats: &SpecReportFormats,
) -> SpecCellFormat {
    if if_alternate {
        fmt_base.merge(&formats.alternate)
    } else {
        fmt_base.clone()
    }
}
