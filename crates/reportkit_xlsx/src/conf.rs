//! Report constants and default format preset factories.

use crate::spec::{SpecCellFormat, SpecReportFormats};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel cell text maximum length, in characters.
pub const N_LEN_EXCEL_CELL_TEXT_MAX: usize = 32_767;
/// Length cap applied when a sheet name is derived from the report title.
pub const N_LEN_SHEET_NAME_DEFAULT_MAX: usize = 30;

/// Header row index (1-based) when no title block is rendered.
pub const N_ROW_START_PLAIN: usize = 1;
/// Header row index (1-based) below the two-row title block.
pub const N_ROW_START_TITLED: usize = 4;

/// Uniform width applied to every emitted column.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 28.0;
/// Title cell font size.
pub const N_FONT_SIZE_TITLE: i64 = 18;

/// `SUBTOTAL` function number for a filter-aware sum.
pub const N_SUBTOTAL_FN_SUM_VISIBLE: u32 = 109;

/// Header fill color.
pub const C_COLOR_HEADER_FILL: &str = "#4472C4";
/// Header font color.
pub const C_COLOR_HEADER_FONT: &str = "#FFFFFF";
/// Fill applied to alternate data rows.
pub const C_COLOR_ALT_FILL: &str = "#B4C6E7";
/// Subtotal row fill.
pub const C_COLOR_SUBTOTAL_FILL: &str = "#D0CECE";
/// Subtotal aggregate font color.
pub const C_COLOR_SUBTOTAL_FONT: &str = "#FF0000";

/// Number format for integer cells.
pub const C_NUM_FORMAT_INTEGER: &str = "0";
/// Number format for thousands-grouped decimals.
pub const C_NUM_FORMAT_DECIMAL: &str = "#,##0.00";
/// Number format for percentages.
pub const C_NUM_FORMAT_PERCENT: &str = "0.00%";
/// Number format for currency values.
pub const C_NUM_FORMAT_CURRENCY: &str = "$#,##0.00";
/// Display format the xlsx container uses for date cells.
pub const C_NUM_FORMAT_DATETIME_DISPLAY: &str = "yyyy-mm-dd hh:mm:ss";

/// Placeholder text for record fields without a semantic cell kind.
pub const C_TEXT_UNIMPLEMENTED: &str = "unimplemented";

/// Build the default style presets used by the layout engine.
pub fn derive_default_report_formats() -> SpecReportFormats {
    let cfg_base_fmt_spec = SpecCellFormat {
        align: Some("left".to_string()),
        ..Default::default()
    };

    SpecReportFormats {
        text: cfg_base_fmt_spec.clone(),
        integer: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_INTEGER.to_string()),
            ..Default::default()
        }),
        numeric: cfg_base_fmt_spec.clone(),
        decimal: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_DECIMAL.to_string()),
            ..Default::default()
        }),
        percent: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_PERCENT.to_string()),
            ..Default::default()
        }),
        currency: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_CURRENCY.to_string()),
            ..Default::default()
        }),
        date: cfg_base_fmt_spec,
        header: SpecCellFormat {
            bold: Some(true),
            bg_color: Some(C_COLOR_HEADER_FILL.to_string()),
            font_color: Some(C_COLOR_HEADER_FONT.to_string()),
            ..Default::default()
        },
        title: SpecCellFormat {
            font_size: Some(N_FONT_SIZE_TITLE),
            bold: Some(true),
            ..Default::default()
        },
        alternate: SpecCellFormat {
            bg_color: Some(C_COLOR_ALT_FILL.to_string()),
            ..Default::default()
        },
        subtotal_plain: SpecCellFormat {
            bg_color: Some(C_COLOR_SUBTOTAL_FILL.to_string()),
            ..Default::default()
        },
        subtotal_aggregate: SpecCellFormat {
            bg_color: Some(C_COLOR_SUBTOTAL_FILL.to_string()),
            bold: Some(true),
            font_color: Some(C_COLOR_SUBTOTAL_FONT.to_string()),
            align: Some("left".to_string()),
            num_format: Some(C_NUM_FORMAT_CURRENCY.to_string()),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats_are_left_aligned_and_date_has_no_num_format() {
        let formats = derive_default_report_formats();
        for fmt in [
            &formats.text,
            &formats.integer,
            &formats.numeric,
            &formats.decimal,
            &formats.percent,
            &formats.currency,
            &formats.date,
        ] {
            assert_eq!(fmt.align.as_deref(), Some("left"));
        }
        assert_eq!(formats.date.num_format, None);
        assert_eq!(formats.numeric.num_format, None);
        assert_eq!(formats.currency.num_format.as_deref(), Some("$#,##0.00"));
    }
}
