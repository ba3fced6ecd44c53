//! Sheet layout engine.
//!
//! A sheet is planned completely before anything reaches the container:
//!
//! ```text
//! [spacer]                  <- title block, only without `if_no_title_row`
//! [title]
//! [spacer]
//! [header]                  <- row 1 or row 4 (1-based)
//! [data] x n_rows_data      <- alternate fill on even data rows
//! [subtotal]                <- only when n_rows_data > 0
//! ```

use crate::cell::{format_raw_value, format_typed_value};
use crate::conf::{
    N_ROW_START_PLAIN, N_ROW_START_TITLED, N_SUBTOTAL_FN_SUM_VISIBLE, N_WIDTH_COLUMN_DEFAULT,
};
use crate::error::ReportError;
use crate::order::{KeyedRowSource, order_keys};
use crate::source::SpecResultSet;
use crate::spec::{
    EnumCellValue, EnumRawValue, SpecAutoFilterRect, SpecReportConfig, SpecReportFormats,
    SpecReportParams, SpecSheetPlan, SpecStyledCell,
};
use crate::util::{
    derive_cell_ref, derive_column_letters, truncate_cell_text, validate_sheet_extent,
};

/// Transient bookkeeping of one sheet being planned.
struct SheetLayoutState {
    l_rows: Vec<Vec<SpecStyledCell>>,
    n_row_start: usize,
    n_rows_data: usize,
    n_cols: usize,
}

impl SheetLayoutState {
    fn new(if_title_block: bool, n_cols: usize) -> Self {
        Self {
            l_rows: Vec::new(),
            n_row_start: if if_title_block {
                N_ROW_START_TITLED
            } else {
                N_ROW_START_PLAIN
            },
            n_rows_data: 0,
            n_cols,
        }
    }

    fn push_row(&mut self, row: Vec<SpecStyledCell>) {
        self.l_rows.push(row);
    }
}

/// Plan a sheet from a keyed collection of structured records.
///
/// Keys are ordered and every record is checked against the column
/// descriptors before any row is laid out.
pub fn plan_keyed_sheet(
    params: &SpecReportParams,
    rows: &dyn KeyedRowSource,
    formats: &SpecReportFormats,
) -> Result<SpecSheetPlan, ReportError> {
    let l_order = order_keys(rows.key_kind(), rows.keys())?;
    let n_cols = params.columns.len();

    let mut l_body = Vec::with_capacity(l_order.len());
    for (n_idx_row, n_idx_entry) in l_order.into_iter().enumerate() {
        let l_values = rows.cells_at(n_idx_entry).ok_or_else(|| {
            ReportError::RowSource(format!("Row {n_idx_entry} vanished from keyed collection"))
        })?;
        if l_values.len() != n_cols {
            return Err(ReportError::ColumnCountMismatch {
                expected: n_cols,
                found: l_values.len(),
            });
        }

        let if_alternate = params.if_alt_bg && n_idx_row % 2 == 0;
        l_body.push(
            l_values
                .iter()
                .map(|value| format_typed_value(value, if_alternate, formats))
                .collect(),
        );
    }

    let l_titles: Vec<String> = params.columns.iter().map(|col| col.title.clone()).collect();
    let l_if_aggregate: Vec<bool> = params.columns.iter().map(|col| col.if_aggregate).collect();
    assemble_sheet_plan(params, &l_titles, &l_if_aggregate, l_body, formats)
}

/// Plan a sheet straight from a loosely-typed result set.
///
/// Headers are the result's column names and rows keep result order. A
/// result column gets a subtotal when `params.columns` flags a descriptor
/// with the same title.
pub fn plan_result_set_sheet(
    params: &SpecReportParams,
    result_set: &SpecResultSet,
    formats: &SpecReportFormats,
    config: &SpecReportConfig,
) -> Result<SpecSheetPlan, ReportError> {
    let l_body = result_set
        .rows
        .iter()
        .enumerate()
        .map(|(n_idx_row, row)| {
            let if_alternate = params.if_alt_bg && n_idx_row % 2 == 0;
            result_set
                .columns
                .iter()
                .enumerate()
                .map(|(n_idx_col, c_name)| {
                    let raw = row.get(n_idx_col).unwrap_or(&EnumRawValue::Null);
                    format_raw_value(c_name, raw, if_alternate, formats, config)
                })
                .collect()
        })
        .collect();

    let l_if_aggregate: Vec<bool> = result_set
        .columns
        .iter()
        .map(|c_name| params.is_aggregate_title(c_name))
        .collect();
    assemble_sheet_plan(params, &result_set.columns, &l_if_aggregate, l_body, formats)
}

fn assemble_sheet_plan(
    params: &SpecReportParams,
    titles: &[String],
    if_aggregate_by_col: &[bool],
    body: Vec<Vec<SpecStyledCell>>,
    formats: &SpecReportFormats,
) -> Result<SpecSheetPlan, ReportError> {
    let if_title_block = !params.if_no_title_row;
    let mut state = SheetLayoutState::new(if_title_block, titles.len());

    // title block + header + body + subtotal
    let n_rows_total = state.n_row_start + body.len() + usize::from(!body.is_empty());
    validate_sheet_extent(n_rows_total, state.n_cols)?;

    if if_title_block {
        state.push_row(Vec::new());
        state.push_row(vec![SpecStyledCell {
            value: EnumCellValue::String(params.title.clone()),
            format: formats.title.clone(),
        }]);
        state.push_row(Vec::new());
    }

    state.push_row(
        titles
            .iter()
            .map(|c_title| SpecStyledCell {
                value: EnumCellValue::String(c_title.clone()),
                format: formats.header.clone(),
            })
            .collect(),
    );

    state.n_rows_data = body.len();
    for row in body {
        state.push_row(row);
    }

    let auto_filter = if params.if_auto_filter {
        derive_auto_filter_rect(state.n_row_start, state.n_rows_data, state.n_cols)
    } else {
        None
    };

    if state.n_rows_data > 0 {
        let n_row_first = state.n_row_start + 1;
        let n_row_last = state.n_row_start + state.n_rows_data;
        let l_subtotal = if_aggregate_by_col
            .iter()
            .enumerate()
            .map(|(n_idx_col, if_aggregate)| {
                if *if_aggregate {
                    SpecStyledCell {
                        value: EnumCellValue::Formula {
                            formula: derive_subtotal_formula(n_idx_col, n_row_first, n_row_last),
                            result: 0.0,
                        },
                        format: formats.subtotal_aggregate.clone(),
                    }
                } else {
                    SpecStyledCell {
                        value: EnumCellValue::None,
                        format: formats.subtotal_plain.clone(),
                    }
                }
            })
            .collect();
        state.push_row(l_subtotal);
    }

    let l_warnings = clamp_overlong_text(&mut state.l_rows);

    Ok(SpecSheetPlan {
        sheet_name: params.resolve_sheet_name(),
        rows: state.l_rows,
        column_widths: vec![N_WIDTH_COLUMN_DEFAULT; state.n_cols],
        auto_filter,
        row_header: state.n_row_start,
        n_rows_data: state.n_rows_data,
        n_cols: state.n_cols,
        warnings: l_warnings,
    })
}

/// Cut text cells over the Excel limit in place, one warning per cut.
fn clamp_overlong_text(rows: &mut [Vec<SpecStyledCell>]) -> Vec<String> {
    let mut l_warnings = Vec::new();
    for (n_idx_row, row) in rows.iter_mut().enumerate() {
        for (n_idx_col, cell) in row.iter_mut().enumerate() {
            let EnumCellValue::String(text) = &mut cell.value else {
                continue;
            };
            if let Some(c_cut) = truncate_cell_text(text) {
                l_warnings.push(format!(
                    "Cell {} text truncated from {} to {} characters",
                    derive_cell_ref(n_idx_col, n_idx_row + 1),
                    text.chars().count(),
                    c_cut.chars().count()
                ));
                *text = c_cut;
            }
        }
    }
    l_warnings
}

/// Auto-filter over the header row (1-based `n_row_header`) and data rows.
///
/// Returns `None` for a sheet without columns.
pub fn derive_auto_filter_rect(
    n_row_header: usize,
    n_rows_data: usize,
    n_cols: usize,
) -> Option<SpecAutoFilterRect> {
    if n_cols == 0 || n_row_header == 0 {
        return None;
    }
    let n_row_last = n_row_header + n_rows_data;
    Some(SpecAutoFilterRect {
        row_first: n_row_header - 1,
        col_first: 0,
        row_last: n_row_last - 1,
        col_last: n_cols - 1,
        cell_top_left: derive_cell_ref(0, n_row_header),
        cell_bottom_right: derive_cell_ref(n_cols - 1, n_row_last),
    })
}

/// Filter-aware sum over rows `n_row_first..=n_row_last` (1-based) of a column.
pub fn derive_subtotal_formula(col_idx: usize, n_row_first: usize, n_row_last: usize) -> String {
    let c_col = derive_column_letters(col_idx);
    format!("=SUBTOTAL({N_SUBTOTAL_FN_SUM_VISIBLE},{c_col}{n_row_first}:{c_col}{n_row_last})")
}
