//! Stateless helper utilities used by the layout engine and containers.

use std::collections::BTreeSet;

use crate::conf::{
    N_LEN_EXCEL_CELL_TEXT_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_LEN_SHEET_NAME_DEFAULT_MAX,
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX,
};
use crate::error::ReportError;

////////////////////////////////////////////////////////////////////////////////
// #region CellReferences

/// Column letters for a zero-based column index (`0 -> A`, `26 -> AA`).
pub fn derive_column_letters(col_idx: usize) -> String {
    let mut l_letters = Vec::new();
    let mut n_rest = col_idx + 1;
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_letters.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_letters.iter().rev().collect()
}

/// A1-style reference from a zero-based column and 1-based row.
pub fn derive_cell_ref(col_idx: usize, row_num: usize) -> String {
    format!("{}{row_num}", derive_column_letters(col_idx))
}

/// Text cut to the Excel cell limit, or `None` when it already fits.
pub fn truncate_cell_text(text: &str) -> Option<String> {
    text.char_indices()
        .nth(N_LEN_EXCEL_CELL_TEXT_MAX)
        .map(|(n_pos, _)| text[..n_pos].to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Default sheet name: the title truncated to 30 characters.
pub fn derive_default_sheet_name(title: &str) -> String {
    title.chars().take(N_LEN_SHEET_NAME_DEFAULT_MAX).collect()
}

/// Reject empty, overlong or already used sheet names.
pub fn validate_sheet_name(name: &str, names_existing: &BTreeSet<String>) -> Result<(), ReportError> {
    let reject = |reason: &str| ReportError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(reject("sheet name is empty"));
    }
    if name.chars().count() > N_LEN_EXCEL_SHEET_NAME_MAX {
        return Err(reject("sheet name is longer than 31 characters"));
    }
    if names_existing.contains(name) {
        return Err(reject("sheet name is already used in this workbook"));
    }
    Ok(())
}

/// Validate that `n_rows` x `n_cols` fits one worksheet.
pub fn validate_sheet_extent(n_rows: usize, n_cols: usize) -> Result<(), ReportError> {
    if n_rows > N_NROWS_EXCEL_MAX {
        return Err(ReportError::SheetTooLarge(format!(
            "{n_rows} rows > {N_NROWS_EXCEL_MAX}"
        )));
    }
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(ReportError::SheetTooLarge(format!(
            "{n_cols} columns > {N_NCOLS_EXCEL_MAX}"
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasts

pub(crate) fn cast_row_num(value: usize) -> Result<u32, ReportError> {
    u32::try_from(value).map_err(|_| ReportError::IndexOverflow { axis: "row", value })
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16, ReportError> {
    u16::try_from(value).map_err(|_| ReportError::IndexOverflow {
        axis: "column",
        value,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
