//! Output container collaborators.
//!
//! The layout engine never touches the workbook format; it replays a
//! [`SpecSheetPlan`] through the [`OutputContainer`] operations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::conf::C_NUM_FORMAT_DATETIME_DISPLAY;
use crate::error::ReportError;
use crate::spec::{EnumCellValue, SpecAutoFilterRect, SpecCellFormat, SpecSheetPlan, SpecStyledCell};
use crate::util::{cast_col_num, cast_row_num, validate_sheet_name};

/// Append-only sink for styled sheets.
///
/// A sheet started by [`Self::create_sheet`] becomes part of the output only
/// after [`Self::finish_sheet`]; [`Self::discard_sheet`] drops it.
pub trait OutputContainer {
    /// Start a new pending sheet; subsequent operations target it.
    fn create_sheet(&mut self, name: &str) -> Result<(), ReportError>;

    /// Start a new row in the pending sheet.
    fn append_row(&mut self) -> Result<(), ReportError>;

    /// Append one cell to the current row.
    fn append_cell(&mut self, cell: &SpecStyledCell) -> Result<(), ReportError>;

    /// Set the width of column `col_idx` in the pending sheet.
    fn set_column_width(&mut self, col_idx: usize, width: f64) -> Result<(), ReportError>;

    /// Enable the auto-filter over `rect` in the pending sheet.
    fn set_auto_filter(&mut self, rect: &SpecAutoFilterRect) -> Result<(), ReportError>;

    /// Add the pending sheet to the output.
    fn finish_sheet(&mut self) -> Result<(), ReportError>;

    /// Drop the pending sheet, if any.
    fn discard_sheet(&mut self);

    /// Persist every finished sheet to `path`.
    fn save(&mut self, path: &Path) -> Result<(), ReportError>;
}

/// Replay `plan` into `container` as one new sheet.
///
/// On failure the partially written sheet is discarded and the container is
/// left as it was before the call.
pub fn commit_sheet_plan(
    container: &mut dyn OutputContainer,
    plan: &SpecSheetPlan,
) -> Result<(), ReportError> {
    container.create_sheet(&plan.sheet_name)?;
    match replay_sheet_plan(container, plan) {
        Ok(()) => container.finish_sheet(),
        Err(err) => {
            container.discard_sheet();
            Err(err)
        }
    }
}

fn replay_sheet_plan(
    container: &mut dyn OutputContainer,
    plan: &SpecSheetPlan,
) -> Result<(), ReportError> {
    for row in &plan.rows {
        container.append_row()?;
        for cell in row {
            container.append_cell(cell)?;
        }
    }
    for (n_idx_col, n_width) in plan.column_widths.iter().enumerate() {
        container.set_column_width(n_idx_col, *n_width)?;
    }
    if let Some(rect) = &plan.auto_filter {
        container.set_auto_filter(rect)?;
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// #region XlsxContainer

/// `rust_xlsxwriter` workbook buffered in memory until [`OutputContainer::save`].
pub struct XlsxContainer {
    workbook: Workbook,
    l_sheet_names: Vec<String>,
    set_sheet_names_existing: BTreeSet<String>,
    worksheet_pending: Option<Worksheet>,
    n_row_current: Option<usize>,
    n_col_next: usize,
}

impl XlsxContainer {
    /// Empty workbook.
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            l_sheet_names: Vec::new(),
            set_sheet_names_existing: BTreeSet::new(),
            worksheet_pending: None,
            n_row_current: None,
            n_col_next: 0,
        }
    }

    /// Finished sheet names in creation order.
    pub fn sheet_names(&self) -> &[String] {
        &self.l_sheet_names
    }

    fn pending_worksheet(&mut self) -> Result<&mut Worksheet, ReportError> {
        self.worksheet_pending
            .as_mut()
            .ok_or(ReportError::NoActiveTarget("sheet"))
    }
}

impl Default for XlsxContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputContainer for XlsxContainer {
    fn create_sheet(&mut self, name: &str) -> Result<(), ReportError> {
        self.finish_sheet()?;
        validate_sheet_name(name, &self.set_sheet_names_existing)?;

        let mut worksheet = Worksheet::new();
        worksheet
            .set_name(name)
            .map_err(|err| ReportError::InvalidSheetName {
                name: name.to_string(),
                reason: err.to_string(),
            })?;

        self.worksheet_pending = Some(worksheet);
        self.n_row_current = None;
        self.n_col_next = 0;
        Ok(())
    }

    fn append_row(&mut self) -> Result<(), ReportError> {
        if self.worksheet_pending.is_none() {
            return Err(ReportError::NoActiveTarget("sheet"));
        }
        self.n_row_current = Some(self.n_row_current.map_or(0, |n_row| n_row + 1));
        self.n_col_next = 0;
        Ok(())
    }

    fn append_cell(&mut self, cell: &SpecStyledCell) -> Result<(), ReportError> {
        let n_row = self.n_row_current.ok_or(ReportError::NoActiveTarget("row"))?;
        let n_col = self.n_col_next;
        let worksheet = self.pending_worksheet()?;
        write_cell_with_format(worksheet, n_row, n_col, cell)?;
        self.n_col_next += 1;
        Ok(())
    }

    fn set_column_width(&mut self, col_idx: usize, width: f64) -> Result<(), ReportError> {
        let n_col = cast_col_num(col_idx)?;
        self.pending_worksheet()?.set_column_width(n_col, width)?;
        Ok(())
    }

    fn set_auto_filter(&mut self, rect: &SpecAutoFilterRect) -> Result<(), ReportError> {
        let (n_row_first, n_col_first) = (cast_row_num(rect.row_first)?, cast_col_num(rect.col_first)?);
        let (n_row_last, n_col_last) = (cast_row_num(rect.row_last)?, cast_col_num(rect.col_last)?);
        self.pending_worksheet()?
            .autofilter(n_row_first, n_col_first, n_row_last, n_col_last)?;
        Ok(())
    }

    fn finish_sheet(&mut self) -> Result<(), ReportError> {
        let Some(worksheet) = self.worksheet_pending.take() else {
            return Ok(());
        };
        let c_name = worksheet.name();
        self.workbook.push_worksheet(worksheet);
        self.set_sheet_names_existing.insert(c_name.clone());
        self.l_sheet_names.push(c_name);
        self.n_row_current = None;
        Ok(())
    }

    fn discard_sheet(&mut self) {
        self.worksheet_pending = None;
        self.n_row_current = None;
        self.n_col_next = 0;
    }

    fn save(&mut self, path: &Path) -> Result<(), ReportError> {
        self.finish_sheet()?;
        self.workbook.save(path)?;
        Ok(())
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    cell: &SpecStyledCell,
) -> Result<(), ReportError> {
    let (n_row, n_col) = (cast_row_num(row_idx)?, cast_col_num(col_idx)?);
    let format = derive_rust_xlsx_format(&cell.format);

    match &cell.value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, &format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, &format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, &format)?;
        }
        EnumCellValue::DateTime(val) => {
            let format = if cell.format.num_format.is_none() {
                format.set_num_format(C_NUM_FORMAT_DATETIME_DISPLAY)
            } else {
                format
            };
            worksheet.write_datetime_with_format(n_row, n_col, val, &format)?;
        }
        EnumCellValue::Formula { formula, result } => {
            worksheet.write_formula_with_format(n_row, n_col, formula.as_str(), &format)?;
            worksheet.set_formula_result(n_row, n_col, result.to_string());
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MemoryContainer

/// One sheet recorded by [`MemoryContainer`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecRecordedSheet {
    /// Sheet name.
    pub name: String,
    /// Rows of styled cells.
    pub rows: Vec<Vec<SpecStyledCell>>,
    /// `(column, width)` in call order.
    pub column_widths: Vec<(usize, f64)>,
    /// Auto-filter rectangle, when set.
    pub auto_filter: Option<SpecAutoFilterRect>,
}

/// In-memory container recording every operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryContainer {
    /// Finished sheets in creation order.
    pub sheets: Vec<SpecRecordedSheet>,
    /// Paths passed to `save`.
    pub paths_saved: Vec<PathBuf>,
    sheet_pending: Option<SpecRecordedSheet>,
}

impl MemoryContainer {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished sheet named `name`.
    pub fn sheet(&self, name: &str) -> Option<&SpecRecordedSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    fn pending_sheet(&mut self) -> Result<&mut SpecRecordedSheet, ReportError> {
        self.sheet_pending
            .as_mut()
            .ok_or(ReportError::NoActiveTarget("sheet"))
    }
}

impl OutputContainer for MemoryContainer {
    fn create_sheet(&mut self, name: &str) -> Result<(), ReportError> {
        self.finish_sheet()?;
        let set_names: BTreeSet<String> = self.sheets.iter().map(|s| s.name.clone()).collect();
        validate_sheet_name(name, &set_names)?;
        self.sheet_pending = Some(SpecRecordedSheet {
            name: name.to_string(),
            ..Default::default()
        });
        Ok(())
    }

    fn append_row(&mut self) -> Result<(), ReportError> {
        self.pending_sheet()?.rows.push(Vec::new());
        Ok(())
    }

    fn append_cell(&mut self, cell: &SpecStyledCell) -> Result<(), ReportError> {
        self.pending_sheet()?
            .rows
            .last_mut()
            .ok_or(ReportError::NoActiveTarget("row"))?
            .push(cell.clone());
        Ok(())
    }

    fn set_column_width(&mut self, col_idx: usize, width: f64) -> Result<(), ReportError> {
        self.pending_sheet()?.column_widths.push((col_idx, width));
        Ok(())
    }

    fn set_auto_filter(&mut self, rect: &SpecAutoFilterRect) -> Result<(), ReportError> {
        self.pending_sheet()?.auto_filter = Some(rect.clone());
        Ok(())
    }

    fn finish_sheet(&mut self) -> Result<(), ReportError> {
        if let Some(sheet) = self.sheet_pending.take() {
            self.sheets.push(sheet);
        }
        Ok(())
    }

    fn discard_sheet(&mut self) {
        self.sheet_pending = None;
    }

    fn save(&mut self, path: &Path) -> Result<(), ReportError> {
        self.finish_sheet()?;
        self.paths_saved.push(path.to_path_buf());
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
