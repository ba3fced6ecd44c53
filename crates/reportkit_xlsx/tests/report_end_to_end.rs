use std::path::Path;

use calamine::{Data, Reader, Xlsx, open_workbook};
use polars::prelude::{Column, DataFrame, NamedFrom};
use reportkit_xlsx::{
    EnumKeyKind, EnumRawValue, EnumTypedValue, KeyedRowSource, KeyedRows, ReportData, ReportError,
    ReportRecord, SpecMultiSheetQuery, SpecMultiSheetReport, SpecReportColumn, SpecReportConfig,
    SpecReportParams, SpecResultSet, SqliteSource, excel_from_dataframe, excel_from_db,
    excel_multi_sheet, excel_multi_sheet_from_db, excel_report,
};

fn create_source() -> SqliteSource {
    let source = SqliteSource::open_in_memory().unwrap();
    source
        .connection()
        .execute_batch(
            "CREATE TABLE sale (region TEXT, amount REAL, booked DATETIME, share TEXT);
            INSERT INTO sale VALUES ('North', 100.0, '2024-03-01 10:00:00', '25%');
            INSERT INTO sale VALUES ('East', 50.5, '2024-03-02 11:30:00', '3.25');",
        )
        .unwrap();
    source
}

fn read_cell(path: &Path, sheet: &str, pos: (u32, u32)) -> Option<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.get_value(pos).cloned()
}

fn read_formulas(path: &Path, sheet: &str) -> Vec<String> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_formula(sheet).unwrap();
    range
        .used_cells()
        .map(|(_, _, formula)| formula.clone())
        .filter(|formula| !formula.is_empty())
        .collect()
}

fn create_params(title: &str, query: &str, file_out: &Path) -> SpecReportParams {
    SpecReportParams {
        title: title.to_string(),
        columns: vec![
            SpecReportColumn::new("region"),
            SpecReportColumn::aggregate("amount"),
        ],
        query: query.to_string(),
        file_out: Some(file_out.to_path_buf()),
        if_no_title_row: true,
        if_alt_bg: true,
        if_auto_filter: true,
        ..Default::default()
    }
}

#[test]
fn test_excel_from_db_writes_headers_values_and_subtotal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sales.xlsx");
    let params = create_params(
        "Sales",
        "SELECT region, amount FROM sale ORDER BY amount DESC",
        &path,
    );

    let outcome = excel_from_db(&params, &create_source(), &SpecReportConfig::default()).unwrap();
    assert_eq!(outcome.sheets[0].auto_filter.as_deref(), Some("A1:B3"));

    assert_eq!(
        read_cell(&path, "Sales", (0, 0)),
        Some(Data::String("region".to_string()))
    );
    assert_eq!(
        read_cell(&path, "Sales", (1, 0)),
        Some(Data::String("North".to_string()))
    );
    assert_eq!(read_cell(&path, "Sales", (2, 1)), Some(Data::Float(50.5)));

    let l_formulas = read_formulas(&path, "Sales");
    assert_eq!(l_formulas.len(), 1);
    assert!(l_formulas[0].contains("SUBTOTAL(109,B2:B3)"));
}

#[test]
fn test_title_block_moves_header_to_row_four() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titled.xlsx");
    let mut params = create_params("Quarterly Sales", "SELECT region, amount FROM sale", &path);
    params.if_no_title_row = false;

    excel_from_db(&params, &create_source(), &SpecReportConfig::default()).unwrap();

    assert_eq!(
        read_cell(&path, "Quarterly Sales", (1, 0)),
        Some(Data::String("Quarterly Sales".to_string()))
    );
    assert_eq!(
        read_cell(&path, "Quarterly Sales", (3, 1)),
        Some(Data::String("amount".to_string()))
    );
    assert!(read_formulas(&path, "Quarterly Sales")[0].contains("SUBTOTAL(109,B5:B6)"));
}

#[test]
fn test_inferred_and_timestamp_cells_reach_the_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("typed.xlsx");
    let mut params = create_params(
        "Typed",
        "SELECT booked, share FROM sale ORDER BY region",
        &path,
    );
    params.columns.clear();

    excel_from_db(&params, &create_source(), &SpecReportConfig::default()).unwrap();

    // East row first: "3.25" is numeric, North's "25%" is a ratio.
    assert_eq!(read_cell(&path, "Typed", (1, 1)), Some(Data::Float(3.25)));
    assert_eq!(read_cell(&path, "Typed", (2, 1)), Some(Data::Float(0.25)));
    assert!(matches!(
        read_cell(&path, "Typed", (1, 0)),
        Some(Data::DateTime(_))
    ));
    assert!(read_formulas(&path, "Typed").is_empty());
}

#[test]
fn test_multi_sheet_skips_failed_sheet_and_saves_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.xlsx");
    let source = create_source();
    let l_reports = [
        SpecMultiSheetQuery {
            params: create_params("Sales", "SELECT region, amount FROM sale", &path),
            source: &source,
        },
        SpecMultiSheetQuery {
            params: create_params("Broken", "SELECT nope FROM missing", &path),
            source: &source,
        },
        SpecMultiSheetQuery {
            params: create_params("Again", "SELECT region FROM sale", &path),
            source: &source,
        },
    ];

    let outcome =
        excel_multi_sheet_from_db(&path, &l_reports, &SpecReportConfig::default()).unwrap();
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].sheet_name, "Broken");

    let workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Sales".to_string(), "Again".to_string()]
    );
}

#[test]
fn test_overlong_text_keeps_sheet_and_workbook_matches_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.xlsx");
    let source = create_source();
    source
        .connection()
        .execute_batch(
            "CREATE TABLE note (body TEXT);
            INSERT INTO note VALUES ('ok');",
        )
        .unwrap();
    source
        .connection()
        .execute("INSERT INTO note VALUES (?1)", ["n".repeat(40_000)])
        .unwrap();
    let l_reports = [
        SpecMultiSheetQuery {
            params: create_params("Long", "SELECT body FROM note ORDER BY rowid", &path),
            source: &source,
        },
        SpecMultiSheetQuery {
            params: create_params("Broken", "SELECT body FROM nowhere", &path),
            source: &source,
        },
    ];

    let outcome =
        excel_multi_sheet_from_db(&path, &l_reports, &SpecReportConfig::default()).unwrap();
    assert_eq!(outcome.sheets.len(), 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("A3"));

    let workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let l_names_ok: Vec<String> = outcome.sheets.iter().map(|s| s.sheet_name.clone()).collect();
    assert_eq!(workbook.sheet_names(), l_names_ok);

    let Some(Data::String(text)) = read_cell(&path, "Long", (2, 0)) else {
        panic!("expected truncated text cell");
    };
    assert_eq!(text.chars().count(), 32_767);
}

#[derive(Debug, Clone)]
struct SaleRecord {
    region: String,
    amount: f32,
}

impl ReportRecord for SaleRecord {
    fn cells(&self) -> Vec<EnumTypedValue> {
        vec![self.region.clone().into(), self.amount.into()]
    }
}

struct SaleData {
    rows: KeyedRows<SaleRecord>,
}

impl ReportData for SaleData {
    fn load_rows(&mut self, result_set: SpecResultSet) -> Result<(), ReportError> {
        for row in result_set.rows {
            if let [EnumRawValue::Text(region), EnumRawValue::Real(amount)] = row.as_slice() {
                self.rows.insert(
                    region.as_str(),
                    SaleRecord {
                        region: region.clone(),
                        amount: *amount as f32,
                    },
                )?;
            }
        }
        Ok(())
    }

    fn keyed_rows(&self) -> &dyn KeyedRowSource {
        &self.rows
    }
}

#[test]
fn test_excel_report_orders_rows_by_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyed.xlsx");
    let params = create_params("Keyed", "SELECT region, amount FROM sale", &path);
    let mut data = SaleData {
        rows: KeyedRows::new(EnumKeyKind::Text),
    };

    excel_report(
        &params,
        &mut data,
        &create_source(),
        &SpecReportConfig::default(),
    )
    .unwrap();

    assert_eq!(
        read_cell(&path, "Keyed", (1, 0)),
        Some(Data::String("East".to_string()))
    );
    assert_eq!(
        read_cell(&path, "Keyed", (2, 0)),
        Some(Data::String("North".to_string()))
    );
}

#[test]
fn test_excel_multi_sheet_writes_one_sheet_per_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyed_multi.xlsx");
    let source = create_source();
    let mut data_first = SaleData {
        rows: KeyedRows::new(EnumKeyKind::Text),
    };
    let mut data_second = SaleData {
        rows: KeyedRows::new(EnumKeyKind::Text),
    };

    let outcome = excel_multi_sheet(
        &path,
        vec![
            SpecMultiSheetReport {
                params: create_params("First", "SELECT region, amount FROM sale", &path),
                data: &mut data_first,
                source: &source,
            },
            SpecMultiSheetReport {
                params: create_params(
                    "Second",
                    "SELECT region, amount FROM sale WHERE amount > 60",
                    &path,
                ),
                data: &mut data_second,
                source: &source,
            },
        ],
        &SpecReportConfig::default(),
    )
    .unwrap();

    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.sheets[1].n_rows_data, 1);
    assert!(read_formulas(&path, "Second")[0].contains("SUBTOTAL(109,B2:B2)"));
}

#[test]
fn test_excel_report_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("refused.xlsx");
    let params = create_params("Refused", "SELECT region, amount FROM sale", &path);
    let mut data = SaleData {
        rows: KeyedRows::new(EnumKeyKind::Boolean),
    };

    let result = excel_report(
        &params,
        &mut data,
        &create_source(),
        &SpecReportConfig::default(),
    );
    assert!(result.is_err());
    assert!(!path.exists());
}

#[test]
fn test_excel_from_dataframe() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.xlsx");
    let df = DataFrame::new(vec![
        Column::new("region".into(), &["West", "South"]),
        Column::new("amount".into(), &[10.0f64, 20.0]),
    ])
    .unwrap();
    let params = create_params("Frame", "", &path);

    excel_from_dataframe(&params, &df, &SpecReportConfig::default()).unwrap();

    assert_eq!(read_cell(&path, "Frame", (2, 1)), Some(Data::Float(20.0)));
    assert!(read_formulas(&path, "Frame")[0].contains("SUBTOTAL(109,B2:B3)"));
}
