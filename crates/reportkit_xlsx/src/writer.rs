//! Workbook-level orchestration and caller-facing entry points.

use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::DataFrame;

use crate::container::{OutputContainer, XlsxContainer, commit_sheet_plan};
use crate::error::ReportError;
use crate::layout::{plan_keyed_sheet, plan_result_set_sheet};
use crate::order::KeyedRowSource;
use crate::source::{DataSource, ReportData, SpecResultSet, derive_result_set_from_dataframe};
use crate::spec::{
    EnumSheetErrorPolicy, SpecReportConfig, SpecReportFormats, SpecReportOutcome,
    SpecReportParams, SpecSheetPlan, SpecSheetSummary,
};

/// One keyed sheet of a multi-sheet report.
pub struct SpecMultiSheetReport<'a> {
    /// Sheet parameters.
    pub params: SpecReportParams,
    /// Loader filling the sheet's keyed collection.
    pub data: &'a mut dyn ReportData,
    /// Data source executing `params.query`.
    pub source: &'a dyn DataSource,
}

/// One query-driven sheet of a multi-sheet report.
pub struct SpecMultiSheetQuery<'a> {
    /// Sheet parameters.
    pub params: SpecReportParams,
    /// Data source executing `params.query`.
    pub source: &'a dyn DataSource,
}

/// Stateful report writer over one output container.
///
/// Sheets are planned completely, then committed in call order. The
/// container is persisted by [`Self::close`].
pub struct ReportWriter<C: OutputContainer = XlsxContainer> {
    path_file_out: PathBuf,
    container: C,
    formats: SpecReportFormats,
    config: SpecReportConfig,
    outcome: SpecReportOutcome,
    if_closed: bool,
}

impl ReportWriter<XlsxContainer> {
    /// Writer bound to an xlsx workbook at `path_file_out`.
    pub fn new(path_file_out: PathBuf, config: SpecReportConfig) -> Self {
        Self::with_container(
            path_file_out,
            XlsxContainer::new(),
            SpecReportFormats::default(),
            config,
        )
    }
}

impl<C: OutputContainer> ReportWriter<C> {
    /// Writer over a caller-supplied container and style presets.
    pub fn with_container(
        path_file_out: PathBuf,
        container: C,
        formats: SpecReportFormats,
        config: SpecReportConfig,
    ) -> Self {
        Self {
            path_file_out,
            container,
            formats,
            config,
            outcome: SpecReportOutcome::default(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return snapshot of the run report.
    pub fn report(&self) -> SpecReportOutcome {
        self.outcome.clone()
    }

    /// Borrow the output container.
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Persist the container. Idempotent.
    pub fn close(&mut self) -> Result<(), ReportError> {
        if self.if_closed {
            return Ok(());
        }
        self.container.save(&self.path_file_out)?;
        self.if_closed = true;
        Ok(())
    }

    /// Query `source`, hand the result to `data` and write the keyed sheet.
    pub fn write_keyed_sheet(
        &mut self,
        params: &SpecReportParams,
        data: &mut dyn ReportData,
        source: &dyn DataSource,
    ) -> Result<SpecSheetSummary, ReportError> {
        self.ensure_open()?;
        let result_set = source.query(&params.query)?;
        data.load_rows(result_set)?;
        self.write_loaded_sheet(params, data.keyed_rows())
    }

    /// Write a sheet from an already loaded keyed collection.
    pub fn write_loaded_sheet(
        &mut self,
        params: &SpecReportParams,
        rows: &dyn KeyedRowSource,
    ) -> Result<SpecSheetSummary, ReportError> {
        self.ensure_open()?;
        let t_start = Instant::now();
        let plan = plan_keyed_sheet(params, rows, &self.formats)?;
        self.trace_elapsed("plan_keyed_sheet", &plan.sheet_name, t_start);
        self.commit_plan(&plan)
    }

    /// Query `source` and write its result set without keyed ordering.
    pub fn write_query_sheet(
        &mut self,
        params: &SpecReportParams,
        source: &dyn DataSource,
    ) -> Result<SpecSheetSummary, ReportError> {
        self.ensure_open()?;
        let result_set = source.query(&params.query)?;
        self.write_result_set_sheet(params, &result_set)
    }

    /// Write a fetched result set in its own row order.
    pub fn write_result_set_sheet(
        &mut self,
        params: &SpecReportParams,
        result_set: &SpecResultSet,
    ) -> Result<SpecSheetSummary, ReportError> {
        self.ensure_open()?;
        let t_start = Instant::now();
        let plan = plan_result_set_sheet(params, result_set, &self.formats, &self.config)?;
        self.trace_elapsed("plan_result_set_sheet", &plan.sheet_name, t_start);
        self.commit_plan(&plan)
    }

    /// Write a DataFrame as a loosely-typed result set.
    pub fn write_dataframe_sheet(
        &mut self,
        params: &SpecReportParams,
        df: &DataFrame,
    ) -> Result<SpecSheetSummary, ReportError> {
        self.ensure_open()?;
        let result_set = derive_result_set_from_dataframe(df)?;
        self.write_result_set_sheet(params, &result_set)
    }

    /// Apply the configured multi-sheet policy to a failed sheet.
    ///
    /// `Skip` records the failure and returns `Ok`; `Abort` returns `err`.
    pub fn handle_sheet_error(
        &mut self,
        sheet_name: &str,
        err: ReportError,
    ) -> Result<(), ReportError> {
        match self.config.rule_sheet_error {
            EnumSheetErrorPolicy::Abort => Err(err),
            EnumSheetErrorPolicy::Skip => {
                if self.config.if_verbose {
                    log::warn!("Skipping sheet {sheet_name:?}: {err}");
                }
                self.outcome.add_error(sheet_name, &err);
                Ok(())
            }
        }
    }

    fn commit_plan(&mut self, plan: &SpecSheetPlan) -> Result<SpecSheetSummary, ReportError> {
        if self.config.if_verbose {
            log::info!("Adding sheet {:?}", plan.sheet_name);
        }

        let t_start = Instant::now();
        commit_sheet_plan(&mut self.container, plan)?;
        self.trace_elapsed("commit_sheet_plan", &plan.sheet_name, t_start);
        for c_warning in &plan.warnings {
            if self.config.if_verbose {
                log::warn!("Sheet {:?}: {c_warning}", plan.sheet_name);
            }
            self.outcome
                .warn(format!("Sheet {:?}: {c_warning}", plan.sheet_name));
        }
        if plan.n_rows_data == 0 {
            self.outcome.warn(format!(
                "Sheet {:?} has no data rows; subtotal row omitted",
                plan.sheet_name
            ));
        }

        let summary = SpecSheetSummary {
            sheet_name: plan.sheet_name.clone(),
            n_rows_data: plan.n_rows_data,
            n_cols: plan.n_cols,
            auto_filter: plan.auto_filter.as_ref().map(|rect| rect.to_range()),
        };
        self.outcome.sheets.push(summary.clone());
        Ok(summary)
    }

    fn trace_elapsed(&self, step: &str, sheet_name: &str, t_start: Instant) {
        if self.config.if_debug {
            log::debug!("{step}({sheet_name:?}) took {:?}", t_start.elapsed());
        }
    }

    fn ensure_open(&self) -> Result<(), ReportError> {
        if self.if_closed {
            return Err(ReportError::Closed);
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region MultiSheet

/// Write every keyed sheet of `reports` into `writer` under its error policy.
pub fn write_multi_sheet<C: OutputContainer>(
    writer: &mut ReportWriter<C>,
    reports: Vec<SpecMultiSheetReport<'_>>,
) -> Result<(), ReportError> {
    for report in reports {
        let SpecMultiSheetReport {
            params,
            data,
            source,
        } = report;
        if let Err(err) = writer.write_keyed_sheet(&params, data, source) {
            writer.handle_sheet_error(&params.resolve_sheet_name(), err)?;
        }
    }
    Ok(())
}

/// Write every query-driven sheet of `reports` into `writer` under its error policy.
pub fn write_multi_sheet_from_db<C: OutputContainer>(
    writer: &mut ReportWriter<C>,
    reports: &[SpecMultiSheetQuery<'_>],
) -> Result<(), ReportError> {
    for report in reports {
        if let Err(err) = writer.write_query_sheet(&report.params, report.source) {
            writer.handle_sheet_error(&report.params.resolve_sheet_name(), err)?;
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EntryPoints

/// Single keyed sheet report saved to `params.resolve_file_out()`.
///
/// A sheet failure is returned and nothing is saved.
pub fn excel_report(
    params: &SpecReportParams,
    data: &mut dyn ReportData,
    source: &dyn DataSource,
    config: &SpecReportConfig,
) -> Result<SpecReportOutcome, ReportError> {
    let mut writer = ReportWriter::new(params.resolve_file_out(), config.clone());
    writer.write_keyed_sheet(params, data, source)?;
    writer.close()?;
    Ok(writer.report())
}

/// Multi-sheet keyed report saved to `path_file_out`.
pub fn excel_multi_sheet(
    path_file_out: impl AsRef<Path>,
    reports: Vec<SpecMultiSheetReport<'_>>,
    config: &SpecReportConfig,
) -> Result<SpecReportOutcome, ReportError> {
    let mut writer = ReportWriter::new(validate_file_out(path_file_out.as_ref())?, config.clone());
    write_multi_sheet(&mut writer, reports)?;
    writer.close()?;
    Ok(writer.report())
}

/// Single query-driven sheet with headers taken from the result set.
pub fn excel_from_db(
    params: &SpecReportParams,
    source: &dyn DataSource,
    config: &SpecReportConfig,
) -> Result<SpecReportOutcome, ReportError> {
    let mut writer = ReportWriter::new(params.resolve_file_out(), config.clone());
    writer.write_query_sheet(params, source)?;
    writer.close()?;
    Ok(writer.report())
}

/// Multi-sheet query-driven report saved to `path_file_out`.
pub fn excel_multi_sheet_from_db(
    path_file_out: impl AsRef<Path>,
    reports: &[SpecMultiSheetQuery<'_>],
    config: &SpecReportConfig,
) -> Result<SpecReportOutcome, ReportError> {
    let mut writer = ReportWriter::new(validate_file_out(path_file_out.as_ref())?, config.clone());
    write_multi_sheet_from_db(&mut writer, reports)?;
    writer.close()?;
    Ok(writer.report())
}

/// Single sheet from a DataFrame, treated like a query result.
pub fn excel_from_dataframe(
    params: &SpecReportParams,
    df: &DataFrame,
    config: &SpecReportConfig,
) -> Result<SpecReportOutcome, ReportError> {
    let mut writer = ReportWriter::new(params.resolve_file_out(), config.clone());
    writer.write_dataframe_sheet(params, df)?;
    writer.close()?;
    Ok(writer.report())
}

fn validate_file_out(path_file_out: &Path) -> Result<PathBuf, ReportError> {
    if path_file_out.as_os_str().is_empty() {
        return Err(ReportError::EmptyOutputPath);
    }
    Ok(path_file_out.to_path_buf())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
