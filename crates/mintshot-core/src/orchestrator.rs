//! Orchestrator
//!
//! Drives one pass over the configured range:
//! - reads the candidate rows once
//! - skips rows already in a terminal status
//! - runs discovery then rendering for each remaining row, strictly in
//!   sheet order, awaiting each row completely before the next
//! - isolates row failures so the pass always reaches the last row

use std::sync::Arc;

use tracing::Instrument;

use crate::collaborators::{Collaborators, SheetClient};
use crate::config::{PipelineConfig, StatusLabels};
use crate::discovery::DiscoveryStage;
use crate::error::PipelineError;
use crate::range::RangeSpec;
use crate::rendering::RenderingStage;
use crate::sheet::{SheetWriter, StatusStore};
use crate::types::{DiscoveryOutcome, RenderReport, Row, RowStatus, RunSummary};

/// Pipeline orchestrator
pub struct Orchestrator {
    config: PipelineConfig,
    sheets: Arc<dyn SheetClient>,
    discovery: DiscoveryStage,
    rendering: RenderingStage,
}

/// What happened to a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowResult {
    Skipped,
    Completed(DiscoveryOutcome, RenderReport),
    Errored,
}

impl Orchestrator {
    /// Create orchestrator
    ///
    /// # Errors
    /// `PipelineError::Config` when the configuration does not validate
    pub fn new(config: PipelineConfig, collaborators: Collaborators) -> Result<Self, PipelineError> {
        config.validate()?;

        let sheet = config.range.sheet.clone();
        let status = StatusStore::new(
            Arc::clone(&collaborators.sheets),
            sheet.clone(),
            config.status_column.clone(),
            config.status_labels.clone(),
        );
        let writer = SheetWriter::new(Arc::clone(&collaborators.sheets), sheet);

        let discovery = DiscoveryStage::new(
            Arc::clone(&collaborators.discovery),
            Arc::clone(&collaborators.repository),
            status,
            &config,
        );
        let rendering = RenderingStage::new(
            collaborators.repository,
            collaborators.renderer,
            collaborators.uploader,
            writer,
            &config,
        );

        Ok(Self {
            config,
            sheets: collaborators.sheets,
            discovery,
            rendering,
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One pass over the configured range
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        self.process_rows(&self.config.range).await
    }

    /// One pass over `range`
    ///
    /// # Errors
    /// `PipelineError::RangeRead` when the rows cannot be read; this is the
    /// only failure that aborts the pass
    pub async fn process_rows(&self, range: &RangeSpec) -> Result<RunSummary, PipelineError> {
        let sheet_id = self.config.spreadsheet_id.as_str();
        let range_text = range.to_string();

        let values = self
            .sheets
            .read_range(sheet_id, &range_text)
            .await
            .map_err(|source| PipelineError::RangeRead {
                range: range_text.clone(),
                source,
            })?;

        let rows = parse_rows(range, &values, &self.config.status_labels);
        tracing::info!(range = %range_text, rows = rows.len(), "read candidate rows");

        let mut summary = RunSummary {
            rows_seen: rows.len(),
            ..RunSummary::default()
        };

        for row in &rows {
            let span = tracing::info_span!("row", row = row.index, wallet = %row.wallet);
            match self.process_row(sheet_id, row).instrument(span).await {
                RowResult::Skipped => summary.skipped += 1,
                RowResult::Errored => summary.errored += 1,
                RowResult::Completed(outcome, render) => {
                    if outcome.is_processed() {
                        summary.processed += 1;
                    } else {
                        summary.failed += 1;
                    }
                    summary.render.merge(render);
                }
            }
        }

        tracing::info!(
            seen = summary.rows_seen,
            skipped = summary.skipped,
            processed = summary.processed,
            failed = summary.failed,
            errored = summary.errored,
            uploaded = summary.render.uploaded,
            cells = summary.render.cells_written,
            "pass complete"
        );
        Ok(summary)
    }

    async fn process_row(&self, sheet_id: &str, row: &Row) -> RowResult {
        if row.status.is_terminal() {
            tracing::debug!(status = ?row.status, "already handled");
            return RowResult::Skipped;
        }
        if row.wallet.is_empty() {
            tracing::debug!("blank wallet cell");
            return RowResult::Skipped;
        }

        let outcome = match self
            .discovery
            .discover_and_store(sheet_id, &row.wallet, row.index)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, "discovery aborted, row left unprocessed");
                return RowResult::Errored;
            }
        };

        let render = match self.rendering.render_and_publish(sheet_id, &row.wallet).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "rendering aborted");
                RenderReport::default()
            }
        };

        RowResult::Completed(outcome, render)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("discovery", &self.discovery)
            .field("rendering", &self.rendering)
            .finish_non_exhaustive()
    }
}

/// Turn raw range values into rows; missing cells read as empty
fn parse_rows(range: &RangeSpec, values: &[Vec<String>], labels: &StatusLabels) -> Vec<Row> {
    values
        .iter()
        .enumerate()
        .map(|(offset, cells)| Row {
            index: range.row_at(offset),
            wallet: cells.first().map(|w| w.trim().to_string()).unwrap_or_default(),
            status: RowStatus::from_cell(cells.get(1).map(String::as_str), labels),
        })
        .collect()
}
