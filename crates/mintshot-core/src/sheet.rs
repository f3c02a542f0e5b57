//! Sheet-side bookkeeping: result URL layout and row status cells

use std::sync::Arc;

use crate::collaborators::SheetClient;
use crate::config::StatusLabels;
use crate::cursor::ColumnCursor;
use crate::error::PipelineError;
use crate::range::CellRef;
use crate::types::{RowIndex, RowStatus};

/// Writes result URLs into consecutive columns of a row
///
/// The writer never resets the cursor; callers reset it before each row.
#[derive(Clone)]
pub struct SheetWriter {
    client: Arc<dyn SheetClient>,
    sheet: Option<String>,
}

impl SheetWriter {
    /// Create writer targeting `sheet` (first sheet when `None`)
    #[inline]
    #[must_use]
    pub fn new(client: Arc<dyn SheetClient>, sheet: Option<String>) -> Self {
        Self { client, sheet }
    }

    /// Write `urls` starting at the cursor, advancing one column per success
    ///
    /// Stops at the first failed cell: nothing after it is attempted and the
    /// cursor stays on the failed column.
    ///
    /// # Returns
    /// Number of cells written
    ///
    /// # Errors
    /// `PipelineError::SheetWrite` naming the failed cell and how many cells
    /// were written before it
    pub async fn write_urls(
        &self,
        sheet_id: &str,
        row: RowIndex,
        urls: &[String],
        cursor: &mut ColumnCursor,
    ) -> Result<usize, PipelineError> {
        let mut written = 0;
        for url in urls {
            let cell = cursor.cell(self.sheet.as_deref(), row);
            match self.client.write_cell(sheet_id, &cell, url).await {
                Ok(()) => {
                    tracing::debug!(cell = %cell, "wrote result url");
                    cursor.advance();
                    written += 1;
                }
                Err(source) => {
                    tracing::error!(cell = %cell, error = %source, "result write failed, abandoning row batch");
                    return Err(PipelineError::SheetWrite {
                        cell: cell.to_string(),
                        written,
                        source,
                    });
                }
            }
        }
        Ok(written)
    }
}

impl std::fmt::Debug for SheetWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetWriter")
            .field("sheet", &self.sheet)
            .finish_non_exhaustive()
    }
}

/// Reads nothing, writes one status cell per row; last writer wins
#[derive(Clone)]
pub struct StatusStore {
    client: Arc<dyn SheetClient>,
    sheet: Option<String>,
    column: String,
    labels: StatusLabels,
}

impl StatusStore {
    /// Create status store writing to `column`
    #[must_use]
    pub fn new(
        client: Arc<dyn SheetClient>,
        sheet: Option<String>,
        column: impl Into<String>,
        labels: StatusLabels,
    ) -> Self {
        Self {
            client,
            sheet,
            column: column.into(),
            labels,
        }
    }

    /// Write the status label of `row`
    ///
    /// # Errors
    /// `PipelineError::StatusWrite` when the cell update fails
    pub async fn mark_status(
        &self,
        sheet_id: &str,
        row: RowIndex,
        status: RowStatus,
    ) -> Result<(), PipelineError> {
        let cell = CellRef::new(self.sheet.clone(), self.column.clone(), row);
        let label = status.label(&self.labels);
        self.client
            .write_cell(sheet_id, &cell, label)
            .await
            .map_err(|source| PipelineError::StatusWrite { row, source })?;
        tracing::info!(row, status = label, "row status written");
        Ok(())
    }
}

impl std::fmt::Debug for StatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusStore")
            .field("sheet", &self.sheet)
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}
