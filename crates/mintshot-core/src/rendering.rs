//! Rendering stage: screenshot buffered preview pages, upload them and
//! lay the public URLs out across the owning row

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::collaborators::{BlobUploader, ImageRepository, RenderSession, Renderer};
use crate::config::{PipelineConfig, Timeouts};
use crate::cursor::ColumnCursor;
use crate::error::{PipelineError, ServiceError};
use crate::sheet::SheetWriter;
use crate::types::{DiscoveredImage, ImageKey, RenderReport, RenderedImage, RowIndex};

/// Storage prefix for uploaded renders
pub const UPLOAD_PREFIX: &str = "images";

/// Rendering stage
#[derive(Clone)]
pub struct RenderingStage {
    repository: Arc<dyn ImageRepository>,
    renderer: Arc<dyn Renderer>,
    uploader: Arc<dyn BlobUploader>,
    writer: SheetWriter,
    start_column: String,
    timeouts: Timeouts,
}

impl RenderingStage {
    /// Create stage from configuration
    #[must_use]
    pub fn new(
        repository: Arc<dyn ImageRepository>,
        renderer: Arc<dyn Renderer>,
        uploader: Arc<dyn BlobUploader>,
        writer: SheetWriter,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            repository,
            renderer,
            uploader,
            writer,
            start_column: config.result_start_column.clone(),
            timeouts: config.timeouts,
        }
    }

    /// Render every buffered image of `wallet` and publish the results per row
    ///
    /// Rows are handled in ascending order with one browser session each.
    /// Failed renders and uploads drop their URL; a failed cell write ends
    /// that row's batch. Neither stops the remaining rows.
    ///
    /// # Errors
    /// `PipelineError::Repository` when the wallet's records cannot be read
    pub async fn render_and_publish(
        &self,
        sheet_id: &str,
        wallet: &str,
    ) -> Result<RenderReport, PipelineError> {
        let rows = self
            .repository
            .list_wallet(wallet)
            .await
            .map_err(|source| PipelineError::Repository {
                path: ImageKey::wallet_path(wallet),
                source,
            })?;

        let mut report = RenderReport::default();
        if rows.is_empty() {
            tracing::info!(wallet, "no stored images for wallet");
            return Ok(report);
        }

        let mut cursor = ColumnCursor::new(&self.start_column)?;
        for (row, entries) in &rows {
            let urls = candidate_urls(entries.values());
            if urls.is_empty() {
                continue;
            }
            report.rows += 1;
            cursor.reset();

            let uploaded = self.render_row(wallet, *row, &urls).await;
            report.uploaded += uploaded.len();
            report.dropped += urls.len() - uploaded.len();

            if uploaded.is_empty() {
                tracing::info!(wallet, row, "no images were uploaded for row");
                continue;
            }

            match self
                .writer
                .write_urls(sheet_id, *row, &uploaded, &mut cursor)
                .await
            {
                Ok(written) => report.cells_written += written,
                Err(err) => {
                    if let PipelineError::SheetWrite { written, .. } = &err {
                        report.cells_written += written;
                    }
                    tracing::error!(wallet, row, error = %err, "result urls only partially written");
                }
            }
        }
        Ok(report)
    }

    /// Render and upload `urls` in one browser session, returning public URLs
    async fn render_row(&self, wallet: &str, row: RowIndex, urls: &[String]) -> Vec<String> {
        let mut session = match self.renderer.open_session().await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(wallet, row, error = %err, "could not start renderer");
                return Vec::new();
            }
        };

        let mut uploaded = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            match self.publish_one(session.as_mut(), wallet, row, index, url).await {
                Ok(public_url) => uploaded.push(public_url),
                Err(err) => tracing::warn!(wallet, row, error = %err, "dropping image"),
            }
        }

        if let Err(err) = session.close().await {
            tracing::warn!(wallet, row, error = %err, "renderer did not shut down cleanly");
        }
        uploaded
    }

    async fn publish_one(
        &self,
        session: &mut dyn RenderSession,
        wallet: &str,
        row: RowIndex,
        index: usize,
        url: &str,
    ) -> Result<String, PipelineError> {
        tracing::debug!(url, "rendering");
        let image = with_timeout(self.timeouts.render, session.render(url))
            .await
            .map_err(|source| PipelineError::Render {
                url: url.to_string(),
                source,
            })?;

        let path = upload_path(wallet, row, index, &image);
        let RenderedImage {
            bytes,
            content_type,
            ..
        } = image;
        let public_url = with_timeout(
            self.timeouts.upload,
            self.uploader.upload(&path, bytes, &content_type),
        )
        .await
        .map_err(|source| PipelineError::Upload {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path, public_url = %public_url, "uploaded render");
        Ok(public_url)
    }
}

impl std::fmt::Debug for RenderingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderingStage")
            .field("start_column", &self.start_column)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

/// Ordered render candidates of a row's records
fn candidate_urls<'a>(entries: impl Iterator<Item = &'a DiscoveredImage>) -> Vec<String> {
    entries
        .flat_map(DiscoveredImage::candidate_urls)
        .map(str::to_string)
        .collect()
}

/// Storage path unique per wallet, row, position and time
fn upload_path(wallet: &str, row: RowIndex, index: usize, image: &RenderedImage) -> String {
    format!(
        "{UPLOAD_PREFIX}/{wallet}_{row}_{index}_{}.{}",
        Utc::now().timestamp_millis(),
        image.extension
    )
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ServiceError::Timeout(limit))?
}
