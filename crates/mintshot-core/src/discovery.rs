//! Discovery stage: find minted assets of a wallet and buffer their preview images

use std::sync::Arc;

use crate::collaborators::{AssetDiscovery, ImageRepository};
use crate::config::{EventWindow, PipelineConfig};
use crate::error::PipelineError;
use crate::sheet::StatusStore;
use crate::types::{Asset, DiscoveredImage, DiscoveryOutcome, EventQuery, ImageKey, RowIndex};

/// Discovery stage
#[derive(Clone)]
pub struct DiscoveryStage {
    discovery: Arc<dyn AssetDiscovery>,
    repository: Arc<dyn ImageRepository>,
    status: StatusStore,
    chain: String,
    asset_limit: u32,
    event_limit: u32,
    window: EventWindow,
}

impl DiscoveryStage {
    /// Create stage from configuration
    #[must_use]
    pub fn new(
        discovery: Arc<dyn AssetDiscovery>,
        repository: Arc<dyn ImageRepository>,
        status: StatusStore,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            discovery,
            repository,
            status,
            chain: config.chain.clone(),
            asset_limit: config.asset_limit,
            event_limit: config.event_limit,
            window: config.event_window,
        }
    }

    /// Discover mints of `wallet`, store their images under `row`, and mark the row
    ///
    /// # Workflow
    /// 0. Drop records left under `row` by an earlier, interrupted run
    /// 1. List the wallet's assets; none (or a failed listing) marks the row failed
    /// 2. For each asset, look for a `Minted` event inside the window
    /// 3. Store a record for every minted asset with a preview URL
    /// 4. Mark the row processed when at least one record was stored
    ///
    /// A failed event query only skips that asset. A failed status write is
    /// logged; the row then stays unprocessed and is retried on the next run.
    ///
    /// # Errors
    /// `PipelineError::Repository` when the row cannot be cleared or a record
    /// cannot be stored. The row is left unmarked so the next run starts it over.
    pub async fn discover_and_store(
        &self,
        sheet_id: &str,
        wallet: &str,
        row: RowIndex,
    ) -> Result<DiscoveryOutcome, PipelineError> {
        self.repository
            .clear_row(wallet, row)
            .await
            .map_err(|source| PipelineError::Repository {
                path: ImageKey::row_path(wallet, row),
                source,
            })?;

        let assets = match self
            .discovery
            .list_assets(&self.chain, wallet, self.asset_limit)
            .await
        {
            Ok(assets) => assets,
            Err(source) => {
                let err = PipelineError::Discovery {
                    wallet: wallet.to_string(),
                    source,
                };
                tracing::warn!(error = %err, "asset listing failed");
                return Ok(self.finish(sheet_id, row, DiscoveryOutcome::NoAssets).await);
            }
        };

        if assets.is_empty() {
            tracing::info!(wallet, "no assets found");
            return Ok(self.finish(sheet_id, row, DiscoveryOutcome::NoAssets).await);
        }

        let mut stored = 0u32;
        for asset in &assets {
            let Some(image) = self.qualifying_image(asset).await else {
                continue;
            };
            let key = ImageKey::new(wallet, row, stored + 1);
            self.repository
                .put(&key, &image)
                .await
                .map_err(|source| PipelineError::Repository {
                    path: key.path(),
                    source,
                })?;
            tracing::info!(key = %key, url = %image.preview_image_url, "stored preview image");
            stored += 1;
        }

        let outcome = if stored > 0 {
            DiscoveryOutcome::Processed { images: stored }
        } else {
            tracing::info!(wallet, assets = assets.len(), "no minted asset with a preview image");
            DiscoveryOutcome::NoQualifyingMints {
                assets: assets.len(),
            }
        };
        Ok(self.finish(sheet_id, row, outcome).await)
    }

    /// Image record for `asset` if it was minted in the window and has a preview
    async fn qualifying_image(&self, asset: &Asset) -> Option<DiscoveredImage> {
        let query = EventQuery {
            contract_address: asset.contract_address.clone(),
            token_id: asset.token_id.clone(),
            limit: self.event_limit,
            window: self.window,
        };

        let events = match self.discovery.list_events(&self.chain, &query).await {
            Ok(events) => events,
            Err(source) => {
                let err = PipelineError::EventQuery {
                    contract_address: query.contract_address,
                    token_id: query.token_id,
                    source,
                };
                tracing::warn!(error = %err, "skipping asset");
                return None;
            }
        };

        if !events.iter().any(|event| event.is_mint()) {
            tracing::debug!(
                contract = %asset.contract_address,
                token_id = %asset.token_id,
                "no mint event in window"
            );
            return None;
        }

        let Some(preview) = asset.preview_url() else {
            tracing::debug!(
                contract = %asset.contract_address,
                token_id = %asset.token_id,
                "minted asset has no preview image"
            );
            return None;
        };

        Some(DiscoveredImage::new(
            preview,
            asset.contract_address.clone(),
            asset.token_id.clone(),
        ))
    }

    async fn finish(
        &self,
        sheet_id: &str,
        row: RowIndex,
        outcome: DiscoveryOutcome,
    ) -> DiscoveryOutcome {
        if let Err(err) = self.status.mark_status(sheet_id, row, outcome.status()).await {
            tracing::error!(error = %err, "status not recorded, row will be retried");
        }
        outcome
    }
}

impl std::fmt::Debug for DiscoveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryStage")
            .field("chain", &self.chain)
            .field("asset_limit", &self.asset_limit)
            .field("event_limit", &self.event_limit)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockAssetDiscovery, MockImageRepository, MockSheetClient};
    use crate::config::StatusLabels;
    use crate::error::ServiceError;
    use crate::types::AssetEvent;

    fn asset(token: &str, preview: Option<&str>) -> Asset {
        Asset {
            contract_address: "0xcontract".to_string(),
            token_id: token.to_string(),
            image_preview_url: preview.map(str::to_string),
        }
    }

    fn stage(
        discovery: MockAssetDiscovery,
        repository: MockImageRepository,
        sheets: MockSheetClient,
    ) -> DiscoveryStage {
        let config = PipelineConfig::new("sheet").with_event_window(EventWindow { from: 10, to: 20 });
        let status = StatusStore::new(Arc::new(sheets), None, "P", StatusLabels::default());
        DiscoveryStage::new(Arc::new(discovery), Arc::new(repository), status, &config)
    }

    fn expect_status(sheets: &mut MockSheetClient, label: &'static str) {
        sheets
            .expect_write_cell()
            .withf(move |_, cell, value| cell.to_string() == "P3" && value == label)
            .times(1)
            .returning(|_, _, _| Ok(()));
    }

    fn expect_clear(repository: &mut MockImageRepository) {
        repository
            .expect_clear_row()
            .withf(|wallet, row| wallet == "0xw" && *row == 3)
            .times(1)
            .returning(|_, _| Ok(()));
    }

    #[tokio::test]
    async fn event_query_failure_skips_only_that_asset() {
        let mut discovery = MockAssetDiscovery::new();
        discovery
            .expect_list_assets()
            .returning(|_, _, _| Ok(vec![asset("1", Some("https://p/1")), asset("2", Some("https://p/2"))]));
        discovery.expect_list_events().returning(|chain, query| {
            assert_eq!(chain, "zksync");
            assert_eq!(query.window, EventWindow { from: 10, to: 20 });
            if query.token_id == "1" {
                Err(ServiceError::Request("reset".to_string()))
            } else {
                Ok(vec![AssetEvent::new("Transfer"), AssetEvent::new("Minted")])
            }
        });

        let mut repository = MockImageRepository::new();
        expect_clear(&mut repository);
        repository
            .expect_put()
            .withf(|key, image| {
                key.path() == "nftImages/0xw/3/entry1" && image.token_id == "2"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sheets = MockSheetClient::new();
        expect_status(&mut sheets, "Processed");

        let outcome = stage(discovery, repository, sheets)
            .discover_and_store("sheet", "0xw", 3)
            .await
            .unwrap();
        assert_eq!(outcome, DiscoveryOutcome::Processed { images: 1 });
    }

    #[tokio::test]
    async fn listing_failure_marks_row_failed() {
        let mut discovery = MockAssetDiscovery::new();
        discovery
            .expect_list_assets()
            .returning(|_, _, _| Err(ServiceError::Status { status: 500, body: String::new() }));
        discovery.expect_list_events().never();

        let mut repository = MockImageRepository::new();
        expect_clear(&mut repository);
        repository.expect_put().never();

        let mut sheets = MockSheetClient::new();
        expect_status(&mut sheets, "failed - no nfts");

        let outcome = stage(discovery, repository, sheets)
            .discover_and_store("sheet", "0xw", 3)
            .await
            .unwrap();
        assert_eq!(outcome, DiscoveryOutcome::NoAssets);
    }

    #[tokio::test]
    async fn mint_without_preview_does_not_count() {
        let mut discovery = MockAssetDiscovery::new();
        discovery
            .expect_list_assets()
            .returning(|_, _, _| Ok(vec![asset("1", None), asset("2", Some("  "))]));
        discovery
            .expect_list_events()
            .returning(|_, _| Ok(vec![AssetEvent::new("Minted")]));

        let mut repository = MockImageRepository::new();
        expect_clear(&mut repository);
        repository.expect_put().never();

        let mut sheets = MockSheetClient::new();
        expect_status(&mut sheets, "failed - no nfts");

        let outcome = stage(discovery, repository, sheets)
            .discover_and_store("sheet", "0xw", 3)
            .await
            .unwrap();
        assert_eq!(outcome, DiscoveryOutcome::NoQualifyingMints { assets: 2 });
    }

    #[tokio::test]
    async fn repository_failure_leaves_row_unmarked() {
        let mut discovery = MockAssetDiscovery::new();
        discovery
            .expect_list_assets()
            .returning(|_, _, _| Ok(vec![asset("1", Some("https://p/1"))]));
        discovery
            .expect_list_events()
            .returning(|_, _| Ok(vec![AssetEvent::new("Minted")]));

        let mut repository = MockImageRepository::new();
        expect_clear(&mut repository);
        repository
            .expect_put()
            .returning(|_, _| Err(ServiceError::Auth("denied".to_string())));

        let mut sheets = MockSheetClient::new();
        sheets.expect_write_cell().never();

        let err = stage(discovery, repository, sheets)
            .discover_and_store("sheet", "0xw", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Repository { .. }));
    }

    #[tokio::test]
    async fn clear_failure_stops_before_listing() {
        let mut discovery = MockAssetDiscovery::new();
        discovery.expect_list_assets().never();

        let mut repository = MockImageRepository::new();
        repository
            .expect_clear_row()
            .returning(|_, _| Err(ServiceError::Status { status: 503, body: String::new() }));
        repository.expect_put().never();

        let mut sheets = MockSheetClient::new();
        sheets.expect_write_cell().never();

        let err = stage(discovery, repository, sheets)
            .discover_and_store("sheet", "0xw", 3)
            .await
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::Repository { ref path, .. } if path == "nftImages/0xw/3")
        );
    }
}
