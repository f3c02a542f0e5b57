//! Trait seams for the external services the pipeline drives
//!
//! Every adapter crate implements one or more of these traits. The
//! pipeline only ever sees `Arc<dyn Trait>`, so tests swap in the
//! in-memory fakes from `mintshot-test-utils`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::range::CellRef;
use crate::types::{
    Asset, AssetEvent, DiscoveredImage, EventQuery, ImageKey, RenderedImage, RowIndex,
    WalletImages,
};

/// Spreadsheet values API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SheetClient: Send + Sync {
    /// Read a range as rows of cell strings; trailing empty cells may be absent
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError>;

    /// Overwrite a single cell with a raw value
    async fn write_cell(
        &self,
        spreadsheet_id: &str,
        cell: &CellRef,
        value: &str,
    ) -> Result<(), ServiceError>;
}

/// Durable buffer between discovery and rendering
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Store a record, replacing any previous one at the key
    async fn put(&self, key: &ImageKey, image: &DiscoveredImage) -> Result<(), ServiceError>;

    /// Fetch one record
    async fn get(&self, key: &ImageKey) -> Result<Option<DiscoveredImage>, ServiceError>;

    /// Fetch every record of a wallet
    async fn list_wallet(&self, wallet: &str) -> Result<WalletImages, ServiceError>;

    /// Remove every record of one row; clearing an empty row succeeds
    async fn clear_row(&self, wallet: &str, row: RowIndex) -> Result<(), ServiceError>;
}

/// NFT indexing API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetDiscovery: Send + Sync {
    /// Assets owned by `wallet` on `chain`, at most `limit`
    async fn list_assets(
        &self,
        chain: &str,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<Asset>, ServiceError>;

    /// Event history of one asset inside the query window
    async fn list_events(
        &self,
        chain: &str,
        query: &EventQuery,
    ) -> Result<Vec<AssetEvent>, ServiceError>;
}

/// Headless browser able to open rendering sessions
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Start a browser session; the caller must `close` it on every path
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ServiceError>;
}

/// One browser instance, used for all URLs of a row
#[async_trait]
pub trait RenderSession: Send {
    /// Load `url`, wait for the page to settle and return a normalized screenshot
    async fn render(&mut self, url: &str) -> Result<RenderedImage, ServiceError>;

    /// Tear down the browser and its resources
    async fn close(self: Box<Self>) -> Result<(), ServiceError>;
}

/// Object storage returning public URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Store `bytes` at `path` and return a publicly resolvable URL
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ServiceError>;
}

/// The full set of collaborators a pipeline needs
#[derive(Clone)]
pub struct Collaborators {
    /// Spreadsheet API
    pub sheets: Arc<dyn SheetClient>,
    /// Image repository
    pub repository: Arc<dyn ImageRepository>,
    /// Asset discovery API
    pub discovery: Arc<dyn AssetDiscovery>,
    /// Renderer
    pub renderer: Arc<dyn Renderer>,
    /// Blob uploader
    pub uploader: Arc<dyn BlobUploader>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
