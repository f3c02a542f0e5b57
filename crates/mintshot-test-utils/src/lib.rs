//! Testing utilities for the Mintshot workspace
//!
//! In-memory stand-ins for every collaborator, with failure injection and
//! call logs, plus small fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use mintshot_core::{
    Asset, AssetDiscovery, AssetEvent, BlobUploader, CellRef, Collaborators, DiscoveredImage,
    EventQuery, ImageKey, ImageRepository, Orchestrator, PipelineConfig, RenderSession,
    RenderedImage, Renderer, RowIndex, ServiceError, SheetClient, WalletImages,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
    writes: Mutex<Vec<(String, String)>>,
    failing_cells: Mutex<HashSet<String>>,
    fail_reads: Mutex<bool>,
    write_attempts: AtomicUsize,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by every range read
    pub fn with_rows<I, R, S>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.rows.lock() = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    /// Make writes to `cell` (as displayed, e.g. `Q5`) fail
    pub fn fail_cell(&self, cell: &str) {
        self.failing_cells.lock().insert(cell.to_string());
    }

    pub fn fail_reads(&self) {
        *self.fail_reads.lock() = true;
    }

    /// Successful writes in order, as (cell, value)
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().clone()
    }

    /// Every write call, including failed ones
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Latest value written to `cell`
    pub fn cell(&self, cell: &str) -> Option<String> {
        self.writes
            .lock()
            .iter()
            .rev()
            .find(|(c, _)| c == cell)
            .map(|(_, v)| v.clone())
    }

    /// Successful writes to `row`, excluding `status_column`
    pub fn result_writes(&self, row: RowIndex, status_column: &str) -> Vec<(String, String)> {
        let status_cell = format!("{status_column}{row}");
        let suffix = row.to_string();
        self.writes()
            .into_iter()
            .filter(|(cell, _)| {
                let bare = cell.rsplit('!').next().unwrap_or(cell);
                bare != status_cell
                    && bare.ends_with(&suffix)
                    && bare[..bare.len() - suffix.len()]
                        .chars()
                        .all(|c| c.is_ascii_alphabetic())
            })
            .collect()
    }
}

#[async_trait]
impl SheetClient for InMemorySheet {
    async fn read_range(
        &self,
        _spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, ServiceError> {
        if *self.fail_reads.lock() {
            return Err(ServiceError::Request(format!("cannot read {range}")));
        }
        Ok(self.rows.lock().clone())
    }

    async fn write_cell(
        &self,
        _spreadsheet_id: &str,
        cell: &CellRef,
        value: &str,
    ) -> Result<(), ServiceError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let cell = cell.to_string();
        if self.failing_cells.lock().contains(&cell) {
            return Err(ServiceError::Status {
                status: 500,
                body: format!("write to {cell} rejected"),
            });
        }
        self.writes.lock().push((cell, value.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Image repository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: Mutex<BTreeMap<(String, RowIndex, u32), DiscoveredImage>>,
    puts: AtomicUsize,
    fail_puts: Mutex<bool>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record without counting it as a put
    pub fn insert(&self, key: &ImageKey, image: DiscoveredImage) {
        self.records
            .lock()
            .insert((key.wallet.clone(), key.row, key.sequence), image);
    }

    pub fn fail_puts(&self) {
        *self.fail_puts.lock() = true;
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Paths of all stored records
    pub fn paths(&self) -> Vec<String> {
        self.records
            .lock()
            .keys()
            .map(|(wallet, row, seq)| ImageKey::new(wallet.clone(), *row, *seq).path())
            .collect()
    }
}

#[async_trait]
impl ImageRepository for InMemoryRepository {
    async fn put(&self, key: &ImageKey, image: &DiscoveredImage) -> Result<(), ServiceError> {
        if *self.fail_puts.lock() {
            return Err(ServiceError::Status {
                status: 503,
                body: "database unavailable".to_string(),
            });
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.insert(key, image.clone());
        Ok(())
    }

    async fn get(&self, key: &ImageKey) -> Result<Option<DiscoveredImage>, ServiceError> {
        Ok(self
            .records
            .lock()
            .get(&(key.wallet.clone(), key.row, key.sequence))
            .cloned())
    }

    async fn list_wallet(&self, wallet: &str) -> Result<WalletImages, ServiceError> {
        let mut out = WalletImages::new();
        for ((owner, row, seq), image) in self.records.lock().iter() {
            if owner == wallet {
                out.entry(*row).or_default().insert(*seq, image.clone());
            }
        }
        Ok(out)
    }

    async fn clear_row(&self, wallet: &str, row: RowIndex) -> Result<(), ServiceError> {
        self.records
            .lock()
            .retain(|(owner, at, _), _| !(owner == wallet && *at == row));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Asset discovery
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeDiscovery {
    assets: Mutex<HashMap<String, Vec<Asset>>>,
    failing_wallets: Mutex<HashSet<String>>,
    events: Mutex<HashMap<(String, String), Vec<AssetEvent>>>,
    failing_tokens: Mutex<HashSet<String>>,
    asset_calls: AtomicUsize,
    event_calls: AtomicUsize,
}

impl FakeDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(self, wallet: &str, assets: Vec<Asset>) -> Self {
        self.assets.lock().insert(wallet.to_string(), assets);
        self
    }

    /// Events for every asset with this contract and token
    pub fn with_events(self, contract: &str, token_id: &str, events: Vec<AssetEvent>) -> Self {
        self.events
            .lock()
            .insert((contract.to_string(), token_id.to_string()), events);
        self
    }

    pub fn fail_wallet(&self, wallet: &str) {
        self.failing_wallets.lock().insert(wallet.to_string());
    }

    /// Make event queries for `token_id` fail
    pub fn fail_events_for(&self, token_id: &str) {
        self.failing_tokens.lock().insert(token_id.to_string());
    }

    pub fn asset_calls(&self) -> usize {
        self.asset_calls.load(Ordering::SeqCst)
    }

    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetDiscovery for FakeDiscovery {
    async fn list_assets(
        &self,
        _chain: &str,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<Asset>, ServiceError> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_wallets.lock().contains(wallet) {
            return Err(ServiceError::Status {
                status: 502,
                body: "upstream error".to_string(),
            });
        }
        let assets = self.assets.lock().get(wallet).cloned().unwrap_or_default();
        Ok(assets.into_iter().take(limit as usize).collect())
    }

    async fn list_events(
        &self,
        _chain: &str,
        query: &EventQuery,
    ) -> Result<Vec<AssetEvent>, ServiceError> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_tokens.lock().contains(&query.token_id) {
            return Err(ServiceError::Request("connection reset".to_string()));
        }
        Ok(self
            .events
            .lock()
            .get(&(query.contract_address.clone(), query.token_id.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RendererState {
    failing_urls: Mutex<HashSet<String>>,
    fail_open: Mutex<bool>,
    rendered: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Renderer producing `RenderedImage::jpeg(url bytes)`
#[derive(Debug, Default, Clone)]
pub struct FakeRenderer {
    state: Arc<RendererState>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_url(&self, url: &str) {
        self.state.failing_urls.lock().insert(url.to_string());
    }

    pub fn fail_open(&self) {
        *self.state.fail_open.lock() = true;
    }

    /// URLs rendered successfully, in order
    pub fn rendered(&self) -> Vec<String> {
        self.state.rendered.lock().clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ServiceError> {
        if *self.state.fail_open.lock() {
            return Err(ServiceError::Local("browser failed to launch".to_string()));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSession {
    state: Arc<RendererState>,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn render(&mut self, url: &str) -> Result<RenderedImage, ServiceError> {
        if self.state.failing_urls.lock().contains(url) {
            return Err(ServiceError::Local(format!("navigation to {url} failed")));
        }
        self.state.rendered.lock().push(url.to_string());
        Ok(RenderedImage::jpeg(url.as_bytes().to_vec()))
    }

    async fn close(self: Box<Self>) -> Result<(), ServiceError> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob uploader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Uploader returning `https://blobs.test/<path>`
#[derive(Debug, Default)]
pub struct FakeUploader {
    uploads: Mutex<Vec<Upload>>,
    failing_payloads: Mutex<HashSet<Vec<u8>>>,
}

impl FakeUploader {
    pub const BASE_URL: &'static str = "https://blobs.test";

    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads of the render of `url` (the fake renderer's bytes are the URL)
    pub fn fail_render_of(&self, url: &str) {
        self.failing_payloads.lock().insert(url.as_bytes().to_vec());
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl BlobUploader for FakeUploader {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ServiceError> {
        if self.failing_payloads.lock().contains(&bytes) {
            return Err(ServiceError::Status {
                status: 403,
                body: "storage rules rejected upload".to_string(),
            });
        }
        self.uploads.lock().push(Upload {
            path: path.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(format!("{}/{path}", Self::BASE_URL))
    }
}

// ---------------------------------------------------------------------------
// Harness and fixtures
// ---------------------------------------------------------------------------

/// All fakes wired together
#[derive(Debug, Clone)]
pub struct Harness {
    pub sheet: Arc<InMemorySheet>,
    pub repository: Arc<InMemoryRepository>,
    pub discovery: Arc<FakeDiscovery>,
    pub renderer: FakeRenderer,
    pub uploader: Arc<FakeUploader>,
}

impl Harness {
    pub fn new(sheet: InMemorySheet, discovery: FakeDiscovery) -> Self {
        Self {
            sheet: Arc::new(sheet),
            repository: Arc::new(InMemoryRepository::new()),
            discovery: Arc::new(discovery),
            renderer: FakeRenderer::new(),
            uploader: Arc::new(FakeUploader::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            sheets: self.sheet.clone(),
            repository: self.repository.clone(),
            discovery: self.discovery.clone(),
            renderer: Arc::new(self.renderer.clone()),
            uploader: self.uploader.clone(),
        }
    }

    pub fn orchestrator(&self, config: PipelineConfig) -> Orchestrator {
        Orchestrator::new(config, self.collaborators()).unwrap()
    }
}

pub const TEST_CONTRACT: &str = "0xcontract";

/// Asset of `TEST_CONTRACT` with a preview URL derived from the token id
pub fn asset(token_id: &str) -> Asset {
    Asset {
        contract_address: TEST_CONTRACT.to_string(),
        token_id: token_id.to_string(),
        image_preview_url: Some(preview_url(token_id)),
    }
}

pub fn asset_without_preview(token_id: &str) -> Asset {
    Asset {
        image_preview_url: None,
        ..asset(token_id)
    }
}

pub fn preview_url(token_id: &str) -> String {
    format!("https://preview.test/{TEST_CONTRACT}/{token_id}")
}

pub fn mint_history() -> Vec<AssetEvent> {
    vec![AssetEvent::new("Transfer"), AssetEvent::new(AssetEvent::MINTED)]
}

pub fn transfer_history() -> Vec<AssetEvent> {
    vec![AssetEvent::new("Transfer"), AssetEvent::new("Sale")]
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig::new("test-sheet")
}
