//! Core types for the row-processing pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{EventWindow, StatusLabels};

/// 1-based spreadsheet row number
pub type RowIndex = u32;

/// All discovered images of one wallet, by row then by sequence number
pub type WalletImages = BTreeMap<RowIndex, BTreeMap<u32, DiscoveredImage>>;

/// Processing state of a spreadsheet row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    /// Not yet handled (empty or unrecognised status cell)
    Unprocessed,
    /// At least one qualifying mint was discovered
    Processed,
    /// Discovery found nothing usable for the wallet
    FailedNoAssets,
}

impl RowStatus {
    /// Read a status cell. Unknown or missing values are `Unprocessed`.
    #[must_use]
    pub fn from_cell(value: Option<&str>, labels: &StatusLabels) -> Self {
        match value.map(str::trim) {
            Some(v) if v == labels.processed => Self::Processed,
            Some(v) if v == labels.failed_no_assets => Self::FailedNoAssets,
            _ => Self::Unprocessed,
        }
    }

    /// Rows in a terminal state are skipped on later runs
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unprocessed)
    }

    /// Cell value written for this status
    #[must_use]
    pub fn label<'a>(&self, labels: &'a StatusLabels) -> &'a str {
        match self {
            Self::Unprocessed => "",
            Self::Processed => &labels.processed,
            Self::FailedNoAssets => &labels.failed_no_assets,
        }
    }
}

/// One candidate row read from the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Sheet row number
    pub index: RowIndex,
    /// Wallet address from the first column of the range
    pub wallet: String,
    /// Status from the second column of the range
    pub status: RowStatus,
}

/// Preview image found for a minted asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredImage {
    /// Renderer-friendly preview URL
    #[serde(rename = "preImageUrl")]
    pub preview_image_url: String,
    /// Contract of the minted asset
    #[serde(rename = "contractAddress")]
    pub contract_address: String,
    /// Token id of the minted asset
    #[serde(rename = "tokenId")]
    pub token_id: String,
    /// Alternate image URL assigned after discovery, if any
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl DiscoveredImage {
    /// Create a record from discovery data
    #[inline]
    #[must_use]
    pub fn new(
        preview_image_url: impl Into<String>,
        contract_address: impl Into<String>,
        token_id: impl Into<String>,
    ) -> Self {
        Self {
            preview_image_url: preview_image_url.into(),
            contract_address: contract_address.into(),
            token_id: token_id.into(),
            image_url: None,
        }
    }

    /// With alternate image URL
    #[inline]
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// URLs to render, preview first, blanks skipped
    pub fn candidate_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.preview_image_url.as_str())
            .chain(self.image_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

/// Key of a discovered image in the repository
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    /// Owning wallet
    pub wallet: String,
    /// Row the wallet was read from
    pub row: RowIndex,
    /// Sequence number within the row, starting at 1
    pub sequence: u32,
}

impl ImageKey {
    /// Root path under which all images are stored
    pub const ROOT: &'static str = "nftImages";

    /// Create key
    #[inline]
    #[must_use]
    pub fn new(wallet: impl Into<String>, row: RowIndex, sequence: u32) -> Self {
        Self {
            wallet: wallet.into(),
            row,
            sequence,
        }
    }

    /// Slash-delimited document path, `nftImages/<wallet>/<row>/entry<seq>`
    #[must_use]
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/entry{}",
            Self::ROOT,
            self.wallet,
            self.row,
            self.sequence
        )
    }

    /// Path of all documents of a wallet
    #[must_use]
    pub fn wallet_path(wallet: &str) -> String {
        format!("{}/{wallet}", Self::ROOT)
    }

    /// Path of all documents of one row, `nftImages/<wallet>/<row>`
    #[must_use]
    pub fn row_path(wallet: &str, row: RowIndex) -> String {
        format!("{}/{wallet}/{row}", Self::ROOT)
    }

    /// Parse `entry<seq>` document names
    #[must_use]
    pub fn parse_entry_name(name: &str) -> Option<u32> {
        name.strip_prefix("entry")?.parse().ok()
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Asset owned by a wallet, as reported by the discovery API
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Asset {
    /// Token contract
    pub contract_address: String,
    /// Token id
    pub token_id: String,
    /// Preview image URL, when the API has one
    pub image_preview_url: Option<String>,
}

impl Asset {
    /// Non-blank preview URL
    #[must_use]
    pub fn preview_url(&self) -> Option<&str> {
        self.image_preview_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }
}

/// Lifecycle event of an asset
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetEvent {
    /// Event name as reported by the API (`Minted`, `Transfer`, ...)
    pub event_name: String,
    /// Event time in unix seconds, if reported
    pub event_time: Option<i64>,
}

impl AssetEvent {
    /// Name of the original-issuance event
    pub const MINTED: &'static str = "Minted";

    /// Create event
    #[inline]
    #[must_use]
    pub fn new(event_name: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            event_time: None,
        }
    }

    /// Whether this is the mint event
    #[inline]
    #[must_use]
    pub fn is_mint(&self) -> bool {
        self.event_name == Self::MINTED
    }
}

/// Event history query for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Token contract
    pub contract_address: String,
    /// Token id
    pub token_id: String,
    /// Maximum events returned
    pub limit: u32,
    /// Time window searched
    pub window: EventWindow,
}

/// Rendered, codec-normalized image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub content_type: String,
    /// File extension matching `content_type`
    pub extension: String,
}

impl RenderedImage {
    /// JPEG image
    #[inline]
    #[must_use]
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "image/jpeg".to_string(),
            extension: "jpg".to_string(),
        }
    }
}

/// Result of the discovery stage for one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Listing failed or returned no assets
    NoAssets,
    /// Assets exist but none had a mint event with a preview image in the window
    NoQualifyingMints { assets: usize },
    /// Images were stored
    Processed { images: u32 },
}

impl DiscoveryOutcome {
    /// Whether the row was marked processed
    #[inline]
    #[must_use]
    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }

    /// Status written for this outcome
    #[inline]
    #[must_use]
    pub fn status(&self) -> RowStatus {
        if self.is_processed() {
            RowStatus::Processed
        } else {
            RowStatus::FailedNoAssets
        }
    }
}

/// Counters from one rendering pass over a wallet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Rows with stored images
    pub rows: usize,
    /// Images uploaded
    pub uploaded: usize,
    /// Result cells written
    pub cells_written: usize,
    /// URLs dropped after render or upload failure
    pub dropped: usize,
}

impl RenderReport {
    /// Fold another report into this one
    #[inline]
    pub fn merge(&mut self, other: RenderReport) {
        self.rows += other.rows;
        self.uploaded += other.uploaded;
        self.cells_written += other.cells_written;
        self.dropped += other.dropped;
    }
}

/// Counters from one full pass over the range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows read from the range
    pub rows_seen: usize,
    /// Rows skipped because of a terminal status or blank wallet
    pub skipped: usize,
    /// Rows marked processed
    pub processed: usize,
    /// Rows marked failed
    pub failed: usize,
    /// Rows whose processing raised an error and stay unprocessed
    pub errored: usize,
    /// Rendering counters across all rows
    pub render: RenderReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_cell_uses_labels() {
        let labels = StatusLabels::default();
        assert_eq!(
            RowStatus::from_cell(Some("Processed"), &labels),
            RowStatus::Processed
        );
        assert_eq!(
            RowStatus::from_cell(Some("failed - no nfts"), &labels),
            RowStatus::FailedNoAssets
        );
        assert_eq!(RowStatus::from_cell(Some(""), &labels), RowStatus::Unprocessed);
        assert_eq!(RowStatus::from_cell(None, &labels), RowStatus::Unprocessed);
        assert_eq!(
            RowStatus::from_cell(Some("processing"), &labels),
            RowStatus::Unprocessed
        );
    }

    #[test]
    fn status_labels_round_trip() {
        let labels = StatusLabels::default();
        for status in [RowStatus::Processed, RowStatus::FailedNoAssets] {
            assert_eq!(RowStatus::from_cell(Some(status.label(&labels)), &labels), status);
            assert!(status.is_terminal());
        }
        assert!(!RowStatus::Unprocessed.is_terminal());
    }

    #[test]
    fn image_key_paths() {
        let key = ImageKey::new("0xabc", 7, 2);
        assert_eq!(key.path(), "nftImages/0xabc/7/entry2");
        assert_eq!(ImageKey::wallet_path("0xabc"), "nftImages/0xabc");
        assert_eq!(ImageKey::row_path("0xabc", 7), "nftImages/0xabc/7");
        assert_eq!(ImageKey::parse_entry_name("entry12"), Some(12));
        assert_eq!(ImageKey::parse_entry_name("other"), None);
    }

    #[test]
    fn candidate_urls_skip_blanks() {
        let image = DiscoveredImage::new("https://a.test/p", "0xc", "1");
        assert_eq!(image.candidate_urls().collect::<Vec<_>>(), vec!["https://a.test/p"]);

        let image = image.with_image_url("https://a.test/i");
        assert_eq!(image.candidate_urls().count(), 2);

        let blank = DiscoveredImage::new(" ", "0xc", "1").with_image_url("https://a.test/i");
        assert_eq!(blank.candidate_urls().collect::<Vec<_>>(), vec!["https://a.test/i"]);
    }

    #[test]
    fn discovered_image_document_shape() {
        let image = DiscoveredImage::new("https://a.test/p", "0xc", "42");
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["preImageUrl"], "https://a.test/p");
        assert_eq!(json["contractAddress"], "0xc");
        assert_eq!(json["tokenId"], "42");
        assert!(json.get("imageUrl").is_none());
    }

    #[test]
    fn outcome_status() {
        assert_eq!(
            DiscoveryOutcome::Processed { images: 1 }.status(),
            RowStatus::Processed
        );
        assert_eq!(DiscoveryOutcome::NoAssets.status(), RowStatus::FailedNoAssets);
        assert_eq!(
            DiscoveryOutcome::NoQualifyingMints { assets: 3 }.status(),
            RowStatus::FailedNoAssets
        );
    }
}
