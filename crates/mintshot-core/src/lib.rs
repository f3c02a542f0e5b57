//! Mintshot Core - spreadsheet-driven mint discovery and publishing pipeline
//!
//! The pipeline:
//! - Reads wallet rows and their status from a spreadsheet range
//! - Discovers minted assets per wallet and buffers their preview images
//! - Renders buffered previews to normalized screenshots and uploads them
//! - Writes the public URLs back across the row, then leaves a status marker
//!   that makes later runs skip the row
//!
//! External services are reached only through the traits in
//! [`collaborators`]; concrete adapters live in sibling crates.
//!
//! # Example
//!
//! ```rust,ignore
//! use mintshot_core::{Collaborators, Orchestrator, PipelineConfig};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::new("spreadsheet-id");
//! let orchestrator = Orchestrator::new(config, collaborators)?;
//!
//! let summary = orchestrator.run().await?;
//! println!("processed {} rows", summary.processed);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod collaborators;
pub mod config;
pub mod cursor;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod range;
pub mod rendering;
pub mod sheet;
pub mod types;

// Re-exports for convenience
pub use collaborators::{
    AssetDiscovery, BlobUploader, Collaborators, ImageRepository, RenderSession, Renderer,
    SheetClient,
};
pub use config::{ConfigError, EventWindow, PipelineConfig, StatusLabels, Timeouts};
pub use cursor::ColumnCursor;
pub use discovery::DiscoveryStage;
pub use error::{BoxError, PipelineError, ServiceError};
pub use orchestrator::Orchestrator;
pub use range::{CellRef, RangeSpec};
pub use rendering::RenderingStage;
pub use sheet::{SheetWriter, StatusStore};
pub use types::{
    Asset, AssetEvent, DiscoveredImage, DiscoveryOutcome, EventQuery, ImageKey, RenderReport,
    RenderedImage, Row, RowIndex, RowStatus, RunSummary, WalletImages,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for wiring a pipeline
    pub use crate::{
        Collaborators, Orchestrator, PipelineConfig, PipelineError, RangeSpec, RunSummary,
        ServiceError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
