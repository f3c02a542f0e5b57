//! Mintshot Google - REST adapters for the Google side of the pipeline
//!
//! - [`TokenProvider`]: OAuth2 access tokens with refresh-on-expiry and
//!   one-time authorization code exchange
//! - [`SheetsClient`]: Sheets v4 values API, implements `SheetClient`
//! - [`FirebaseImageRepository`]: Realtime Database REST, implements
//!   `ImageRepository`
//! - [`FirebaseStorage`]: Storage upload with download-token URLs,
//!   implements `BlobUploader`

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod database;
pub mod error;
mod http;
pub mod oauth;
pub mod sheets;
pub mod storage;

pub use config::{DatabaseConfig, OAuthConfig, SheetsConfig, StorageConfig};
pub use database::FirebaseImageRepository;
pub use error::GoogleError;
pub use oauth::{TokenProvider, TokenSet};
pub use sheets::SheetsClient;
pub use storage::FirebaseStorage;
