//! Mintshot Render - page screenshots through headless Chromium
//!
//! Each [`ChromeSession`] owns a throwaway browser profile; every render
//! runs the browser once in `--screenshot` mode and normalizes the PNG it
//! writes to JPEG.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod chrome;
pub mod codec;
pub mod config;
pub mod error;

pub use chrome::{ChromeRenderer, ChromeSession};
pub use codec::normalize_to_jpeg;
pub use config::ChromeConfig;
pub use error::RenderError;
