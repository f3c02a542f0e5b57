//! Mintshot Element - asset discovery through the Element market open API
//!
//! [`ElementClient`] implements `AssetDiscovery` with two calls:
//! - `GET /account/assetList` for the assets a wallet holds on a chain
//! - `GET /asset/assetEvents` for one asset's events inside a time window

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod error;
mod model;

pub use client::{ElementClient, ElementConfig};
pub use error::ElementError;
