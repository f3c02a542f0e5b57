//! Wire types of the Element open API

use serde::Deserialize;
use serde_json::Value;

use mintshot_core::{Asset, AssetEvent};

/// `{ code, msg, data }` wrapper around every response
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) msg: Option<String>,
    pub(crate) data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetListData {
    #[serde(default)]
    pub(crate) asset_list: Vec<AssetItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssetItem {
    pub(crate) asset: Option<WireAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireAsset {
    #[serde(default)]
    contract_address: String,
    #[serde(default, deserialize_with = "string_or_number")]
    token_id: String,
    #[serde(default)]
    image_preview_url: Option<String>,
}

impl From<WireAsset> for Asset {
    fn from(wire: WireAsset) -> Self {
        Self {
            contract_address: wire.contract_address,
            token_id: wire.token_id,
            image_preview_url: wire.image_preview_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetEventData {
    #[serde(default)]
    pub(crate) asset_event_list: Vec<AssetEventItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetEventItem {
    pub(crate) asset_event: Option<WireEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireEvent {
    #[serde(default)]
    event_name: String,
    #[serde(default)]
    event_time: Option<Value>,
}

impl From<WireEvent> for AssetEvent {
    fn from(wire: WireEvent) -> Self {
        Self {
            event_name: wire.event_name,
            event_time: wire.event_time.as_ref().and_then(unix_seconds),
        }
    }
}

/// Event times arrive as seconds, milliseconds or numeric strings
fn unix_seconds(value: &Value) -> Option<i64> {
    let raw = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some(if raw > 100_000_000_000 { raw / 1000 } else { raw })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
