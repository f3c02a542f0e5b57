//! Element client against a mock HTTP server

use httpmock::prelude::*;
use mintshot_core::{AssetDiscovery, EventQuery, EventWindow, ServiceError};
use mintshot_element::{ElementClient, ElementConfig};
use pretty_assertions::assert_eq;
use serde_json::json;

fn client(server: &MockServer) -> ElementClient {
    ElementClient::new(&ElementConfig::new("element-key").with_base_url(server.url("/openapi/v1")))
        .unwrap()
}

fn query(token_id: &str) -> EventQuery {
    EventQuery {
        contract_address: "0xc".to_string(),
        token_id: token_id.to_string(),
        limit: 20,
        window: EventWindow::new(1_708_340_036, 1_710_068_036).unwrap(),
    }
}

#[tokio::test]
async fn lists_wallet_assets_with_api_key() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/openapi/v1/account/assetList")
                .header("x-api-key", "element-key")
                .query_param("chain", "zksync")
                .query_param("wallet_address", "0xwallet")
                .query_param("limit", "20");
            then.status(200).json_body(json!({
                "code": 0,
                "msg": "success",
                "data": {"assetList": [
                    {"asset": {"contractAddress": "0xc", "tokenId": "1", "imagePreviewUrl": "https://p/1"}},
                    {"asset": {"contractAddress": "0xc", "tokenId": "2"}}
                ]}
            }));
        })
        .await;

    let assets = client(&server)
        .list_assets("zksync", "0xwallet", 20)
        .await
        .unwrap();

    list.assert_async().await;
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].preview_url(), Some("https://p/1"));
    assert_eq!(assets[1].preview_url(), None);
}

#[tokio::test]
async fn empty_data_is_an_empty_listing() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/openapi/v1/account/assetList");
            then.status(200)
                .json_body(json!({"code": 0, "msg": "success", "data": null}));
        })
        .await;

    let assets = client(&server)
        .list_assets("zksync", "0xempty", 20)
        .await
        .unwrap();
    assert!(assets.is_empty());
}

#[tokio::test]
async fn non_zero_code_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/openapi/v1/account/assetList");
            then.status(200)
                .json_body(json!({"code": 401, "msg": "invalid api key", "data": null}));
        })
        .await;

    let err = client(&server)
        .list_assets("zksync", "0xwallet", 20)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Auth(m) if m == "invalid api key"));
}

#[tokio::test]
async fn http_failure_keeps_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/openapi/v1/asset/assetEvents");
            then.status(503).body("maintenance");
        })
        .await;

    let err = client(&server)
        .list_events("zksync", &query("1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 503, .. }));
}

#[tokio::test]
async fn events_query_carries_window_and_drops_out_of_window_times() {
    let server = MockServer::start_async().await;
    let events = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/openapi/v1/asset/assetEvents")
                .query_param("chain", "zksync")
                .query_param("contract_address", "0xc")
                .query_param("token_id", "7")
                .query_param("limit", "20")
                .query_param("from_time", "1708340036")
                .query_param("to_time", "1710068036");
            then.status(200).json_body(json!({
                "code": 0,
                "msg": "success",
                "data": {"assetEventList": [
                    {"assetEvent": {"eventName": "Transfer", "eventTime": 1_709_000_000}},
                    {"assetEvent": {"eventName": "Minted", "eventTime": "1600000000"}},
                    {"assetEvent": {"eventName": "Minted"}},
                    {"assetEvent": null}
                ]}
            }));
        })
        .await;

    let found = client(&server)
        .list_events("zksync", &query("7"))
        .await
        .unwrap();

    events.assert_async().await;
    let names: Vec<&str> = found.iter().map(|e| e.event_name.as_str()).collect();
    assert_eq!(names, vec!["Transfer", "Minted"]);
    assert!(found[1].is_mint());
    assert_eq!(found[1].event_time, None);
}
