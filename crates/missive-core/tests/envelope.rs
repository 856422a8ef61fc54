//! Envelope shape and configuration-resolution tests.

use missive_core::{
    extract, ConfigStore, PaginationParams, Response, ResponseConfig, DEFAULT_CONTENT_TYPE,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn encode(response: &Response) -> Value {
    serde_json::to_value(response).unwrap()
}

#[test]
fn test_minimal_envelope_omits_unset_fields() {
    let store = Arc::new(ConfigStore::new());
    let body = encode(&Response::no_content(&store, ""));

    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2, "unexpected keys: {keys:?}");
    assert_eq!(body["code"], 204);
    assert!(body["timestamp"].is_string());
}

#[test]
fn test_full_envelope() {
    let store = Arc::new(ConfigStore::new());
    let response = Response::ok(&store, "listed")
        .with_module("orders")
        .with_data(json!([{"id": 1}]))
        .paginate(PaginationParams { page: 1, limit: 1 }, 2)
        .with_trace_prefix("orders")
        .add_trace(["cache miss"]);

    let body = encode(&response);
    assert_eq!(body["module"], "orders");
    assert_eq!(body["message"], "listed");
    assert_eq!(body["data"], json!([{"id": 1}]));
    assert_eq!(body["trace"], json!(["orders: cache miss"]));
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["pagination"]["next_page"], 2);
    assert_eq!(body["code"], 200);
}

#[test]
fn test_null_payload_is_omitted() {
    let store = Arc::new(ConfigStore::new());
    let body = encode(&Response::ok(&store, "empty").with_data(Option::<u8>::None));
    assert!(body.get("data").is_none());
}

#[test]
fn test_store_update_seen_by_new_responses_only_for_defaults() {
    let store = Arc::new(ConfigStore::new());
    let before = Response::ok(&store, "before");

    store.update(ResponseConfig {
        default_content_type: "application/vnd.missive+json".to_string(),
        ..ResponseConfig::default()
    });
    let after = Response::ok(&store, "after");

    assert_eq!(before.content_type(), DEFAULT_CONTENT_TYPE);
    assert_eq!(after.content_type(), "application/vnd.missive+json");
}

#[test]
fn test_override_replaces_store_wholesale() {
    let store = Arc::new(ConfigStore::with_config(ResponseConfig {
        max_trace_size: 2,
        ..ResponseConfig::default()
    }));
    let response = Response::ok(&store, "x").with_config(ResponseConfig {
        max_trace_size: 5,
        ..ResponseConfig::unset()
    });

    let resolved = response.resolved_config();
    assert_eq!(resolved.max_trace_size, 5);
    assert_eq!(resolved.response_size_limit, 10 * 1024 * 1024);

    let response = response.add_trace(["1", "2", "3", "4"]);
    assert_eq!(response.trace().len(), 4);
}

#[test]
fn test_encoded_response_decodes_on_the_client() {
    let store = Arc::new(ConfigStore::new());
    let response = Response::created(&store, "made")
        .with_data(json!({"id": 9}))
        .add_prefixed_trace("db", ["inserted"]);
    let body = serde_json::to_vec(&response).unwrap();

    let (envelope, data) = extract::<Value>(&body).unwrap();
    assert_eq!(envelope.code, Some(201));
    assert_eq!(envelope.trace, vec!["db: inserted".to_string()]);
    assert_eq!(envelope.timestamp, Some(response.timestamp()));
    assert_eq!(data, Some(json!({"id": 9})));
}
