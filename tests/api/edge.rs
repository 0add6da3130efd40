use crate::helpers::{spawn_edge, spawn_stages, RecordingSink};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn postal_code_weather_round_trip_through_both_stages() {
    let stages = spawn_stages().await;
    stages.resolution.mock_city("01310100", "São Paulo").await;
    stages.resolution.mock_temperature("São Paulo", 25.0).await;

    let response = stages.edge.post_json("zipcode", &json!({ "cep": "01310100" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "city": "São Paulo", "temp_C": 25.0, "temp_F": 77.0, "temp_K": 25.0 + 273.15 })
    );
}

#[tokio::test]
async fn downstream_error_envelope_is_relayed_unchanged() {
    let stages = spawn_stages().await;
    stages.resolution.mock_unknown_code("00000000").await;

    let response = stages.edge.post_json("zipcode", &json!({ "cep": "00000000" })).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "can not find zipcode" }));
}

#[tokio::test]
async fn downstream_status_and_body_are_relayed_byte_for_byte() {
    let downstream = MockServer::start().await;
    let raw_body = r#"{"message":"upstream hiccup","detail":[1,2,3]}"#;
    Mock::given(method("POST"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("content-type", "text/plain")
                .set_body_string(raw_body),
        )
        .expect(1)
        .mount(&downstream)
        .await;

    let edge = spawn_edge(&downstream.uri(), Duration::from_secs(2), &RecordingSink::default()).await;
    let response = edge.post_json("zipcode", &json!({ "cep": "01310100" })).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.text().await.unwrap(), raw_body);
}

#[tokio::test]
async fn invalid_postal_codes_are_rejected_before_forwarding() {
    let downstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&downstream)
        .await;

    let edge = spawn_edge(&downstream.uri(), Duration::from_secs(2), &RecordingSink::default()).await;

    for body in [json!({ "cep": "123" }), json!({ "cep": 12345678 }), json!({ "zip": "01310100" })] {
        let response = edge.post_json("zipcode", &body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "message": "invalid zipcode" }));
    }

    let response = edge.post_raw("zipcode", "{").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unreachable_resolution_stage_is_internal_error() {
    let edge = spawn_edge("http://127.0.0.1:1", Duration::from_secs(2), &RecordingSink::default()).await;

    let response = edge.post_json("zipcode", &json!({ "cep": "01310100" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "error communicating with weather service" }));
}

#[tokio::test]
async fn slow_resolution_stage_times_out_without_partial_body() {
    let downstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "city": "late", "temp_C": 1.0, "temp_F": 33.8, "temp_K": 274.15 }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&downstream)
        .await;

    let edge = spawn_edge(&downstream.uri(), Duration::from_millis(250), &RecordingSink::default()).await;
    let response = edge.post_json("zipcode", &json!({ "cep": "01310100" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "error communicating with weather service" }));
}

#[tokio::test]
async fn non_post_methods_are_not_allowed() {
    let edge = spawn_edge("http://127.0.0.1:1", Duration::from_secs(2), &RecordingSink::default()).await;

    let response = edge.get("zipcode").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn one_trace_spans_both_hops() {
    let stages = spawn_stages().await;
    stages.resolution.mock_city("01310100", "São Paulo").await;
    stages.resolution.mock_temperature("São Paulo", 25.0).await;

    let response = stages.edge.post_json("zipcode", &json!({ "cep": "01310100" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let spans = &stages.spans;
    let edge_handler = spans.ended_named("handle_zip_code");
    let forward = spans.ended_named("forward_to_resolution_stage");
    let resolution_handler = spans.ended_named("handle_weather");
    assert_eq!(edge_handler.len(), 1);
    assert_eq!(forward.len(), 1);
    assert_eq!(resolution_handler.len(), 1);

    // no inbound context: the edge starts the trace
    assert_eq!(edge_handler[0].parent, None);
    assert_eq!(edge_handler[0].service, "edge");
    assert_eq!(forward[0].service, "edge");
    assert_eq!(resolution_handler[0].service, "resolution");

    let trace_id = edge_handler[0].trace_id;
    assert!(spans.ended().iter().all(|span| span.trace_id == trace_id));
    assert_eq!(forward[0].parent, Some(edge_handler[0].span_id));
    assert_eq!(resolution_handler[0].parent, Some(forward[0].span_id));
    assert_eq!(spans.ended().len(), 5);
}

#[tokio::test]
async fn api_doc_is_served() {
    let edge = spawn_edge("http://127.0.0.1:1", Duration::from_secs(2), &RecordingSink::default()).await;

    let response = edge.get("api-doc/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let doc: Value = response.json().await.unwrap();
    assert!(doc["paths"]["/zipcode"]["post"].is_object(), "{doc}");
}
