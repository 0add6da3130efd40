use crate::helpers::{spawn_resolution, WEATHER_API_KEY};
use cep_weather::telemetry::{BAGGAGE, TRACEPARENT};
use opentelemetry::trace::Status;
use futures::future;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn resolves_postal_code_to_all_three_scales() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.mock_city("01310100", "São Paulo").await;
    app.mock_temperature("São Paulo", 25.0).await;

    let response = app.stage.post_json("weather", &json!({ "cep": "01310100" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "city": "São Paulo", "temp_C": 25.0, "temp_F": 77.0, "temp_K": 25.0 + 273.15 })
    );
    approx::assert_relative_eq!(body["temp_K"].as_f64().unwrap(), 298.15);
}

#[tokio::test]
async fn unknown_postal_code_is_not_found() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.mock_unknown_code("00000000").await;

    let response = app.stage.post_json("weather", &json!({ "cep": "00000000" })).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "can not find zipcode" }));
}

#[tokio::test]
async fn geocoding_provider_errors_are_reported_as_not_found() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&app.geocoding)
        .await;

    let response = app.stage.post_json("weather", &json!({ "cep": "01310100" })).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "can not find zipcode" }));
}

#[tokio::test]
async fn invalid_postal_codes_are_rejected_without_provider_calls() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.expect_no_provider_calls().await;

    let test_cases = vec![
        (json!({ "cep": "123" }), "too short"),
        (json!({ "cep": "123456789" }), "too long"),
        (json!({ "cep": "01310-10" }), "separator"),
        (json!({ "cep": "0131010a" }), "letter"),
        (json!({ "cep": "" }), "empty"),
        (json!({ "cep": 1310100 }), "number"),
        (json!({}), "missing"),
    ];

    for (body, description) in test_cases {
        let response = app.stage.post_json("weather", &body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{description}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "message": "invalid zipcode" }), "{description}");
    }

    let response = app.stage.post_raw("weather", "not json").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn temperature_failure_is_internal_error() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.mock_city("80010000", "Curitiba").await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&app.weather)
        .await;

    let response = app.stage.post_json("weather", &json!({ "cep": "80010000" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "error fetching temperature" }));
}

#[tokio::test]
async fn missing_weather_credential_fails_each_request_but_not_startup() {
    let app = spawn_resolution(None).await;
    app.mock_city("80010000", "Curitiba").await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.weather)
        .await;

    for _ in 0..2 {
        let response = app.stage.post_json("weather", &json!({ "cep": "80010000" })).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "message": "error fetching temperature" }));
    }
}

#[tokio::test]
async fn non_post_methods_are_not_allowed() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.expect_no_provider_calls().await;

    let response = app.stage.get("weather").await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn inherited_trace_reaches_both_providers() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.mock_city("01310100", "São Paulo").await;
    app.mock_temperature("São Paulo", 21.5).await;

    let trace_id = "4bf92f3577b34da6a3ce929d0e0e4736";
    let response = app
        .stage
        .api_client
        .post(format!("{}/weather", app.stage.address))
        .header(TRACEPARENT, format!("00-{trace_id}-00f067aa0ba902b7-01"))
        .header(BAGGAGE, "tenant=acme")
        .json(&json!({ "cep": "01310100" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let handler = app.spans.ended_named("handle_weather");
    assert_eq!(handler.len(), 1);
    assert_eq!(handler[0].trace_id.to_string(), trace_id);
    assert_eq!(handler[0].parent.map(|p| p.to_string()).as_deref(), Some("00f067aa0ba902b7"));

    for name in ["fetch_city_by_zip_code", "fetch_temperature"] {
        let spans = app.spans.ended_named(name);
        assert_eq!(spans.len(), 1, "{name}");
        assert_eq!(spans[0].trace_id.to_string(), trace_id, "{name}");
        assert_eq!(spans[0].parent, Some(handler[0].span_id), "{name}");
    }

    let provider_requests = app
        .geocoding
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .chain(app.weather.received_requests().await.unwrap());
    for request in provider_requests {
        let header = |wanted: &str| {
            request
                .headers
                .iter()
                .find(|(name, _)| name.as_str() == wanted)
                .map(|(_, values)| values.last().as_str().to_string())
        };
        let traceparent = header(TRACEPARENT).expect("provider request carries trace context");
        assert!(traceparent.contains(trace_id), "{traceparent}");
        assert_eq!(header(BAGGAGE).as_deref(), Some("tenant=acme"));
    }
}

#[tokio::test]
async fn failed_lookup_marks_span_as_error() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    app.mock_unknown_code("00000000").await;

    let response = app.stage.post_json("weather", &json!({ "cep": "00000000" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let lookup = app.spans.ended_named("fetch_city_by_zip_code");
    assert_eq!(lookup.len(), 1);
    assert!(matches!(lookup[0].status, Status::Error { .. }), "{:?}", lookup[0].status);
}

#[tokio::test]
async fn concurrent_requests_do_not_share_results() {
    let app = spawn_resolution(Some(WEATHER_API_KEY)).await;
    let cities = [
        ("01310100", "São Paulo", 25.0),
        ("20040002", "Rio de Janeiro", 31.5),
        ("80010000", "Curitiba", 12.25),
        ("40010000", "Salvador", 28.0),
        ("69005000", "Manaus", 33.75),
    ];
    for (code, city, celsius) in cities {
        app.mock_city(code, city).await;
        app.mock_temperature(city, celsius).await;
    }

    let requests = (0..4).flat_map(|_| cities.iter()).map(|(code, city, celsius)| {
        let stage = &app.stage;
        async move {
            let response = stage.post_json("weather", &json!({ "cep": code })).await;
            let body: Value = response.json().await.unwrap();
            (city, celsius, body)
        }
    });

    for (city, celsius, body) in future::join_all(requests).await {
        assert_eq!(body["city"], json!(city));
        assert_eq!(body["temp_C"], json!(celsius));
        assert_eq!(body["temp_F"], json!(celsius * 1.8 + 32.0));
    }
}
