// tests/client.rs
use std::time::Duration;

use eval_probe::client::{CallOutcome, EvalClient};
use eval_probe::config::{ClientSettings, EndpointConfig};
use eval_probe::errors::HarnessError;
use eval_probe::payload::EvaluationPayload;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-functions-key-0042";

fn client_for(server: &MockServer, settings: ClientSettings) -> EvalClient {
    let endpoint = EndpointConfig::new(&format!("{}/api/evaluate", server.uri()), KEY).unwrap();
    EvalClient::new(endpoint, settings).unwrap()
}

fn sample_payload() -> EvaluationPayload {
    EvaluationPayload::from_value(json!({
        "citations": ["a", "ab"],
        "context": "hello",
        "query": "hi"
    }))
    .unwrap()
}

#[tokio::test]
async fn success_returns_parsed_body_and_timing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/evaluate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server, ClientSettings::default()).invoke(&sample_payload()).await;

    match outcome {
        CallOutcome::Success { body, elapsed_seconds } => {
            assert_eq!(body, json!({"result": "ok"}));
            assert!(elapsed_seconds >= 0.0);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_reports_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"error":"timeout"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server, ClientSettings::default()).invoke(&sample_payload()).await;

    let detail = outcome.error_detail().expect("failure detail");
    assert!(detail.contains("500"), "{}", detail);
    assert!(detail.contains("timeout"), "{}", detail);
    assert!(matches!(
        outcome,
        CallOutcome::Failure { error: HarnessError::ServerError { status: 500, .. }, .. }
    ));
}

#[tokio::test]
async fn client_error_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let outcome = client_for(&server, ClientSettings::default()).invoke(&sample_payload()).await;

    assert_eq!(
        outcome.error_detail().unwrap(),
        "API request failed with status 401: unauthorized"
    );
}

#[tokio::test]
async fn sends_key_header_and_full_payload() {
    let server = MockServer::start().await;
    let document = json!({
        "citations": ["first source"],
        "context": "ctx",
        "query": "q",
        "prediction": {"answer": "42"},
        "judge": {"rubric": "strict", "threshold": 0.7}
    });
    Mock::given(method("POST"))
        .and(path("/api/evaluate"))
        .and(header("x-functions-key", KEY))
        .and(header("content-type", "application/json"))
        .and(body_json(&document))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"score": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = EvaluationPayload::from_value(document.clone()).unwrap();
    let outcome = client_for(&server, ClientSettings::default()).invoke(&payload).await;

    assert!(outcome.is_success(), "{:?}", outcome);
}

#[tokio::test]
async fn non_json_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let outcome = client_for(&server, ClientSettings::default()).invoke(&sample_payload()).await;

    match outcome {
        CallOutcome::Failure { error: HarnessError::InvalidResponse(msg), .. } => {
            assert!(msg.contains("maintenance"));
        }
        other => panic!("expected invalid response, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_server_hits_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": "late"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings { timeout: Some(Duration::from_millis(200)), ..ClientSettings::default() };
    let outcome = client_for(&server, settings).invoke(&sample_payload()).await;

    match outcome {
        CallOutcome::Failure { error: HarnessError::Timeout(bound), elapsed_seconds } => {
            assert_eq!(bound, Duration::from_millis(200));
            assert!(elapsed_seconds >= 0.2);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn refused_connection_is_network_failure() {
    // Bind then drop a listener so the port is known to be closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let endpoint = EndpointConfig::new(&format!("http://127.0.0.1:{}/api/evaluate", port), KEY).unwrap();
    let client = EvalClient::new(endpoint, ClientSettings::default()).unwrap();

    let outcome = client.invoke(&sample_payload()).await;

    match &outcome {
        CallOutcome::Failure { error: HarnessError::Network(msg), .. } => {
            assert!(msg.starts_with("connection failed"), "{}", msg);
        }
        other => panic!("expected network failure, got {:?}", other),
    }
    assert!(!outcome.error_detail().unwrap().contains(KEY));
}

#[tokio::test]
async fn echoed_key_is_masked_in_failure_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string(format!("key {} is revoked", KEY)))
        .mount(&server)
        .await;

    let outcome = client_for(&server, ClientSettings::default()).invoke(&sample_payload()).await;
    let detail = outcome.error_detail().unwrap();

    assert!(!detail.contains(KEY));
    assert!(detail.contains("test***"));
}

#[tokio::test]
async fn body_is_sent_exactly_as_read() {
    let server = MockServer::start().await;
    let raw = r#"{"query":"q","trace_id":12345678901234567890123,"zeta":1,"alpha":2.50}"#;
    Mock::given(method("POST"))
        .and(path("/api/evaluate"))
        .and(header("content-type", "application/json"))
        .and(body_string(raw))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = EvaluationPayload::from_json_str(raw).unwrap();
    let outcome = client_for(&server, ClientSettings::default()).invoke(&payload).await;

    assert!(outcome.is_success(), "{:?}", outcome);
    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].body, raw.as_bytes());
}

#[tokio::test]
async fn same_origin_redirect_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/api/evaluate"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/evaluate"))
        .and(header("x-functions-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "moved"})))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = EndpointConfig::new(&format!("{}/old", server.uri()), KEY).unwrap();
    let outcome = EvalClient::new(endpoint, ClientSettings::default())
        .unwrap()
        .invoke(&sample_payload())
        .await;

    match outcome {
        CallOutcome::Success { body, .. } => assert_eq!(body, json!({"result": "moved"})),
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn key_is_not_sent_to_another_origin() {
    let elsewhere = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stolen": true})))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(307).insert_header("location", format!("{}/collect", elsewhere.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client_for(&server, ClientSettings::default()).invoke(&sample_payload()).await;

    assert!(!outcome.is_success());
    assert!(elsewhere.received_requests().await.unwrap().is_empty());
}
