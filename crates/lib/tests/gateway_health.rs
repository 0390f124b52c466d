//! Integration test: start the gateway on a free port with an in-process counselor stand-in,
//! then drive it over HTTP like the platform would. The server task is left running when the test ends.

use async_trait::async_trait;
use lib::config::{Config, GatewayAuthMode};
use lib::dialogflow::{
    DetectIntentRequest, DetectIntentResult, RelayError, RemoteCallError, SessionClient,
    SessionPath,
};
use lib::fulfillment::{build_dispatch_table, Orchestrator};
use lib::gateway;
use secrecy::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

struct StandIn {
    session: SessionPath,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl SessionClient for StandIn {
    fn session(&self) -> &SessionPath {
        &self.session
    }

    async fn detect_intent(
        &self,
        _request: &DetectIntentRequest,
    ) -> Result<DetectIntentResult, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(RemoteCallError::Api {
                status: 503,
                body: "backend unavailable: secret-detail".to_string(),
            }
            .into())
        } else {
            Ok(DetectIntentResult {
                fulfillment_text: "counselor says hi".to_string(),
            })
        }
    }
}

/// Spawn the gateway and wait until GET / answers. Returns the base URL.
async fn start_gateway(mut config: Config, client: Arc<StandIn>) -> String {
    let port = free_port();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    let table = build_dispatch_table(&config, client).expect("dispatch table");
    let orchestrator = Orchestrator::new(table);
    tokio::spawn(async move {
        let _ = gateway::serve_gateway(config, orchestrator).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let http = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = http.get(format!("{}/", base)).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway at {} did not come up within 5s", base);
}

fn stand_in(fail: bool) -> Arc<StandIn> {
    Arc::new(StandIn {
        session: SessionPath::new("counselor-xibw", "counselor1"),
        fail,
        calls: AtomicUsize::new(0),
    })
}

fn webhook_body(intent: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "responseId": "r-1",
        "session": "projects/client-tcmk/agent/sessions/s-1",
        "queryResult": {
            "queryText": text,
            "languageCode": "ko",
            "intent": { "name": "projects/client-tcmk/agent/intents/1", "displayName": intent }
        }
    })
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let base = start_gateway(Config::default(), stand_in(false)).await;
    let json: serde_json::Value = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .json()
        .await
        .expect("parse JSON");
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
    assert_eq!(
        json.get("session").and_then(|v| v.as_str()),
        Some("projects/counselor-xibw/agent/sessions/counselor1")
    );
    assert_eq!(json["intents"], serde_json::json!(["SendMessageToCounselor"]));
}

#[tokio::test]
async fn webhook_forwards_and_acknowledges() {
    let client = stand_in(false);
    let base = start_gateway(Config::default(), client.clone()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .json(&webhook_body("SendMessageToCounselor", "안녕하세요"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["fulfillmentText"], "상담사에게 메시지를 전달했습니다.");
    assert_eq!(
        json["fulfillmentMessages"][0]["text"]["text"][0],
        "상담사에게 메시지를 전달했습니다."
    );
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn webhook_failure_is_still_200_with_apology() {
    let client = stand_in(true);
    let base = start_gateway(Config::default(), client.clone()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .json(&webhook_body("SendMessageToCounselor", "안녕하세요"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let text = resp.text().await.unwrap();
    assert!(!text.contains("secret-detail"));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        json["fulfillmentText"],
        "Counselor에게 메시지를 전달하는 데 실패했습니다."
    );
}

#[tokio::test]
async fn webhook_unknown_intent_defers_to_platform() {
    let client = stand_in(false);
    let base = start_gateway(Config::default(), client.clone()).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .json(&webhook_body("Default Fallback Intent", "뭐라고요"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json, serde_json::json!({}));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn webhook_rejects_malformed_body() {
    let base = start_gateway(Config::default(), stand_in(false)).await;
    let resp = reqwest::Client::new()
        .post(format!("{}/webhook", base))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_token_mode_requires_bearer() {
    let mut config = Config::default();
    config.gateway.auth.mode = GatewayAuthMode::Token;
    config.gateway.auth.token = Some(SecretString::from("hook-secret"));
    if std::env::var("RELAY_WEBHOOK_TOKEN").is_ok() {
        return;
    }
    let client = stand_in(false);
    let base = start_gateway(config, client.clone()).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{}/webhook", base))
        .json(&webhook_body("SendMessageToCounselor", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = http
        .post(format!("{}/webhook", base))
        .bearer_auth("wrong")
        .json(&webhook_body("SendMessageToCounselor", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);

    let resp = http
        .post(format!("{}/webhook", base))
        .bearer_auth("hook-secret")
        .json(&webhook_body("SendMessageToCounselor", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_loopback_bind_without_token_is_refused() {
    let mut config = Config::default();
    config.gateway.bind = "0.0.0.0".to_string();
    config.gateway.port = free_port();
    if std::env::var("RELAY_WEBHOOK_TOKEN").is_ok() {
        return;
    }
    let table = build_dispatch_table(&config, stand_in(false)).unwrap();
    let err = gateway::serve_gateway(config, Orchestrator::new(table))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("refusing to bind"));
}
