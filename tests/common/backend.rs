//! Fake backend built on wiremock, speaking the validate/metadata/download wire format

use std::time::Duration;
use vidfetch::{Config, Orchestrator};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Metadata body for a short sample video
pub fn sample_metadata_body() -> serde_json::Value {
    serde_json::json!({
        "title": "Sample Video",
        "duration": 125,
        "thumbnail": "https://i.example.com/sample.jpg",
        "uploader": "Sample Channel",
        "formats": [
            {"format_id": "22", "ext": "mp4", "resolution": "720p", "filesize": 5242880},
            {"format_id": "140", "ext": "m4a", "resolution": "audio only", "filesize": null}
        ]
    })
}

/// One SSE message carrying a progress event
pub fn sse_event(percentage: f64, status: &str, message: Option<&str>) -> String {
    let (speed, eta) = match status {
        "downloading" => ("1.2MiB/s", "00:05"),
        _ => ("", ""),
    };
    let mut event = serde_json::json!({
        "percentage": percentage,
        "speed": speed,
        "eta": eta,
        "status": status,
    });
    if let Some(message) = message {
        event["message"] = serde_json::Value::String(message.to_string());
    }
    format!("data: {}\n\n", event)
}

/// Mount `POST /api/validate`
pub async fn mount_validation(server: &MockServer, valid: bool, message: Option<&str>) {
    let mut body = serde_json::json!({"valid": valid});
    if let Some(message) = message {
        body["message"] = serde_json::Value::String(message.to_string());
    }

    Mock::given(method("POST"))
        .and(path("/api/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount `POST /api/metadata` answering with `status` and `body`
pub async fn mount_metadata(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/metadata"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount `GET /api/download` streaming `body` as server-sent events
pub async fn mount_progress_stream(server: &MockServer, body: String, delay: Option<Duration>) {
    let mut response = ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/event-stream")
        .insert_header("Cache-Control", "no-cache")
        .set_body_string(body);
    if let Some(delay) = delay {
        response = response.set_delay(delay);
    }

    Mock::given(method("GET"))
        .and(path("/api/download"))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Config pointing at `server`
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.backend.base_url = server.uri();
    config.backend.request_timeout = Duration::from_secs(5);
    config
}

/// HTTP-backed orchestrator pointing at `server`
pub fn orchestrator_for(server: &MockServer) -> Orchestrator {
    Orchestrator::with_http(config_for(server)).expect("valid test config")
}
