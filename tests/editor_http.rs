use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use mailcraft::{
    application::{
        ports::{ConfigSink, SinkError},
        render::RenderService,
    },
    config::CorsOrigin,
    domain::sections::SectionConfig,
    infra::{
        http::{EditorState, build_router},
        layout::FileLayoutSource,
        uploads::UploadStorage,
    },
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const LAYOUT: &str = "<h1>{{title}}</h1><p>{{content}}</p><small>{{footer}}</small>";
const BOUNDARY: &str = "mailcraft-test-boundary";

#[derive(Default)]
struct RecordingSink {
    saved: Mutex<Vec<SectionConfig>>,
}

#[async_trait]
impl ConfigSink for RecordingSink {
    async fn save(&self, config: &SectionConfig) -> Result<(), SinkError> {
        self.saved
            .lock()
            .map_err(|_| SinkError::Rejected("poisoned".to_string()))?
            .push(config.clone());
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    router: Router,
    sink: Arc<RecordingSink>,
}

fn harness_with(layout: Option<&str>, upload_limit_bytes: usize, cors: CorsOrigin) -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let layout_path = dir.path().join("layout.html");
    if let Some(layout) = layout {
        std::fs::write(&layout_path, layout).expect("write layout");
    }
    let storage =
        UploadStorage::new(dir.path().join("uploads")).expect("upload storage should initialise");
    let sink = Arc::new(RecordingSink::default());

    let state = EditorState {
        layouts: Arc::new(FileLayoutSource::new(layout_path)),
        sink: sink.clone(),
        renderer: Arc::new(RenderService::new()),
        upload_storage: Arc::new(storage),
        upload_limit_bytes,
    };

    Harness {
        router: build_router(state, cors),
        _dir: dir,
        sink,
    }
}

fn harness() -> Harness {
    harness_with(Some(LAYOUT), 1024 * 1024, CorsOrigin::Any)
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

fn multipart_post(field: &str, filename: &str, payload: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/uploadImage")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes()
        .to_vec()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

fn sample_sections() -> Value {
    json!([
        {"id": 1, "type": "title", "content": "Welcome", "style": {"color": "#333"}},
        {"id": 2, "type": "content", "content": "Thanks for joining.", "style": {}},
        {"id": 3, "type": "footer", "content": "Bye", "style": {"textAlign": "center"}}
    ])
}

#[tokio::test]
async fn layout_is_served_verbatim() {
    let harness = harness();
    let request = Request::get("/getEmailLayout")
        .body(Body::empty())
        .expect("request should build");

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    assert_eq!(body_text(response).await, LAYOUT);
}

#[tokio::test]
async fn missing_layout_reports_read_failure() {
    let harness = harness_with(None, 1024, CorsOrigin::Any);
    let request = Request::get("/getEmailLayout")
        .body(Body::empty())
        .expect("request should build");

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Error reading layout file.");
}

#[tokio::test]
async fn render_substitutes_section_types() {
    let harness = harness();
    let request = json_post(
        "/renderAndDownloadTemplate",
        json!({"layout": LAYOUT, "config": sample_sections()}),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["renderedHTML"],
        "<h1>Welcome</h1><p>Thanks for joining.</p><small>Bye</small>"
    );
}

#[tokio::test]
async fn render_ignores_section_styles() {
    let harness = harness();
    let styles = [
        json!({"textAlign": "justify"}),
        json!({"color": 5}),
        Value::Null,
        json!("bold"),
    ];

    for style in styles {
        let request = json_post(
            "/renderAndDownloadTemplate",
            json!({
                "layout": "Hello {{title}}!",
                "config": [{"id": 1, "type": "title", "content": "World", "style": style.clone()}]
            }),
        );

        let response = send(&harness.router, request).await;
        assert_eq!(response.status(), StatusCode::OK, "style: {style}");
        assert_eq!(body_json(response).await["renderedHTML"], "Hello World!");
    }
}

#[tokio::test]
async fn render_tolerates_repeated_section_ids() {
    let harness = harness();
    let request = json_post(
        "/renderAndDownloadTemplate",
        json!({
            "layout": "{{x}}",
            "config": [
                {"id": 1, "type": "x", "content": "A", "style": {}},
                {"id": 1, "type": "x", "content": "B", "style": {}}
            ]
        }),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["renderedHTML"], "B");
}

#[tokio::test]
async fn render_accepts_key_value_mapping() {
    let harness = harness();
    let request = json_post(
        "/renderAndDownloadTemplate",
        json!({"layout": "Hi {{name}}, {{count}} new", "config": {"name": "Ada", "count": 4}}),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["renderedHTML"], "Hi Ada, 4 new");
}

#[tokio::test]
async fn render_keeps_unknown_placeholders_and_skips_rescanning() {
    let harness = harness();
    let request = json_post(
        "/renderAndDownloadTemplate",
        json!({
            "layout": "{{title}} {{missing}}",
            "config": [{"id": 1, "type": "title", "content": "{{missing}}", "style": {}}]
        }),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["renderedHTML"],
        "{{missing}} {{missing}}"
    );
}

#[tokio::test]
async fn render_with_empty_section_list_returns_layout() {
    let harness = harness();
    let request = json_post(
        "/renderAndDownloadTemplate",
        json!({"layout": LAYOUT, "config": []}),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["renderedHTML"], LAYOUT);
}

#[tokio::test]
async fn render_rejects_missing_inputs() {
    let harness = harness();
    let bodies = [
        json!({"layout": "", "config": []}),
        json!({"config": sample_sections()}),
        json!({"layout": LAYOUT, "config": null}),
        json!({"layout": LAYOUT}),
        json!({"layout": LAYOUT, "config": {"title": ["nested"]}}),
    ];

    for body in bodies {
        let response = send(
            &harness.router,
            json_post("/renderAndDownloadTemplate", body.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_text(response).await, "Invalid input.");
    }
}

#[tokio::test]
async fn render_rejects_malformed_json() {
    let harness = harness();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/renderAndDownloadTemplate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request should build");

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Invalid input.");
}

#[tokio::test]
async fn render_download_returns_attachment() {
    let harness = harness();
    let request = json_post(
        "/renderAndDownloadTemplate?download=true",
        json!({"layout": "<p>{{title}}</p>", "config": sample_sections()}),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(disposition, "attachment; filename=\"email-template.html\"");
    assert_eq!(body_text(response).await, "<p>Welcome</p>");
}

#[tokio::test]
async fn saving_configuration_reaches_sink() {
    let harness = harness();
    let request = json_post("/uploadEmailConfig", json!({"sections": sample_sections()}));

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Configuration saved successfully!"
    );

    let saved = harness.sink.saved.lock().expect("sink lock");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].len(), 3);
}

#[tokio::test]
async fn saving_keeps_unrecognised_styles() {
    let harness = harness();
    let request = json_post(
        "/uploadEmailConfig",
        json!({"sections": [
            {"id": 1, "type": "title", "content": "Hi", "style": {"textAlign": "justify"}},
            {"id": 2, "type": "footer", "content": "", "style": null}
        ]}),
    );

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let saved = harness.sink.saved.lock().expect("sink lock");
    let encoded = serde_json::to_value(&saved[0]).expect("serialize");
    assert_eq!(encoded[0]["style"]["textAlign"], "justify");
    assert_eq!(encoded[1]["style"], json!({}));
}

#[tokio::test]
async fn saving_without_sections_is_rejected() {
    let harness = harness();
    for body in [json!({}), json!({"sections": null}), json!({"sections": "nope"})] {
        let response = send(&harness.router, json_post("/uploadEmailConfig", body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_text(response).await, "Invalid configuration.");
    }
    assert!(harness.sink.saved.lock().expect("sink lock").is_empty());
}

#[tokio::test]
async fn uploaded_image_is_served_back() {
    let harness = harness();
    let payload = b"\x89PNG\r\n\x1a\nfake image bytes";

    let response = send(&harness.router, multipart_post("image", "Logo Mark.png", payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let url = body_json(response).await["url"]
        .as_str()
        .expect("url string")
        .to_string();
    assert!(url.starts_with("/uploads/"), "unexpected url {url}");
    assert!(url.ends_with("-logo-mark.png"), "unexpected url {url}");

    let response = send(
        &harness.router,
        Request::get(url.as_str())
            .body(Body::empty())
            .expect("request should build"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(body_bytes(response).await, payload.to_vec());
}

#[tokio::test]
async fn upload_without_image_field_is_rejected() {
    let harness = harness();
    let response = send(&harness.router, multipart_post("avatar", "a.png", b"data")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "No file uploaded.");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let harness = harness_with(Some(LAYOUT), 64, CorsOrigin::Any);
    let payload = vec![b'x'; 4096];

    let response = send(&harness.router, multipart_post("image", "big.png", &payload)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn unknown_upload_is_not_found() {
    let harness = harness();
    let response = send(
        &harness.router,
        Request::get("/uploads/2026/01/missing.png")
            .body(Body::empty())
            .expect("request should build"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preflight_is_answered_for_any_origin() {
    let harness = harness();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/renderAndDownloadTemplate")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("request should build");

    let response = send(&harness.router, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn exact_origin_is_not_echoed_to_strangers() {
    let harness = harness_with(
        Some(LAYOUT),
        1024,
        CorsOrigin::Exact("http://localhost:3000".to_string()),
    );

    let allowed = Request::get("/_health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .expect("request should build");
    let response = send(&harness.router, allowed).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|value| value.to_str().ok()),
        Some("http://localhost:3000")
    );

    let stranger = Request::get("/_health")
        .header(header::ORIGIN, "http://evil.test")
        .body(Body::empty())
        .expect("request should build");
    let response = send(&harness.router, stranger).await;
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[test]
fn bundled_layout_declares_editor_placeholders() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/layout.html");
    let layout = std::fs::read_to_string(path).expect("bundled layout");
    for key in ["{{title}}", "{{content}}", "{{footer}}"] {
        assert!(layout.contains(key), "layout lacks {key}");
    }
}
