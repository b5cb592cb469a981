use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
use gateway::{AppState, ErrorFormat, GatewayConfig, router};
use image::{ImageFormat, Rgb, RgbImage};
use inference::{
    ClassIndex, InferenceBackend, InferenceConfig, InferenceOutput, LabelSource, ModelHost,
    PreProcessor, PredictionService, TensorLayout,
};
use ndarray::{Array, IxDyn};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

const BOUNDARY: &str = "----predict-test-boundary";
const INPUT_SIZE: u32 = 8;

/// Backend returning fixed scores and counting invocations
struct StubBackend {
    scores: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl InferenceBackend for StubBackend {
    fn load_model(_config: &InferenceConfig) -> anyhow::Result<Self> {
        anyhow::bail!("stub backend is constructed directly")
    }

    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        assert_eq!(input.shape(), &[1, 8, 8, 3], "Tensor must match model input");
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(InferenceOutput {
            scores: Array::from_shape_vec(IxDyn(&[1, self.scores.len()]), self.scores.clone())?,
        })
    }
}

struct TestApp {
    app: Router,
    calls: Arc<AtomicUsize>,
    upload_dir: TempDir,
}

impl TestApp {
    fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count() == 0
    }
}

struct Options {
    scores: Option<Vec<f32>>,
    labels: Vec<&'static str>,
    error_format: ErrorFormat,
    body_limit_bytes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scores: Some(vec![0.1, 0.8567, 0.0433]),
            labels: vec!["cat", "dog", "horse"],
            error_format: ErrorFormat::Structured,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

fn test_app(options: Options) -> TestApp {
    let upload_dir = tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let preprocessor = PreProcessor::new(INPUT_SIZE, TensorLayout::Nhwc);
    let host = match options.scores {
        Some(scores) => ModelHost::from_backend(
            StubBackend {
                scores,
                calls: Arc::clone(&calls),
            },
            preprocessor.input_shape(),
        ),
        None => ModelHost::unavailable(preprocessor.input_shape()),
    };
    let table: ClassIndex = options.labels.into_iter().collect();
    let service = PredictionService::new(host, preprocessor, LabelSource::Cached(Arc::new(table)));

    let config = GatewayConfig {
        environment: gateway::config::Environment::Development,
        addr: "127.0.0.1:0".to_string(),
        upload_dir: upload_dir.path().to_path_buf(),
        upload_field: "image".to_string(),
        body_limit_bytes: options.body_limit_bytes,
        error_format: options.error_format,
        otel_endpoint: None,
        inference: InferenceConfig::default(),
    };

    TestApp {
        app: router(AppState::new(service, &config), config.body_limit_bytes),
        calls,
        upload_dir,
    }
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbImage::from_fn(32, 24, |x, y| Rgb([x as u8 * 8, y as u8 * 10, 128]))
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Build a multipart body with one part per `(field, file_name, content)`
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    field, name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn predict_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_valid_upload_returns_label_and_confidence() {
    let test = test_app(Options::default());
    let png = png_bytes();

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("image", Some("dog.png"), png.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["className"], "dog");
    assert_eq!(body["confidence"], "85.67");
    assert_eq!(test.calls.load(Ordering::SeqCst), 1);
    assert!(
        test.upload_dir_is_empty(),
        "Upload must be deleted after a successful prediction"
    );
}

#[tokio::test]
async fn test_other_fields_are_ignored() {
    let test = test_app(Options::default());
    let png = png_bytes();

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[
            ("note", None, b"hello".as_slice()),
            ("image", Some("dog.png"), png.as_slice()),
        ])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["className"], "dog");
}

#[tokio::test]
async fn test_missing_file_field_is_bad_request_without_inference() {
    let test = test_app(Options::default());
    let png = png_bytes();

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("photo", Some("dog.png"), png.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["detail"], "No file uploaded.");
    assert_eq!(test.calls.load(Ordering::SeqCst), 0, "Model must not run");
    assert!(test.upload_dir_is_empty());
}

#[tokio::test]
async fn test_text_field_with_upload_name_is_not_a_file() {
    let test = test_app(Options::default());

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("image", None, b"text".as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["detail"], "No file uploaded.");
    assert_eq!(test.calls.load(Ordering::SeqCst), 0, "Model must not run");
    assert!(test.upload_dir_is_empty());
}

#[tokio::test]
async fn test_upload_over_body_limit_is_payload_too_large() {
    let test = test_app(Options {
        body_limit_bytes: 1024,
        ..Options::default()
    });
    let oversized = vec![7u8; 64 * 1024];

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("image", Some("big.png"), oversized.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json(&body)["error"], "payload_too_large");
    assert_eq!(test.calls.load(Ordering::SeqCst), 0);
    assert!(
        test.upload_dir_is_empty(),
        "A partially spooled upload must be deleted"
    );
}

#[tokio::test]
async fn test_non_multipart_request_is_bad_request() {
    let test = test_app(Options::default());

    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(&test.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(test.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_image_upload_fails_and_is_cleaned_up() {
    let test = test_app(Options::default());

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[(
            "image",
            Some("notes.txt"),
            b"these bytes are not an image".as_slice(),
        )])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["error"], "decode_error");
    assert_eq!(test.calls.load(Ordering::SeqCst), 0);
    assert!(
        test.upload_dir_is_empty(),
        "Upload must be deleted on the failure path too"
    );
}

#[tokio::test]
async fn test_unloaded_model_is_server_error() {
    let test = test_app(Options {
        scores: None,
        ..Options::default()
    });
    let png = png_bytes();

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("image", Some("dog.png"), png.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(&body);
    assert_eq!(body["error"], "model_unavailable");
    assert_eq!(body["detail"], "Model is not loaded");
    assert!(test.upload_dir_is_empty());
}

#[tokio::test]
async fn test_short_label_table_is_lookup_error() {
    let test = test_app(Options {
        scores: Some(vec![0.05, 0.05, 0.9]),
        labels: vec!["cat", "dog"],
        ..Options::default()
    });
    let png = png_bytes();

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("image", Some("horse.png"), png.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body)["error"], "lookup_error");
    assert!(test.upload_dir_is_empty());
}

#[tokio::test]
async fn test_plain_error_format_is_wire_compatible() {
    let test = test_app(Options {
        error_format: ErrorFormat::Plain,
        ..Options::default()
    });

    let (status, body) = send(&test.app, predict_request(multipart_body(&[]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"No file uploaded.");
}

#[tokio::test]
async fn test_tied_scores_pick_lowest_index() {
    let test = test_app(Options {
        scores: Some(vec![0.1, 0.45, 0.45]),
        ..Options::default()
    });
    let png = png_bytes();

    let (status, body) = send(
        &test.app,
        predict_request(multipart_body(&[("image", Some("tie.png"), png.as_slice())])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["className"], "dog");
    assert_eq!(body["confidence"], "45.00");
}

#[tokio::test]
async fn test_health_reports_model_state() {
    for (scores, loaded) in [(Some(vec![1.0]), true), (None, false)] {
        let test = test_app(Options {
            scores,
            ..Options::default()
        });

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&test.app, request).await;

        assert_eq!(status, StatusCode::OK);
        let body = json(&body);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["modelLoaded"], loaded);
    }
}
