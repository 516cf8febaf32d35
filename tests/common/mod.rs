#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, Request, Response};
use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lungscan::{
    router, AppState, DiagnosisError, ErrorStatusMode, FetchLimits, ImageFetcher, ModelError,
    ModelLoader, ModelStore, ProbabilityModel,
};
use ndarray::ArrayView4;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Returns the same probabilities for every input.
pub struct FixedModel(pub Vec<f32>);

impl ProbabilityModel for FixedModel {
    fn predict(&self, batch: ArrayView4<'_, f32>) -> Result<Vec<f32>, DiagnosisError> {
        assert_eq!(batch.shape(), &[1, 224, 224, 1]);
        Ok(self.0.clone())
    }
}

/// Hands out `FixedModel`s and can be switched into a failing mode.
pub struct StubLoader {
    pub probabilities: Vec<f32>,
    pub fail: AtomicBool,
    pub loads: AtomicUsize,
}

impl StubLoader {
    pub fn new(probabilities: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            probabilities,
            fail: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        let loader = Self::new(vec![1.0, 0.0, 0.0]);
        loader.fail.store(true, Ordering::SeqCst);
        loader
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for StubLoader {
    fn load(&self) -> Result<Arc<dyn ProbabilityModel>, ModelError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ModelError::NotFound("/srv/models/model4.onnx".into()));
        }
        Ok(Arc::new(FixedModel(self.probabilities.clone())))
    }
}

pub fn state_with(store: ModelStore, mode: ErrorStatusMode, limits: FetchLimits) -> Arc<AppState> {
    let fetcher = ImageFetcher::new(limits).unwrap();
    Arc::new(AppState::new(store, fetcher, mode))
}

/// State whose model is already installed and returns `probabilities`.
pub fn loaded_state(probabilities: Vec<f32>, mode: ErrorStatusMode) -> Arc<AppState> {
    let loader = StubLoader::new(probabilities.clone());
    let store = ModelStore::with_model(loader, Arc::new(FixedModel(probabilities)));
    state_with(store, mode, FetchLimits::default())
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// How long `/slow` waits before answering.
pub const SLOW_RESPONSE_DELAY: Duration = Duration::from_millis(1500);

/// Serves test images on an ephemeral local port:
/// - `/xray.png` with a `Content-Length`
/// - `/chunked` the same image in 32 byte chunks, without a length
/// - `/slow` the same image after [`SLOW_RESPONSE_DELAY`]
/// - `/garbage` a non-image body
///
/// Anything else answers 404.
pub async fn spawn_image_server() -> SocketAddr {
    let xray = Bytes::from(png_bytes(512, 384));
    let chunked_xray = xray.clone();
    let slow_xray = xray.clone();
    let app = Router::new()
        .route(
            "/xray.png",
            get(move || {
                let xray = xray.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], xray) }
            }),
        )
        .route(
            "/chunked",
            get(move || {
                let chunks: Vec<Result<Bytes, std::io::Error>> = chunked_xray
                    .chunks(32)
                    .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                    .collect();
                async move { Body::from_stream(futures::stream::iter(chunks)) }
            }),
        )
        .route(
            "/slow",
            get(move || {
                let xray = slow_xray.clone();
                async move {
                    tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
                    xray
                }
            }),
        )
        .route("/garbage", get(|| async { "<html>definitely not an image</html>" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn send(state: &Arc<AppState>, request: Request<Body>) -> Response<Body> {
    router(Arc::clone(state)).oneshot(request).await.unwrap()
}

pub fn diagnose_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/diagnose")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
