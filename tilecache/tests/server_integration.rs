//! Integration tests for the tile server.
//!
//! These tests start the server on an ephemeral port and drive it over HTTP:
//! - tile serving before and after a preload
//! - job control (preload, status, cancel) and the single-job policy
//! - metadata and TileJSON documents
//!
//! Run with: `cargo test --test server_integration`

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tilecache::coord::TileCoord;
use tilecache::provider::{ProviderError, TileProvider};
use tilecache::scheduler::{DownloadScheduler, JobManager, SchedulerConfig};
use tilecache::server::{CacheServer, TileJsonSettings};
use tilecache::store::TileStore;

// ============================================================================
// Helpers
// ============================================================================

/// Provider whose tile bytes encode the coordinate.
struct FakeProvider;

fn fake_tile_bytes(tile: &TileCoord) -> Vec<u8> {
    format!("png:{}", tile).into_bytes()
}

impl TileProvider for FakeProvider {
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        Ok(fake_tile_bytes(tile))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Provider that blocks every fetch until released.
struct BlockingProvider {
    released: Mutex<bool>,
    changed: Condvar,
}

impl BlockingProvider {
    fn new() -> Self {
        Self {
            released: Mutex::new(false),
            changed: Condvar::new(),
        }
    }

    fn release(&self) {
        *self.released.lock() = true;
        self.changed.notify_all();
    }
}

impl TileProvider for BlockingProvider {
    fn fetch(&self, tile: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        let mut released = self.released.lock();
        while !*released {
            self.changed.wait(&mut released);
        }
        Ok(fake_tile_bytes(tile))
    }

    fn name(&self) -> &str {
        "blocking"
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    shutdown: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
    _dir: TempDir,
}

impl TestServer {
    async fn start(provider: Arc<dyn TileProvider>) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TileStore::open(dir.path().join("tiles")).unwrap());
        let scheduler = DownloadScheduler::new(store, provider, SchedulerConfig::with_workers(4));
        let manager = Arc::new(JobManager::new(scheduler));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let settings = TileJsonSettings {
            name: "test cache".to_string(),
            attribution: "test imagery".to_string(),
            public_url: base.clone(),
        };

        let shutdown = CancellationToken::new();
        let server = CacheServer::new(manager, settings);
        let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

        Self {
            base,
            client: reqwest::Client::new(),
            shutdown,
            handle,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self.get(path).await;
        let status = response.status();
        let body = response.bytes().await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(&self, path: &str, body: String) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.bytes().await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn preload(&self, request: Value) -> (StatusCode, Value) {
        self.post_json("/preload", request.to_string()).await
    }

    /// Polls `/status` until the job is no longer active.
    async fn wait_idle(&self) -> Value {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let (_, status) = self.get_json("/status").await;
            if status["is_active"] == false {
                return status;
            }
            assert!(Instant::now() < deadline, "job did not finish: {}", status);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

fn nyc_request() -> Value {
    json!({ "lat": 40.7128, "lon": -74.0060, "size": 5000, "min_zoom": 10, "max_zoom": 12 })
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A tile is missing before a preload and served from the cache after it.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_preload_then_serve_tile() {
    let server = TestServer::start(Arc::new(FakeProvider)).await;

    let before = server.get("/tiles/10/301/384.png").await;
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    let (status, body) = server.preload(nyc_request()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "started");
    assert_eq!(body["total"], 10);
    assert!(body["job_id"].is_u64());

    let finished = server.wait_idle().await;
    assert_eq!(finished["state"], "completed");
    assert_eq!(finished["completed"], 10);
    assert_eq!(finished["total"], 10);
    assert_eq!(finished["downloaded"], 10);
    assert_eq!(finished["failed"], 0);

    let after = server.get("/tiles/10/301/384.png").await;
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(after.headers()[CONTENT_TYPE], "image/png");
    let bytes = after.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), fake_tile_bytes(&TileCoord::new(10, 301, 384)).as_slice());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_tile_paths_are_not_found() {
    let server = TestServer::start(Arc::new(FakeProvider)).await;

    for path in [
        "/tiles/10/301/384",
        "/tiles/10/301/384.jpg",
        "/tiles/ten/301/384.png",
        "/tiles/10/5000/384.png",
        "/tiles/30/0/0.png",
    ] {
        let response = server.get(path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
    }

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_idle_before_any_job() {
    let server = TestServer::start(Arc::new(FakeProvider)).await;

    let (status, body) = server.get_json("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["is_active"], false);
    assert_eq!(body["completed"], 0);
    assert_eq!(body["total"], 0);

    let (status, body) = server.post_json("/cancel", String::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "idle" }));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_invalid_preload_is_rejected() {
    let server = TestServer::start(Arc::new(FakeProvider)).await;

    let cases = [
        json!({ "lat": 95.0, "lon": 0.0, "size": 5000, "min_zoom": 10, "max_zoom": 12 }),
        json!({ "lat": 40.7, "lon": -74.0, "size": 5000, "min_zoom": 12, "max_zoom": 10 }),
        json!({ "lat": 40.7, "lon": -74.0, "size": 0, "min_zoom": 10, "max_zoom": 12 }),
        json!({ "lat": 40.7, "lon": -74.0, "size": 5000, "min_zoom": 10, "max_zoom": 30 }),
        json!({ "lat": 40.7, "lon": -74.0 }),
    ];
    for request in cases {
        let (status, body) = server.preload(request.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", request);
        assert!(body["error"].is_string(), "{}", body);
    }

    let (status, _) = server.post_json("/preload", "not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, status) = server.get_json("/status").await;
    assert_eq!(status["state"], "idle");

    server.stop().await;
}

/// A valid area whose task list would be too large is refused up front and
/// the server keeps answering.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_oversized_preload_is_rejected() {
    let server = TestServer::start(Arc::new(FakeProvider)).await;

    let huge = json!({ "lat": 0.0, "lon": 0.0, "size": 1_000_000, "min_zoom": 22, "max_zoom": 22 });
    let (status, body) = server.preload(huge).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"), "{}", body);

    let (status, idle) = server.get_json("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(idle["state"], "idle");

    let (status, _) = server.preload(nyc_request()).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    server.wait_idle().await;

    server.stop().await;
}

/// A second preload while one is running is refused, and cancel stops the
/// running job.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_conflict_and_cancel() {
    let provider = Arc::new(BlockingProvider::new());
    let server = TestServer::start(provider.clone()).await;

    let (status, started) = server.preload(nyc_request()).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, body) = server.preload(nyc_request()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already running"));

    let (_, running) = server.get_json("/status").await;
    assert_eq!(running["state"], "running");
    assert_eq!(running["is_active"], true);
    assert_eq!(running["job_id"], started["job_id"]);

    let (status, body) = server.post_json("/cancel", String::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelling");
    assert_eq!(body["job_id"], started["job_id"]);

    provider.release();
    let finished = server.wait_idle().await;
    assert_eq!(finished["state"], "cancelled");
    assert!(finished["completed"].as_u64().unwrap() < 10);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_metadata_and_tilejson() {
    let server = TestServer::start(Arc::new(FakeProvider)).await;

    let (_, empty) = server.get_json("/metadata").await;
    assert_eq!(empty["zoom_levels"], json!([]));

    let (_, world) = server.get_json("/tilejson.json").await;
    assert_eq!(world["tilejson"], "2.2.0");
    assert_eq!(world["scheme"], "xyz");
    assert_eq!(world["bounds"][0], -180.0);

    server.preload(nyc_request()).await;
    server.wait_idle().await;

    let (status, metadata) = server.get_json("/metadata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metadata["zoom_levels"], json!([10, 11, 12]));
    let z10 = &metadata["bounds_per_zoom"]["10"];
    assert!(z10["min_x"].as_u64().unwrap() <= 301);
    assert!(z10["max_x"].as_u64().unwrap() >= 301);

    let (status, tilejson) = server.get_json("/tilejson.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tilejson["name"], "test cache");
    assert_eq!(tilejson["attribution"], "test imagery");
    assert_eq!(tilejson["minzoom"], 10);
    assert_eq!(tilejson["maxzoom"], 12);
    assert_eq!(
        tilejson["tiles"][0],
        format!("{}/tiles/{{z}}/{{x}}/{{y}}.png", server.base)
    );

    let bounds: Vec<f64> = tilejson["bounds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    let (west, south, east, north) = (bounds[0], bounds[1], bounds[2], bounds[3]);
    assert!(west < -74.0060 && -74.0060 < east, "{:?}", bounds);
    assert!(south < 40.7128 && 40.7128 < north, "{:?}", bounds);

    server.stop().await;
}
