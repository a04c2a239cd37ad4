//! HTTP tile server and job control API.
//!
//! | Method | Path                         | Purpose                         |
//! |--------|------------------------------|---------------------------------|
//! | GET    | `/tiles/{z}/{x}/{y}.png`     | Cached tile bytes, 404 if absent |
//! | POST   | `/preload`                   | Start a coverage download        |
//! | GET    | `/status`                    | Progress of the current job      |
//! | POST   | `/cancel`                    | Cancel the current job           |
//! | GET    | `/metadata`                  | Cached zoom levels and bounds    |
//! | GET    | `/tilejson.json`             | TileJSON 2.2.0 document          |
//!
//! Tiles are served straight from the [`TileStore`] while a job may be
//! writing to it; the store's write-once contract keeps readers from seeing
//! partial files.

mod error;
mod handlers;
mod tilejson;

pub use error::ServerError;
pub use handlers::{PreloadBody, PreloadResponse};
pub use tilejson::{TileJson, TileJsonSettings, TILEJSON_VERSION};

use std::io;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::scheduler::JobManager;
use crate::store::TileStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
    pub store: Arc<TileStore>,
    pub tilejson: Arc<TileJsonSettings>,
}

/// The tile cache HTTP server.
pub struct CacheServer {
    state: AppState,
}

impl CacheServer {
    pub fn new(manager: Arc<JobManager>, settings: TileJsonSettings) -> Self {
        let store = Arc::clone(manager.scheduler().store());
        Self {
            state: AppState {
                manager,
                store,
                tilejson: Arc::new(settings),
            },
        }
    }

    pub fn manager(&self) -> &Arc<JobManager> {
        &self.state.manager
    }

    pub fn router(&self) -> Router {
        Router::new()
            // The `.png` suffix is stripped from the last segment by the handler.
            .route("/tiles/:z/:x/:y", get(handlers::get_tile))
            .route("/preload", post(handlers::post_preload))
            .route("/status", get(handlers::get_status))
            .route("/cancel", post(handlers::post_cancel))
            .route("/metadata", get(handlers::get_metadata))
            .route("/tilejson.json", get(handlers::get_tilejson))
            .with_state(self.state.clone())
    }

    /// Serves requests on `listener` until `shutdown` is cancelled.
    ///
    /// A job still running at shutdown is cancelled; its worker threads
    /// finish their in-flight tiles in the background.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, store = %self.state.store.root().display(), "Tile server listening");

        let router = self.router();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        if let Some(job_id) = self.state.manager.cancel() {
            info!(job_id = %job_id, "Cancelled running job on shutdown");
        }
        info!("Tile server stopped");
        Ok(())
    }
}
