pub mod hub;
pub mod sse;
pub mod upload;
pub mod worker;

use axum::extract::{Path as AxumPath, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;

pub use hub::{EventHub, HubNotifier};
pub use worker::{WorkerContext, WorkerPool};

#[derive(Clone)]
pub struct AppState {
    pub hub: EventHub,
    pub pool: WorkerPool,
    pub upload_dir: PathBuf,
    pub chart_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload::upload_handler))
        .route("/stream", get(sse::stream_handler))
        .route("/plots/:name", get(plot_handler))
        .with_state(state)
}

/// 提供分析工作產出的圖表檔案。
async fn plot_handler(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> impl IntoResponse {
    // 檔名不得帶路徑成分
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return (StatusCode::BAD_REQUEST, "invalid plot name").into_response();
    }

    match tokio::fs::read(state.chart_dir.join(&name)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "plot not found").into_response(),
    }
}
