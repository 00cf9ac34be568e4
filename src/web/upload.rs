//! 多部分表單上傳：存檔、發出開始分析的通知、把工作排進分析佇列。
//! HTTP 回應立刻返回純文字狀態，分析結果走 SSE 通道。

use crate::domain::model::Notification;
use crate::domain::ports::Notifier;
use crate::web::hub::HubNotifier;
use crate::web::AppState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use std::path::Path;

pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, &'static str) {
    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => break field,
            Ok(Some(_)) => continue,
            Ok(None) => return (StatusCode::BAD_REQUEST, "No file part"),
            Err(_) => return (StatusCode::BAD_REQUEST, "Malformed multipart body"),
        }
    };

    let file_name = match field.file_name().map(sanitize_filename) {
        Some(name) if !name.is_empty() => name,
        _ => return (StatusCode::BAD_REQUEST, "No selected file"),
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(_) => return (StatusCode::BAD_REQUEST, "Failed to read uploaded file"),
    };

    if let Err(e) = tokio::fs::create_dir_all(&state.upload_dir).await {
        tracing::error!("cannot create upload dir: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file");
    }

    let file_path = state.upload_dir.join(&file_name);
    if let Err(e) = tokio::fs::write(&file_path, &data).await {
        tracing::error!("cannot write {}: {}", file_path.display(), e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file");
    }

    let dept_id = Path::new(&file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.clone());

    let Some(job_id) = state.pool.try_enqueue(file_path, dept_id) else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Server busy, try again later");
    };

    HubNotifier::new(state.hub.clone(), job_id)
        .notify(Notification::update("🟢 檔案上傳成功，開始分析中..."))
        .await;

    (StatusCode::OK, "File uploaded and processing started.")
}

/// 只留檔名本身，去掉任何路徑成分。
fn sanitize_filename(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .replace(['/', '\\'], "")
}
