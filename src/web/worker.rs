//! 有界的分析工作池。
//!
//! 上傳處理常式不再為每個檔案丟出一條無人管的執行緒：工作進一條有界
//! 佇列，固定數量的 worker 依序取出執行。每個工作有自己的識別碼，單一
//! worker 擁有整個 run，因此同一個 run 的通知保證依序送出；佇列滿時
//! 上傳端點直接回 503，不會無上限堆積。

use crate::core::chart::render_satisfaction_chart;
use crate::core::csv_io::read_feedback_csv;
use crate::core::narration::{run_narration, Pacing};
use crate::domain::model::Notification;
use crate::domain::ports::{LanguageModel, Notifier};
use crate::utils::error::EmpulseError;
use crate::web::hub::{EventHub, HubNotifier};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug)]
pub struct AnalysisJob {
    pub id: u64,
    pub file_path: PathBuf,
    pub dept_id: String,
}

/// worker 共用的依賴，每個 run 明確注入。
#[derive(Clone)]
pub struct WorkerContext {
    pub model: Arc<dyn LanguageModel>,
    pub hub: EventHub,
    pub chart_dir: PathBuf,
    pub pacing: Pacing,
}

#[derive(Clone)]
pub struct WorkerPool {
    tx: mpsc::Sender<AnalysisJob>,
    next_id: Arc<AtomicU64>,
}

impl WorkerPool {
    /// 啟動 `workers` 個 worker，佇列深度 `queue_depth`。
    pub fn spawn(workers: usize, queue_depth: usize, ctx: WorkerContext) -> Self {
        let (tx, rx) = mpsc::channel::<AnalysisJob>(queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker_index in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let ctx = ctx.clone();
            tokio::spawn(async move {
                loop {
                    let job = { rx.lock().await.recv().await };
                    match job {
                        Some(job) => {
                            tracing::info!("👷 worker {} picked up job {}", worker_index, job.id);
                            run_job(&ctx, job).await;
                        }
                        None => break,
                    }
                }
            });
        }

        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// 佇列有空位就排入並回傳工作識別碼；滿了回 None（呼叫端回 503）。
    pub fn try_enqueue(&self, file_path: PathBuf, dept_id: String) -> Option<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let job = AnalysisJob {
            id,
            file_path,
            dept_id,
        };
        match self.tx.try_send(job) {
            Ok(()) => Some(id),
            Err(e) => {
                tracing::warn!("🛑 analysis queue full, rejecting upload: {}", e);
                None
            }
        }
    }
}

/// 一個上傳檔案的完整分析流程，錯誤一律轉成使用者看得懂的通知。
async fn run_job(ctx: &WorkerContext, job: AnalysisJob) {
    let notifier = HubNotifier::new(ctx.hub.clone(), job.id);

    // CSV 解析是同步檔案 I/O，放到 blocking 執行緒跑，不佔住 worker task
    let file_path = job.file_path.clone();
    let read_result = tokio::task::spawn_blocking(move || read_feedback_csv(&file_path)).await;

    let outcome = match read_result {
        Ok(Ok(outcome)) => outcome,
        Err(e) => {
            notifier
                .notify(Notification::error(format!("❌ 分析過程出現錯誤: {}", e)))
                .await;
            return;
        }
        Ok(Err(EmpulseError::ValidationError { message })) => {
            notifier
                .notify(Notification::error(format!("❌ 數據驗證錯誤: {}", message)))
                .await;
            return;
        }
        Ok(Err(e @ EmpulseError::CsvError(_))) => {
            tracing::warn!("job {}: {}", job.id, e);
            notifier
                .notify(Notification::error(
                    "❌ CSV檔案格式錯誤，請確認檔案格式正確",
                ))
                .await;
            return;
        }
        Ok(Err(e)) => {
            notifier
                .notify(Notification::error(format!("❌ 分析過程出現錯誤: {}", e)))
                .await;
            return;
        }
    };

    if outcome.dropped_rows > 0 {
        notifier
            .notify(Notification::update(
                "⚠️ 警告: 有些記錄的滿意度評分無效，已自動過濾",
            ))
            .await;
    }

    if outcome.records.is_empty() {
        notifier
            .notify(Notification::error(
                "❌ 數據驗證錯誤: 處理後沒有有效數據可分析",
            ))
            .await;
        return;
    }

    match render_satisfaction_chart(&job.dept_id, &outcome.records, &ctx.chart_dir) {
        Ok(path) => {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            notifier
                .notify(Notification::PlotGenerated {
                    plot_url: format!("/plots/{}", file_name),
                })
                .await;
        }
        Err(e) => {
            // 圖表失敗不中斷分析
            notifier
                .notify(Notification::update(format!(
                    "⚠️ 生成圖表時出錯: {}，但分析將繼續",
                    e
                )))
                .await;
        }
    }

    run_narration(
        ctx.model.as_ref(),
        &notifier,
        &job.dept_id,
        &outcome.records,
        ctx.pacing,
    )
    .await;

    tracing::info!("✅ job {} finished", job.id);
}
