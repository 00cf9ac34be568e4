use crate::domain::model::{FeedbackRecord, Notification, SummaryResult};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 託管語言模型的抽象：文字進、文字出，或失敗。
/// 管線與敘事邏輯只看得到這個 trait，方便測試替換。
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// 批次總結管線的三個階段：讀入、逐批分析、寫出。
#[async_trait]
pub trait AnalysisPipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FeedbackRecord>>;
    async fn summarize(&self, records: Vec<FeedbackRecord>) -> Result<Vec<SummaryResult>>;
    async fn load(&self, results: Vec<SummaryResult>) -> Result<String>;
}

/// 分析過程的事件監聽者。實作不得因沒有訂閱者而失敗。
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// 把事件寫進日誌的最小實作，給 CLI 場景用。
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        match notification {
            Notification::Update { message, source, .. } => match source {
                Some(source) => tracing::info!("[{}] {}", source, message),
                None => tracing::info!("{}", message),
            },
            Notification::PlotGenerated { plot_url } => {
                tracing::info!("📈 Plot generated: {}", plot_url)
            }
            Notification::Suggestions { suggestions } => {
                tracing::info!("💡 {}", suggestions)
            }
        }
    }
}
