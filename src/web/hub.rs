//! 行程內發布/訂閱通道：分析工作把事件推進來，SSE 端點把事件轉發給
//! 所有連線中的監聽者。沒有訂閱者時發布是無害的 no-op。

use crate::domain::model::Notification;
use crate::domain::ports::Notifier;
use async_trait::async_trait;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<serde_json::Value>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, value: serde_json::Value) {
        // 沒有接收者時 send 會失敗，忽略即可
        let _ = self.tx.send(value);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<serde_json::Value> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// 把 `Notification` 序列化後發到 hub，並補上這次分析工作的識別碼，
/// 讓同時進行的多個上傳在前端可以區分。
pub struct HubNotifier {
    hub: EventHub,
    job_id: u64,
}

impl HubNotifier {
    pub fn new(hub: EventHub, job_id: u64) -> Self {
        Self { hub, job_id }
    }
}

#[async_trait]
impl Notifier for HubNotifier {
    async fn notify(&self, notification: Notification) {
        match serde_json::to_value(&notification) {
            Ok(mut value) => {
                if let serde_json::Value::Object(map) = &mut value {
                    map.insert("job_id".to_string(), serde_json::json!(self.job_id));
                }
                self.hub.publish(value);
            }
            Err(e) => tracing::error!("failed to serialize notification: {}", e),
        }
    }
}
