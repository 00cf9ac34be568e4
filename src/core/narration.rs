//! 雙代理敘事：「分析專家」與「顧問」兩次相依的遠端呼叫，把回覆依空行
//! 切段、逐段推給監聽者，段與段之間停頓固定時間模擬逐步生成。
//!
//! 純粹是展示層邏輯：沒有分支決策，錯誤一律轉成單一則訊息通知監聽者。

use crate::domain::model::{FeedbackRecord, Notification};
use crate::domain::ports::{LanguageModel, Notifier};
use crate::utils::error::Result;
use std::time::Duration;

pub const FINAL_MARKER: &str = "最終建議：";

/// 段落間的人工停頓。測試用 `Pacing::none()`。
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub lead_in: Duration,
    pub segment: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            lead_in: Duration::from_millis(1500),
            segment: Duration::from_millis(800),
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            lead_in: Duration::ZERO,
            segment: Duration::ZERO,
        }
    }
}

/// 分析提示用的基本統計。
#[derive(Debug, Clone)]
pub struct SatisfactionStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub low_pct: f64,
    pub samples: Vec<String>,
}

/// 平均/最低/最高分、低滿意度（≤2 分）比例，加上最多 5 筆代表性回饋。
/// 取樣取前五筆，讓輸出可重現。
pub fn compute_stats(records: &[FeedbackRecord]) -> SatisfactionStats {
    if records.is_empty() {
        return SatisfactionStats {
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            low_pct: 0.0,
            samples: Vec::new(),
        };
    }

    let mean = records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64;
    let min = records.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
    let max = records.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);
    let low = records.iter().filter(|r| r.score <= 2.0).count();
    let low_pct = low as f64 / records.len() as f64 * 100.0;

    let samples = records
        .iter()
        .take(5)
        .map(|r| format!("員工 {} (評分 {}): {}", r.employee_id, r.score, r.feedback))
        .collect();

    SatisfactionStats {
        mean,
        min,
        max,
        low_pct,
        samples,
    }
}

fn analyst_prompt(dept_id: &str, stats: &SatisfactionStats) -> String {
    format!(
        "作為人力資源分析專家，請根據以下員工滿意度數據進行詳細分析：\n\n\
         部門: {}\n\
         整體滿意度分析:\n\
         - 平均滿意度評分: {:.2}/5\n\
         - 最低評分: {}/5\n\
         - 最高評分: {}/5\n\
         - 低滿意度員工比例: {:.1}%\n\n\
         員工反饋樣本:\n{}\n\n\
         請提供詳細的分析，包括:\n\
         1. 關鍵問題識別\n\
         2. 滿意度分佈模式分析\n\
         3. 員工反饋的主要主題和趨勢\n\n\
         請保持專業分析的語氣，並註明數據支持的觀點。",
        dept_id,
        stats.mean,
        stats.min,
        stats.max,
        stats.low_pct,
        stats.samples.join("\n")
    )
}

fn consultant_prompt(dept_id: &str, analysis: &str) -> String {
    format!(
        "作為人力資源顧問，請基於分析專家的以下分析結果，提供具體的改善建議：\n\n\
         部門: {}\n\
         分析專家的發現:\n{}\n\n\
         請針對上述分析提供:\n\
         1. 優先級最高的三個問題\n\
         2. 每個問題的具體解決方案\n\
         3. 短期和長期的改善計劃\n\
         4. HR 部門應該採取的行動步驟\n\n\
         請保持建設性和可行性，並在回答最後以「最終建議：」開頭總結你的核心建議。",
        dept_id, analysis
    )
}

fn summary_prompt(analysis: &str, recommendations: &str) -> String {
    format!(
        "請總結以下分析和建議的核心要點，並提出最重要的3點行動建議：\n\n\
         分析：{}\n\n建議：{}",
        analysis, recommendations
    )
}

/// 空行切段，去掉空白段。
pub fn split_segments(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// 執行完整的雙代理敘事；任何錯誤轉成一則 error 通知，不重試、不上拋。
pub async fn run_narration(
    model: &dyn LanguageModel,
    notifier: &dyn Notifier,
    dept_id: &str,
    records: &[FeedbackRecord],
    pacing: Pacing,
) {
    notifier
        .notify(Notification::Update {
            message: "🤖 系統：正在啟動HR分析專家與HR顧問的協作...".to_string(),
            source: None,
            tag: Some("analysis".to_string()),
        })
        .await;

    if let Err(e) = narrate(model, notifier, dept_id, records, pacing).await {
        notifier
            .notify(Notification::Update {
                message: format!("❌ 分析過程出錯: {}", e),
                source: None,
                tag: Some("error".to_string()),
            })
            .await;
    }
}

async fn narrate(
    model: &dyn LanguageModel,
    notifier: &dyn Notifier,
    dept_id: &str,
    records: &[FeedbackRecord],
    pacing: Pacing,
) -> Result<()> {
    let stats = compute_stats(records);

    notifier
        .notify(Notification::tagged(
            "🤖 [HR分析專家] 正在分析員工滿意度數據...",
            "hr_analyst",
            "analysis",
        ))
        .await;
    tokio::time::sleep(pacing.lead_in).await;

    let analysis = model
        .generate(&analyst_prompt(dept_id, &stats))
        .await?
        .trim()
        .to_string();

    for segment in split_segments(&analysis) {
        notifier
            .notify(Notification::tagged(
                format!("🤖 [HR分析專家]：{}", segment),
                "hr_analyst",
                "analysis",
            ))
            .await;
        tokio::time::sleep(pacing.segment).await;
    }

    notifier
        .notify(Notification::tagged(
            "🤖 [HR顧問] 正在根據分析結果生成改善建議...",
            "hr_consultant",
            "analysis",
        ))
        .await;
    tokio::time::sleep(pacing.lead_in).await;

    let recommendations = model
        .generate(&consultant_prompt(dept_id, &analysis))
        .await?
        .trim()
        .to_string();

    for segment in split_segments(&recommendations) {
        notifier
            .notify(Notification::tagged(
                format!("🤖 [HR顧問]：{}", segment),
                "hr_consultant",
                "analysis",
            ))
            .await;
        tokio::time::sleep(pacing.segment).await;
    }

    // 取最後一個「最終建議：」之後的文字；沒有標記就再要一次總結
    let suggestions = match recommendations.rfind(FINAL_MARKER) {
        Some(index) => recommendations[index + FINAL_MARKER.len()..].trim().to_string(),
        None => model
            .generate(&summary_prompt(&analysis, &recommendations))
            .await?
            .trim()
            .to_string(),
    };

    notifier
        .notify(Notification::Suggestions { suggestions })
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EmpulseError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct ScriptedModel {
        replies: Vec<String>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ScriptedModel {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: replies.into_iter().map(String::from).collect(),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            let mut model = Self::new(vec![]);
            model.fail = true;
            model
        }
    }

    #[async_trait::async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if self.fail {
                return Err(EmpulseError::ProcessingError {
                    message: "quota exceeded".to_string(),
                });
            }
            self.prompts.lock().await.push(prompt.to_string());
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.replies[index].clone())
        }
    }

    struct RecordingNotifier {
        events: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) {
            self.events.lock().await.push(notification);
        }
    }

    fn records() -> Vec<FeedbackRecord> {
        vec![
            FeedbackRecord {
                employee_id: "A".to_string(),
                feedback: "s1".to_string(),
                score: 5.0,
            },
            FeedbackRecord {
                employee_id: "B".to_string(),
                feedback: "s2".to_string(),
                score: 1.0,
            },
            FeedbackRecord {
                employee_id: "C".to_string(),
                feedback: "s3".to_string(),
                score: 2.0,
            },
        ]
    }

    #[test]
    fn test_compute_stats() {
        let stats = compute_stats(&records());

        assert!((stats.mean - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert!((stats.low_pct - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.samples.len(), 3);
        assert!(stats.samples[0].contains("員工 A"));
    }

    #[test]
    fn test_split_segments_skips_blank_chunks() {
        let segments = split_segments("第一段\n\n\n\n第二段\n\n  \n\n第三段");
        assert_eq!(segments, vec!["第一段", "第二段", "第三段"]);
    }

    #[tokio::test]
    async fn test_two_calls_and_marker_extraction() {
        let model = ScriptedModel::new(vec![
            "問題一\n\n問題二",
            "建議內容\n\n更多建議\n\n最終建議：先處理噪音問題",
        ]);
        let notifier = RecordingNotifier::new();

        run_narration(&model, &notifier, "dept1", &records(), Pacing::none()).await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 2);

        // 顧問提示要夾帶完整的分析文字
        let prompts = model.prompts.lock().await;
        assert!(prompts[1].contains("問題一"));
        assert!(prompts[1].contains("問題二"));

        let events = notifier.events.lock().await;
        let suggestions: Vec<_> = events
            .iter()
            .filter_map(|n| match n {
                Notification::Suggestions { suggestions } => Some(suggestions.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(suggestions, vec!["先處理噪音問題".to_string()]);

        // 分析段落逐段推送
        let analyst_segments = events
            .iter()
            .filter(|n| matches!(n, Notification::Update { source: Some(s), .. } if s == "hr_analyst"))
            .count();
        assert_eq!(analyst_segments, 3); // 開場 + 兩段
    }

    #[tokio::test]
    async fn test_missing_marker_triggers_summary_call() {
        let model = ScriptedModel::new(vec!["分析", "建議但沒有標記", "總結的三點建議"]);
        let notifier = RecordingNotifier::new();

        run_narration(&model, &notifier, "dept1", &records(), Pacing::none()).await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        let events = notifier.events.lock().await;
        assert!(events.iter().any(|n| matches!(
            n,
            Notification::Suggestions { suggestions } if suggestions == "總結的三點建議"
        )));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_single_error_notification() {
        let model = ScriptedModel::failing();
        let notifier = RecordingNotifier::new();

        run_narration(&model, &notifier, "dept1", &records(), Pacing::none()).await;

        let events = notifier.events.lock().await;
        let errors: Vec<_> = events
            .iter()
            .filter(|n| matches!(n, Notification::Update { tag: Some(t), .. } if t == "error"))
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(!events
            .iter()
            .any(|n| matches!(n, Notification::Suggestions { .. })));
    }
}
