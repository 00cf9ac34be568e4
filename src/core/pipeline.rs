use crate::core::csv_io::{read_feedback_csv, write_summary_csv};
use crate::core::protocol;
use crate::domain::model::{AdviceResult, FeedbackRecord, SummaryResult};
use crate::domain::ports::{AnalysisPipeline, LanguageModel};
use crate::utils::error::Result;
use std::path::PathBuf;
use std::time::Duration;

/// 每批送進模型的筆數。
pub const BATCH_SIZE: usize = 25;
/// 建議變體單批上限。
pub const MAX_BATCH_SIZE: usize = 25;
/// 建議變體分析的總列數上限，超過的列不送分析。
pub const MAX_ROWS: usize = 50;

/// CSV 批次總結管線：讀入 → 逐批呼叫模型 → 解碼 → 寫出。
pub struct SummarizePipeline<M: LanguageModel> {
    model: M,
    input_path: PathBuf,
    output_path: PathBuf,
    batch_size: usize,
    batch_delay: Duration,
}

impl<M: LanguageModel> SummarizePipeline<M> {
    pub fn new(model: M, input_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            model,
            input_path,
            output_path,
            batch_size: BATCH_SIZE,
            batch_delay: Duration::from_secs(2),
        }
    }

    /// 覆寫批次大小與批間暫停，測試用 0 延遲。
    pub fn with_batching(mut self, batch_size: usize, batch_delay: Duration) -> Self {
        self.batch_size = batch_size.max(1);
        self.batch_delay = batch_delay;
        self
    }
}

#[async_trait::async_trait]
impl<M: LanguageModel> AnalysisPipeline for SummarizePipeline<M> {
    async fn extract(&self) -> Result<Vec<FeedbackRecord>> {
        let outcome = read_feedback_csv(&self.input_path)?;
        if outcome.dropped_rows > 0 {
            tracing::warn!(
                "⚠️ {} row(s) with unparsable 員工滿意度評分 were skipped",
                outcome.dropped_rows
            );
        }
        Ok(outcome.records)
    }

    async fn summarize(&self, records: Vec<FeedbackRecord>) -> Result<Vec<SummaryResult>> {
        let mut results = Vec::with_capacity(records.len());

        for (batch_index, batch) in records.chunks(self.batch_size).enumerate() {
            let start = batch_index * self.batch_size;
            tracing::info!("🔄 處理第 {} 到 {} 筆...", start + 1, start + batch.len());

            let prompt = protocol::encode_summary_prompt(batch);
            match self.model.generate(&prompt).await {
                Ok(reply) => results.extend(protocol::decode_summary_response(&reply)),
                Err(e) => {
                    // 不重試：整批以佔位結果代替，續跑下一批
                    tracing::warn!("⚠️ API 呼叫失敗：{}", e);
                    results.extend(protocol::summary_placeholders(batch));
                }
            }

            tokio::time::sleep(self.batch_delay).await;
        }

        Ok(results)
    }

    async fn load(&self, results: Vec<SummaryResult>) -> Result<String> {
        write_summary_csv(&self.output_path, &results)?;
        Ok(self.output_path.display().to_string())
    }
}

/// 建議變體的批次分析，給報表產生器用。
///
/// 總列數 ≤ MAX_ROWS 時整份一批送出；超過時以 MAX_BATCH_SIZE 分批，
/// 且只分析前 MAX_ROWS 列。呼叫或解碼失敗時整批換成佔位結果。
pub async fn analyze_advice(
    model: &dyn LanguageModel,
    records: &[FeedbackRecord],
) -> Vec<AdviceResult> {
    if records.is_empty() {
        return Vec::new();
    }

    let capped = &records[..records.len().min(MAX_ROWS)];
    let batch_size = if records.len() <= MAX_ROWS {
        capped.len()
    } else {
        MAX_BATCH_SIZE
    };

    let mut results = Vec::with_capacity(capped.len());
    for batch in capped.chunks(batch_size) {
        let prompt = protocol::encode_advice_prompt(batch);
        let decoded = match model.generate(&prompt).await {
            Ok(reply) => protocol::decode_advice_response(&reply),
            Err(e) => Err(e),
        };
        match decoded {
            Ok(batch_results) => results.extend(batch_results),
            Err(e) => {
                tracing::warn!("分析失敗：{}", e);
                results.extend(protocol::advice_placeholders(batch));
            }
        }
    }

    results
}

/// 以員工ID 左外連接，把建議結果併回原始列。找不到對應結果的列得到 None。
pub fn merge_advice<'a>(
    records: &'a [FeedbackRecord],
    results: &'a [AdviceResult],
) -> Vec<(&'a FeedbackRecord, Option<&'a AdviceResult>)> {
    records
        .iter()
        .map(|record| {
            let matched = results.iter().find(|r| r.employee_id == record.employee_id);
            (record, matched)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::EmpulseError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct ScriptedModel {
        replies: Vec<Result<String>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().await.push(prompt.to_string());
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.get(index) {
                Some(Ok(reply)) => Ok(reply.clone()),
                Some(Err(_)) | None => Err(EmpulseError::ProcessingError {
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn records(n: usize) -> Vec<FeedbackRecord> {
        (0..n)
            .map(|i| FeedbackRecord {
                employee_id: format!("E{:03}", i),
                feedback: format!("feedback {}", i),
                score: (i % 5 + 1) as f64,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_summarize_failure_fills_placeholders_for_whole_batch() {
        let model = ScriptedModel::new(vec![Err(EmpulseError::ProcessingError {
            message: "down".to_string(),
        })]);
        let pipeline = SummarizePipeline::new(
            model,
            PathBuf::from("unused.csv"),
            PathBuf::from("unused_out.csv"),
        )
        .with_batching(25, Duration::ZERO);

        let input = records(3);
        let results = pipeline.summarize(input.clone()).await.unwrap();

        assert_eq!(results.len(), input.len());
        for (record, result) in input.iter().zip(&results) {
            assert_eq!(result.employee_id, record.employee_id);
            assert_eq!(result.summary, protocol::SUMMARY_FAILURE_TEXT);
            assert_eq!(result.sentiment, "");
        }
    }

    #[tokio::test]
    async fn test_summarize_batches_of_25() {
        // 30 筆 → 兩次呼叫，第二批 5 筆
        let reply_for = |ids: std::ops::Range<usize>| {
            ids.map(|i| format!("員工ID：E{:03}\n反饋總結：ok\n正負面評分：正面", i))
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        let model = ScriptedModel::new(vec![Ok(reply_for(0..25)), Ok(reply_for(25..30))]);
        let pipeline = SummarizePipeline::new(
            model,
            PathBuf::from("unused.csv"),
            PathBuf::from("unused_out.csv"),
        )
        .with_batching(25, Duration::ZERO);

        let results = pipeline.summarize(records(30)).await.unwrap();

        assert_eq!(results.len(), 30);
        assert_eq!(results[0].employee_id, "E000");
        assert_eq!(results[29].employee_id, "E029");
    }

    #[tokio::test]
    async fn test_analyze_advice_single_batch_under_max_rows() {
        let reply = "員工ID: E000\n情緒分數: 80\n改善建議: a\n\
                     員工ID: E001\n情緒分數: 20\n改善建議: b\n\
                     員工ID: E002\n情緒分數: 50\n改善建議: c\n";
        let model = ScriptedModel::new(vec![Ok(reply.to_string())]);

        let results = analyze_advice(&model, &records(3)).await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].sentiment_score, Some(20));
    }

    #[tokio::test]
    async fn test_analyze_advice_caps_at_max_rows() {
        // 60 筆 → 只分析前 50 筆，分兩批各 25
        let reply_for = |ids: std::ops::Range<usize>| {
            ids.map(|i| format!("員工ID: E{:03}\n情緒分數: 50\n改善建議: ok", i))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let model = ScriptedModel::new(vec![Ok(reply_for(0..25)), Ok(reply_for(25..50))]);

        let results = analyze_advice(&model, &records(60)).await;

        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(results.len(), 50);
    }

    #[tokio::test]
    async fn test_analyze_advice_decode_failure_becomes_placeholders() {
        let model = ScriptedModel::new(vec![Ok(
            "員工ID: E000\n情緒分數: none\n改善建議: x".to_string()
        )]);

        let results = analyze_advice(&model, &records(2)).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.sentiment_score.is_none()));
        assert!(results.iter().all(|r| r.advice == protocol::ADVICE_FAILURE_TEXT));
    }

    #[test]
    fn test_merge_advice_is_left_join_by_id() {
        let input = records(3);
        let results = vec![AdviceResult {
            employee_id: "E002".to_string(),
            sentiment_score: Some(70),
            advice: "keep going".to_string(),
        }];

        let merged = merge_advice(&input, &results);

        assert_eq!(merged.len(), 3);
        assert!(merged[0].1.is_none());
        assert!(merged[1].1.is_none());
        assert_eq!(merged[2].1.unwrap().sentiment_score, Some(70));
    }
}
