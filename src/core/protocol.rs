//! 批次提示/回應協定：把 N 筆回饋編成一段提示文字，再把模型的自由文字
//! 回覆解回 N 筆結構化結果。
//!
//! 兩種變體共用同一套慣例：表頭宣告欄位標籤，每筆資料一個段落；解碼時
//! 以「行首完全等於標籤」辨認欄位。這是脆弱的前綴約定，不是結構化格式，
//! 回覆若沒有逐段對齊輸入順序就會錯位（已知的潛在缺陷，維持原行為）。

use crate::domain::model::{AdviceResult, FeedbackRecord, SummaryResult};
use crate::utils::error::{EmpulseError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// 總結變體的行首標籤（全形冒號）。
pub const SUMMARY_ID_LABEL: &str = "員工ID：";
pub const SUMMARY_TEXT_LABEL: &str = "反饋總結：";
pub const SUMMARY_SENTIMENT_LABEL: &str = "正負面評分：";

/// 建議變體的行首標籤（半形冒號，值取第一個冒號之後）。
pub const ADVICE_ID_LABEL: &str = "員工ID";
pub const ADVICE_SCORE_LABEL: &str = "情緒分數";
pub const ADVICE_TEXT_LABEL: &str = "改善建議";

/// 整批呼叫失敗時填入的固定哨兵值。
pub const SUMMARY_FAILURE_TEXT: &str = "分析失敗";
pub const ADVICE_FAILURE_TEXT: &str = "API 發生錯誤或額度不足";
pub const ADVICE_FAILURE_SCORE_TEXT: &str = "分析失敗";

/// 把一批回饋編成總結變體的單一提示字串。
pub fn encode_summary_prompt(records: &[FeedbackRecord]) -> String {
    let mut prompt = String::from(
        "請根據以下每筆員工回饋與滿意度，用一句話總結並判斷是正面還是負面，輸出格式為：\n\n\
         員工ID：XXX\n反饋總結：XXX\n正負面評分：正面/負面\n\n",
    );

    for record in records {
        prompt.push_str(&format!(
            "員工ID：{}\n近期反饋：「{}」，滿意度為 {} 分。\n\n",
            record.employee_id, record.feedback, record.score
        ));
    }

    prompt
}

/// 以空行切段解碼總結變體回覆。
///
/// 每段預期對應一筆輸入（依序，未與輸入 ID 交叉核對）；段內逐行比對標籤，
/// 沒比中的行丟棄（記警告），從未出現的欄位留空字串。
pub fn decode_summary_response(text: &str) -> Vec<SummaryResult> {
    let mut results = Vec::new();
    let mut dropped_lines = 0usize;

    for block in text.trim().split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let mut result = SummaryResult::default();
        for line in block.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix(SUMMARY_ID_LABEL) {
                result.employee_id = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix(SUMMARY_TEXT_LABEL) {
                result.summary = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix(SUMMARY_SENTIMENT_LABEL) {
                result.sentiment = rest.trim().to_string();
            } else if !line.is_empty() {
                dropped_lines += 1;
            }
        }
        results.push(result);
    }

    if dropped_lines > 0 {
        tracing::warn!("⚠️ {} unlabeled line(s) dropped while decoding reply", dropped_lines);
    }

    results
}

/// 整批呼叫失敗時，為每筆輸入合成一筆佔位結果。
pub fn summary_placeholders(records: &[FeedbackRecord]) -> Vec<SummaryResult> {
    records
        .iter()
        .map(|record| SummaryResult {
            employee_id: record.employee_id.clone(),
            summary: SUMMARY_FAILURE_TEXT.to_string(),
            sentiment: String::new(),
        })
        .collect()
}

/// 把一批回饋編成建議變體的單一提示字串。
pub fn encode_advice_prompt(records: &[FeedbackRecord]) -> String {
    let mut prompt = String::from(
        "請針對以下每筆資料進行分析，回傳格式請嚴格遵守：\n\
         員工ID: XXX\n情緒分數: 整數分數\n改善建議: 建議內容\n\n",
    );

    for record in records {
        prompt.push_str(&format!(
            "員工ID: {}\n滿意度評分: {}\n反饋內容: {}\n\n",
            record.employee_id, record.score, record.feedback
        ));
    }

    prompt
}

/// 解碼建議變體回覆。
///
/// 不以空行切段，而是以 `員工ID` 標籤再次出現視為下一筆的開頭。
/// `情緒分數` 行取行內第一串十進位數字；整行沒有數字是硬性失敗，
/// 不得以預設值充數。呼叫端把解碼失敗視同遠端失敗（整批佔位）。
pub fn decode_advice_response(text: &str) -> Result<Vec<AdviceResult>> {
    let mut results = Vec::new();
    let mut current: Option<AdviceResult> = None;

    for line in text.trim().lines() {
        let line = line.trim();
        if line.starts_with(ADVICE_ID_LABEL) {
            if let Some(done) = current.take() {
                results.push(done);
            }
            let (_, value) = line.split_once(':').ok_or_else(|| EmpulseError::ProtocolError {
                message: format!("員工ID line without colon: {}", line),
            })?;
            current = Some(AdviceResult {
                employee_id: value.trim().to_string(),
                ..AdviceResult::default()
            });
        } else if line.starts_with(ADVICE_SCORE_LABEL) {
            let score = extract_first_int(line).ok_or_else(|| EmpulseError::ProtocolError {
                message: format!("no digits in 情緒分數 line: {}", line),
            })?;
            if let Some(result) = current.as_mut() {
                result.sentiment_score = Some(score);
            }
        } else if line.starts_with(ADVICE_TEXT_LABEL) {
            if let Some(result) = current.as_mut() {
                if let Some((_, value)) = line.split_once(':') {
                    result.advice = value.trim().to_string();
                }
            }
        }
        // 其他行（解說、空行）直接略過
    }

    if let Some(done) = current.take() {
        results.push(done);
    }

    Ok(results)
}

/// 建議變體的整批佔位結果。
pub fn advice_placeholders(records: &[FeedbackRecord]) -> Vec<AdviceResult> {
    records
        .iter()
        .map(|record| AdviceResult {
            employee_id: record.employee_id.clone(),
            sentiment_score: None,
            advice: ADVICE_FAILURE_TEXT.to_string(),
        })
        .collect()
}

/// 取行內第一串十進位數字。整行沒有數字回傳 None。
pub fn extract_first_int(line: &str) -> Option<i64> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("valid digit pattern"));
    re.find(line).and_then(|m| m.as_str().parse().ok())
}
