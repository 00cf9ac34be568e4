use serde::{Deserialize, Serialize};

/// 一筆員工回饋，對應輸入 CSV 的一列。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub employee_id: String,
    pub feedback: String,
    pub score: f64,
}

/// 總結變體的分析輸出：一句話總結加上正/負面標籤。
/// 解析不到的欄位保持空字串。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SummaryResult {
    pub employee_id: String,
    pub summary: String,
    pub sentiment: String,
}

/// 建議變體的分析輸出：整數情緒分數加上改善建議。
/// 分數抽取失敗時為 None，不得以預設值充數。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AdviceResult {
    pub employee_id: String,
    pub sentiment_score: Option<i64>,
    pub advice: String,
}

/// 推播給前端監聽者的事件，序列化後帶 `type` 欄位。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Update {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
    },
    PlotGenerated {
        plot_url: String,
    },
    Suggestions {
        suggestions: String,
    },
}

impl Notification {
    pub fn update(message: impl Into<String>) -> Self {
        Notification::Update {
            message: message.into(),
            source: None,
            tag: None,
        }
    }

    pub fn tagged(message: impl Into<String>, source: impl Into<String>, tag: impl Into<String>) -> Self {
        Notification::Update {
            message: message.into(),
            source: Some(source.into()),
            tag: Some(tag.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::Update {
            message: message.into(),
            source: None,
            tag: Some("error".to_string()),
        }
    }
}
