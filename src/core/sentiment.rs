//! 本地詞典情緒分析：不經遠端模型，直接從回饋文字算出 0~1 的情緒值，
//! 再映射到 1~5，與滿意度評分共用同一尺度。

const POSITIVE_TERMS: &[&str] = &[
    "滿意", "喜歡", "支持", "不錯", "很好", "開心", "肯定", "成長", "友善", "彈性", "良好",
    "順利", "感謝", "good", "great", "happy", "excellent",
];

const NEGATIVE_TERMS: &[&str] = &[
    "不滿", "太吵", "偏低", "過低", "加班", "壓力", "疲憊", "離職", "糟", "失望", "抱怨",
    "不公平", "困難", "bad", "poor", "terrible", "stress",
];

/// 情緒值 ∈ [0, 1]；沒有命中任何詞時回傳中性 0.5。
pub fn sentiment_score(text: &str) -> f64 {
    let positive: usize = POSITIVE_TERMS.iter().map(|t| text.matches(t).count()).sum();
    let negative: usize = NEGATIVE_TERMS.iter().map(|t| text.matches(t).count()).sum();

    let total = positive + negative;
    if total == 0 {
        return 0.5;
    }

    let balance = (positive as f64 - negative as f64) / total as f64;
    (0.5 + balance / 2.0).clamp(0.0, 1.0)
}

/// 映射到滿意度同尺度：s * 4 + 1 ∈ [1, 5]。
pub fn sentiment_scale(text: &str) -> f64 {
    sentiment_score(text) * 4.0 + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_feedback_scores_above_neutral() {
        let score = sentiment_scale("主管很支持，團隊氣氛很好，整體滿意");
        assert!(score > 3.0, "got {}", score);
    }

    #[test]
    fn test_negative_feedback_scores_below_neutral() {
        let score = sentiment_scale("長期加班壓力大，薪資偏低，令人失望");
        assert!(score < 3.0, "got {}", score);
    }

    #[test]
    fn test_no_hits_is_neutral() {
        assert_eq!(sentiment_scale("今天天氣如何"), 3.0);
    }

    #[test]
    fn test_scale_stays_within_bounds() {
        assert!(sentiment_scale("satisfied 滿意 很好 開心") <= 5.0);
        assert!(sentiment_scale("糟 糟 糟 離職 抱怨") >= 1.0);
    }
}
