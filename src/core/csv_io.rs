//! 固定表頭名稱的 CSV 讀寫。

use crate::domain::model::{FeedbackRecord, SummaryResult};
use crate::utils::error::{EmpulseError, Result};
use crate::utils::validation::validate_required_columns;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct CsvReadOutcome {
    pub records: Vec<FeedbackRecord>,
    /// 滿意度評分無法轉成數字而被過濾掉的列數。
    pub dropped_rows: usize,
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| EmpulseError::ValidationError {
            message: format!("缺少必要欄位: {}", name),
        })
}

/// 讀入員工回饋 CSV。缺少必要欄位是驗證錯誤；評分無法解析的列被丟棄並計數。
pub fn read_feedback_csv(path: &Path) -> Result<CsvReadOutcome> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    validate_required_columns(&headers)?;

    let id_idx = find_column(&headers, "員工ID")?;
    let score_idx = find_column(&headers, "員工滿意度評分")?;
    let feedback_idx = find_column(&headers, "近期反饋內容")?;

    let mut records = Vec::new();
    let mut dropped_rows = 0usize;

    for row in reader.records() {
        let row = row?;
        let employee_id = row.get(id_idx).unwrap_or("").trim().to_string();
        let feedback = row.get(feedback_idx).unwrap_or("").trim().to_string();
        match row.get(score_idx).unwrap_or("").trim().parse::<f64>() {
            Ok(score) => records.push(FeedbackRecord {
                employee_id,
                feedback,
                score,
            }),
            Err(_) => dropped_rows += 1,
        }
    }

    Ok(CsvReadOutcome {
        records,
        dropped_rows,
    })
}

/// 寫出總結結果 CSV，帶 UTF-8 BOM，欄位順序同原始輸出。
pub fn write_summary_csv(path: &Path, results: &[SummaryResult]) -> Result<()> {
    // BOM 讓試算表軟體把檔案當成 UTF-8 開啟
    let mut buf: Vec<u8> = vec![0xEF, 0xBB, 0xBF];
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(["員工ID", "正負面評分", "反饋總結"])?;
        for result in results {
            writer.write_record([&result.employee_id, &result.sentiment, &result.summary])?;
        }
        writer.flush()?;
    }
    fs::write(path, buf)?;
    Ok(())
}
