//! 滿意度/情緒雙序列 PNG 圖表。
//!
//! 固定視覺編碼：長條 = 員工滿意度評分，圓點 = 本地情緒分析分數
//! （兩者皆為 1~5 尺度），虛線為兩序列的平均值。資料依滿意度由高到低排序。

use crate::core::sentiment::sentiment_scale;
use crate::domain::model::FeedbackRecord;
use crate::utils::error::{EmpulseError, Result};
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 1400;
const HEIGHT: u32 = 700;
const MARGIN_LEFT: u32 = 70;
const MARGIN_RIGHT: u32 = 70;
const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 60;
/// y 軸上限，留一點 5 分之上的空間。
const Y_MAX: f64 = 5.5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([210, 210, 210]);
const BAR: Rgb<u8> = Rgb([120, 160, 230]);
const POINT: Rgb<u8> = Rgb([220, 50, 50]);
const SATISFACTION_MEAN: Rgb<u8> = Rgb([255, 165, 0]);
const SENTIMENT_MEAN: Rgb<u8> = Rgb([0, 150, 60]);

/// 產生部門滿意度趨勢圖，回傳輸出檔路徑。
pub fn render_satisfaction_chart(
    dept_id: &str,
    records: &[FeedbackRecord],
    output_dir: &Path,
) -> Result<PathBuf> {
    if records.is_empty() {
        return Err(EmpulseError::ProcessingError {
            message: "no records to plot".to_string(),
        });
    }

    fs::create_dir_all(output_dir)?;

    let mut sorted: Vec<&FeedbackRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let sentiments: Vec<f64> = sorted.iter().map(|r| sentiment_scale(&r.feedback)).collect();
    let avg_satisfaction = sorted.iter().map(|r| r.score).sum::<f64>() / sorted.len() as f64;
    let avg_sentiment = sentiments.iter().sum::<f64>() / sentiments.len() as f64;

    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    // y 軸整數刻度的格線
    for level in 1..=5 {
        let y = y_px(level as f64);
        draw_dashed_hline(&mut img, y, MARGIN_LEFT, WIDTH - MARGIN_RIGHT, GRID, 6, 6);
    }

    // 座標軸
    draw_hline(&mut img, HEIGHT - MARGIN_BOTTOM, MARGIN_LEFT, WIDTH - MARGIN_RIGHT, AXIS);
    draw_vline(&mut img, MARGIN_LEFT, MARGIN_TOP, HEIGHT - MARGIN_BOTTOM, AXIS);
    draw_vline(&mut img, WIDTH - MARGIN_RIGHT, MARGIN_TOP, HEIGHT - MARGIN_BOTTOM, AXIS);

    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let slot = (plot_width / sorted.len() as u32).max(1);
    let bar_width = (slot * 3 / 5).max(1);
    let baseline = HEIGHT - MARGIN_BOTTOM;

    for (i, record) in sorted.iter().enumerate() {
        let x0 = MARGIN_LEFT + i as u32 * slot + (slot - bar_width) / 2;
        let x1 = (x0 + bar_width).min(WIDTH - MARGIN_RIGHT);

        let bar_top = y_px(record.score);
        fill_rect(&mut img, x0, bar_top, x1, baseline, BAR);

        let cx = x0 + bar_width / 2;
        let cy = y_px(sentiments[i]);
        draw_disc(&mut img, cx, cy, 5, POINT);
    }

    draw_dashed_hline(
        &mut img,
        y_px(avg_satisfaction),
        MARGIN_LEFT,
        WIDTH - MARGIN_RIGHT,
        SATISFACTION_MEAN,
        10,
        6,
    );
    draw_dashed_hline(
        &mut img,
        y_px(avg_sentiment),
        MARGIN_LEFT,
        WIDTH - MARGIN_RIGHT,
        SENTIMENT_MEAN,
        10,
        6,
    );

    let output_path = output_dir.join(format!("satisfaction_trend_{}.png", dept_id));
    img.save(&output_path)?;

    tracing::debug!(
        "📈 chart for {} ({} records, avg {:.2}/{:.2}) -> {}",
        dept_id,
        sorted.len(),
        avg_satisfaction,
        avg_sentiment,
        output_path.display()
    );

    Ok(output_path)
}

fn y_px(value: f64) -> u32 {
    let clamped = value.clamp(0.0, Y_MAX);
    let plot_height = (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM) as f64;
    MARGIN_TOP + ((Y_MAX - clamped) / Y_MAX * plot_height).round() as u32
}

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0.min(y1)..y0.max(y1) {
        for x in x0.min(x1)..x0.max(x1) {
            if x < img.width() && y < img.height() {
                img.put_pixel(x, y, color);
            }
        }
    }
}

fn draw_hline(img: &mut RgbImage, y: u32, x0: u32, x1: u32, color: Rgb<u8>) {
    for x in x0..=x1.min(img.width() - 1) {
        if y < img.height() {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_vline(img: &mut RgbImage, x: u32, y0: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..=y1.min(img.height() - 1) {
        if x < img.width() {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_dashed_hline(
    img: &mut RgbImage,
    y: u32,
    x0: u32,
    x1: u32,
    color: Rgb<u8>,
    dash: u32,
    gap: u32,
) {
    let period = dash + gap;
    for x in x0..x1.min(img.width()) {
        if (x - x0) % period < dash && y < img.height() {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_disc(img: &mut RgbImage, cx: u32, cy: u32, radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                let x = cx as i64 + dx;
                let y = cy as i64 + dy;
                if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<FeedbackRecord> {
        vec![
            FeedbackRecord {
                employee_id: "A".to_string(),
                feedback: "主管很支持，整體滿意".to_string(),
                score: 5.0,
            },
            FeedbackRecord {
                employee_id: "B".to_string(),
                feedback: "加班壓力大，令人失望".to_string(),
                score: 1.0,
            },
            FeedbackRecord {
                employee_id: "C".to_string(),
                feedback: "普通".to_string(),
                score: 3.0,
            },
        ]
    }

    #[test]
    fn test_chart_is_written_with_expected_name_and_size() {
        let dir = tempfile::tempdir().unwrap();

        let path = render_satisfaction_chart("dept1", &records(), dir.path()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "satisfaction_trend_dept1.png"
        );
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), WIDTH);
        assert_eq!(img.height(), HEIGHT);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(render_satisfaction_chart("dept1", &[], dir.path()).is_err());
    }

    #[test]
    fn test_y_mapping_is_monotonic() {
        assert!(y_px(5.0) < y_px(3.0));
        assert!(y_px(3.0) < y_px(1.0));
        assert_eq!(y_px(0.0), HEIGHT - MARGIN_BOTTOM);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        // 超出尺度的值不能讓像素座標溢位
        assert_eq!(y_px(99.0), y_px(Y_MAX));
        assert_eq!(y_px(-2.0), y_px(0.0));
    }
}
