//! PDF 報表：先把表格算成版面模型（逐格換行、列高、分頁），再畫到 A4 頁面。
//!
//! 量寬用近似值：全形字 1 em、半形 0.5 em。這足以決定換行點與列高，
//! 不需要讀字型度量。

use crate::core::protocol::ADVICE_FAILURE_SCORE_TEXT;
use crate::domain::model::{AdviceResult, FeedbackRecord};
use crate::utils::error::{EmpulseError, Result};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{Color, Line, Mm, PdfDocument, Point, Polygon, Rgb};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const FONT_SIZE: f32 = 12.0;
/// 單行高度（mm），表頭佔兩行。
pub const LINE_HEIGHT_MM: f32 = 6.0;

/// 常見中文字型的候選路徑，依序探測。
pub const FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\kaiu.ttf",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
];

/// A4 直式頁面與邊界。
#[derive(Debug, Clone, Copy)]
pub struct PageMetrics {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl Default for PageMetrics {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
        }
    }
}

impl PageMetrics {
    pub fn available_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    fn header_height(&self) -> f32 {
        LINE_HEIGHT_MM * 2.0
    }

    fn available_row_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm - self.header_height()
    }
}

#[derive(Debug)]
pub struct RowLayout {
    /// 每格換行後的行，外層依欄位順序。
    pub cells: Vec<Vec<String>>,
    pub height_mm: f32,
    /// 斑馬紋填色用。
    pub shaded: bool,
}

#[derive(Debug)]
pub struct TableLayout {
    pub headers: Vec<String>,
    pub col_width_mm: f32,
    pub pages: Vec<Vec<RowLayout>>,
}

/// 近似文字寬度（mm）。
pub fn text_width_mm(text: &str, font_size: f32) -> f32 {
    // 1pt = 0.3528mm；全形字視為 1 em、半形 0.5 em
    let em_mm = font_size * 0.3528;
    let ems: f32 = text
        .chars()
        .map(|c| if c.is_ascii() { 0.5 } else { 1.0 })
        .sum();
    ems * em_mm
}

/// 貪婪換行：逐字塞入直到超寬。空字串也佔一行。
pub fn wrap_text(text: &str, col_width_mm: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;
    let em_mm = font_size * 0.3528;

    for c in text.chars() {
        let char_width = if c.is_ascii() { 0.5 * em_mm } else { em_mm };
        if current_width + char_width > col_width_mm && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        current.push(c);
        current_width += char_width;
    }
    lines.push(current);
    lines
}

/// 把表格資料算成分頁版面：等寬欄位、逐格換行、列高取最深的格、
/// 放不下的列推到下一頁，超過一整頁深的列照行數切段（表頭每頁重畫）。
pub fn layout_table(headers: &[String], rows: &[Vec<String>], page: PageMetrics) -> TableLayout {
    let col_width = page.available_width() / headers.len().max(1) as f32;
    // 內縮一點當 padding，避免貼著框線
    let wrap_width = col_width - 2.0;

    let mut pages: Vec<Vec<RowLayout>> = vec![Vec::new()];
    let mut used_height = 0.0f32;
    let mut shaded = false;

    // 一整頁最多放得下的行數，比這還深的列要切段分頁
    let page_line_capacity = ((page.available_row_height() / LINE_HEIGHT_MM) as usize).max(1);

    for row in rows {
        let cells: Vec<Vec<String>> = headers
            .iter()
            .enumerate()
            .map(|(i, _)| wrap_text(row.get(i).map(String::as_str).unwrap_or(""), wrap_width, FONT_SIZE))
            .collect();
        let max_lines = cells.iter().map(Vec::len).max().unwrap_or(1);

        let mut start_line = 0;
        while start_line < max_lines {
            let take = (max_lines - start_line).min(page_line_capacity);
            let chunk_cells: Vec<Vec<String>> = cells
                .iter()
                .map(|lines| lines.iter().skip(start_line).take(take).cloned().collect())
                .collect();
            let height_mm = take as f32 * LINE_HEIGHT_MM;

            if used_height + height_mm > page.available_row_height() && used_height > 0.0 {
                pages.push(Vec::new());
                used_height = 0.0;
            }
            used_height += height_mm;

            pages
                .last_mut()
                .expect("at least one page")
                .push(RowLayout {
                    cells: chunk_cells,
                    height_mm,
                    shaded,
                });
            start_line += take;
        }
        shaded = !shaded;
    }

    TableLayout {
        headers: headers.to_vec(),
        col_width_mm: col_width,
        pages,
    }
}

/// 探測中文字型；明確指定的路徑不存在也算錯誤，不退回候選清單。
pub fn find_cjk_font(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(EmpulseError::FontError {
            message: format!("指定的字型不存在: {}", path.display()),
        });
    }

    for candidate in FONT_CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            tracing::info!("找到中文字型：{}", candidate);
            return Ok(path.to_path_buf());
        }
    }

    Err(EmpulseError::FontError {
        message: "未找到中文字型，請確認系統已安裝".to_string(),
    })
}

/// 把合併後的分析結果整理成表格欄位。
pub fn advice_table(
    merged: &[(&FeedbackRecord, Option<&AdviceResult>)],
) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = vec![
        "員工ID".to_string(),
        "員工滿意度評分".to_string(),
        "近期反饋內容".to_string(),
        "情緒分數".to_string(),
        "改善建議".to_string(),
    ];

    let rows = merged
        .iter()
        .map(|(record, advice)| {
            let (score_text, advice_text) = match advice {
                Some(result) => (
                    result
                        .sentiment_score
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| ADVICE_FAILURE_SCORE_TEXT.to_string()),
                    result.advice.clone(),
                ),
                None => (String::new(), String::new()),
            };
            vec![
                record.employee_id.clone(),
                record.score.to_string(),
                record.feedback.clone(),
                score_text,
                advice_text,
            ]
        })
        .collect();

    (headers, rows)
}

pub fn report_filename() -> String {
    format!(
        "employee_report_{}.pdf",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// 依版面模型畫出 PDF。
pub fn generate_pdf(
    layout: &TableLayout,
    font_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let page = PageMetrics::default();
    let (doc, first_page, first_layer) = PdfDocument::new(
        "員工滿意度分析報表",
        Mm(page.width_mm),
        Mm(page.height_mm),
        "Layer 1",
    );
    let font = doc.add_external_font(File::open(font_path)?)?;

    for (page_index, page_rows) in layout.pages.iter().enumerate() {
        let layer = if page_index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) =
                doc.add_page(Mm(page.width_mm), Mm(page.height_mm), "Layer 1");
            doc.get_page(page_idx).get_layer(layer_idx)
        };

        // 由頁面頂端往下排，y_top 以頂端為原點、畫的時候再換成 PDF 座標
        let mut y_top = page.margin_mm;

        // 表頭（灰底，佔兩行）
        let header_height = LINE_HEIGHT_MM * 2.0;
        for (i, title) in layout.headers.iter().enumerate() {
            let x = page.margin_mm + i as f32 * layout.col_width_mm;
            fill_cell(&layer, &page, x, y_top, layout.col_width_mm, header_height, 0.78);
            stroke_cell(&layer, &page, x, y_top, layout.col_width_mm, header_height);
            draw_centered_lines(
                &layer,
                &page,
                &font,
                std::slice::from_ref(title),
                x,
                y_top,
                header_height,
            );
        }
        y_top += header_height;

        for row in page_rows {
            for (i, cell_lines) in row.cells.iter().enumerate() {
                let x = page.margin_mm + i as f32 * layout.col_width_mm;
                if row.shaded {
                    fill_cell(&layer, &page, x, y_top, layout.col_width_mm, row.height_mm, 0.93);
                }
                stroke_cell(&layer, &page, x, y_top, layout.col_width_mm, row.height_mm);
                draw_centered_lines(&layer, &page, &font, cell_lines, x, y_top, row.height_mm);
            }
            y_top += row.height_mm;
        }
    }

    doc.save(&mut BufWriter::new(File::create(output_path)?))?;
    Ok(())
}

fn rect_points(page: &PageMetrics, x: f32, y_top: f32, w: f32, h: f32) -> Vec<(Point, bool)> {
    // y_top 是距頁面頂端的距離；PDF 座標原點在左下
    let top = page.height_mm - y_top;
    let bottom = top - h;
    vec![
        (Point::new(Mm(x), Mm(top)), false),
        (Point::new(Mm(x + w), Mm(top)), false),
        (Point::new(Mm(x + w), Mm(bottom)), false),
        (Point::new(Mm(x), Mm(bottom)), false),
    ]
}

fn fill_cell(
    layer: &printpdf::PdfLayerReference,
    page: &PageMetrics,
    x: f32,
    y_top: f32,
    w: f32,
    h: f32,
    gray: f32,
) {
    layer.set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
    layer.add_polygon(Polygon {
        rings: vec![rect_points(page, x, y_top, w, h)],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
    // 還原文字填色
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn stroke_cell(
    layer: &printpdf::PdfLayerReference,
    page: &PageMetrics,
    x: f32,
    y_top: f32,
    w: f32,
    h: f32,
) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.4, 0.4, 0.4, None)));
    layer.set_outline_thickness(0.3);
    layer.add_line(Line {
        points: rect_points(page, x, y_top, w, h),
        is_closed: true,
    });
}

fn draw_centered_lines(
    layer: &printpdf::PdfLayerReference,
    page: &PageMetrics,
    font: &printpdf::IndirectFontRef,
    lines: &[String],
    x: f32,
    y_top: f32,
    cell_height: f32,
) {
    let text_height = lines.len() as f32 * LINE_HEIGHT_MM;
    let mut line_top = y_top + (cell_height - text_height) / 2.0;

    for line in lines {
        // 基線約在行高的八成處
        let baseline = page.height_mm - (line_top + LINE_HEIGHT_MM * 0.8);
        layer.use_text(line.clone(), FONT_SIZE, Mm(x + 1.0), Mm(baseline), font);
        line_top += LINE_HEIGHT_MM;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_half_width_of_cjk() {
        let cjk = text_width_mm("員工滿意度", FONT_SIZE);
        let ascii = text_width_mm("abcdefghij", FONT_SIZE);
        assert!((cjk - ascii).abs() < 0.001, "{} vs {}", cjk, ascii);
    }

    #[test]
    fn test_wrap_text_respects_column_width() {
        // 12pt 全形字約 4.23mm 寬，20mm 的欄一行放得下 4 個
        let lines = wrap_text("滿意度評分偏低需要改善", 20.0, FONT_SIZE);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| text_width_mm(l, FONT_SIZE) <= 20.0));
        assert_eq!(lines.concat(), "滿意度評分偏低需要改善");
    }

    #[test]
    fn test_wrap_empty_text_still_occupies_one_line() {
        assert_eq!(wrap_text("", 20.0, FONT_SIZE), vec![String::new()]);
    }

    #[test]
    fn test_row_height_follows_deepest_cell() {
        let headers: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let rows = vec![vec![
            "短".to_string(),
            "這是一段相當長的反饋內容，要換到很多行才放得下，用來撐高整列".to_string(),
        ]];

        let layout = layout_table(&headers, &rows, PageMetrics::default());

        let row = &layout.pages[0][0];
        let deepest = row.cells.iter().map(Vec::len).max().unwrap();
        assert!(deepest > 1);
        assert_eq!(row.height_mm, deepest as f32 * LINE_HEIGHT_MM);
    }

    #[test]
    fn test_overflowing_rows_break_to_next_page() {
        let headers: Vec<String> = ["員工ID", "反饋"].iter().map(|s| s.to_string()).collect();
        let long = "內容".repeat(60);
        let rows: Vec<Vec<String>> = (0..40)
            .map(|i| vec![format!("E{}", i), long.clone()])
            .collect();

        let layout = layout_table(&headers, &rows, PageMetrics::default());

        assert!(layout.pages.len() > 1);
        let page = PageMetrics::default();
        for rows in &layout.pages {
            let total: f32 = rows.iter().map(|r| r.height_mm).sum();
            assert!(total <= page.available_row_height() + 0.001);
        }
    }

    #[test]
    fn test_row_deeper_than_a_page_is_split_across_pages() {
        let headers: Vec<String> = ["員工ID", "反饋"].iter().map(|s| s.to_string()).collect();
        // 一格就超過整頁的行數
        let page = PageMetrics::default();
        let capacity = (page.available_row_height() / LINE_HEIGHT_MM) as usize;
        let huge = "反饋內容".repeat(capacity * 40);
        let rows = vec![vec!["E1".to_string(), huge.clone()]];

        let layout = layout_table(&headers, &rows, page);

        assert!(layout.pages.len() > 1);
        for rows in &layout.pages {
            let total: f32 = rows.iter().map(|r| r.height_mm).sum();
            assert!(total <= page.available_row_height() + 0.001);
        }

        // 切段後的行拼回去要等於原本的換行結果
        let rejoined: String = layout
            .pages
            .iter()
            .flat_map(|rows| rows.iter())
            .flat_map(|row| row.cells[1].iter())
            .map(String::as_str)
            .collect();
        assert_eq!(rejoined, huge);
    }

    #[test]
    fn test_find_font_with_missing_explicit_path_fails() {
        let err = find_cjk_font(Some(Path::new("/no/such/font.ttf"))).unwrap_err();
        assert!(matches!(err, EmpulseError::FontError { .. }));
    }

    #[test]
    fn test_advice_table_renders_placeholders() {
        let record = FeedbackRecord {
            employee_id: "A".to_string(),
            feedback: "s1".to_string(),
            score: 5.0,
        };
        let placeholder = AdviceResult {
            employee_id: "A".to_string(),
            sentiment_score: None,
            advice: "API 發生錯誤或額度不足".to_string(),
        };
        let merged = vec![(&record, Some(&placeholder))];

        let (headers, rows) = advice_table(&merged);

        assert_eq!(headers.len(), 5);
        assert_eq!(rows[0][3], ADVICE_FAILURE_SCORE_TEXT);
        assert_eq!(rows[0][4], "API 發生錯誤或額度不足");
    }

    #[test]
    fn test_advice_table_unmatched_row_is_blank() {
        let record = FeedbackRecord {
            employee_id: "B".to_string(),
            feedback: "s2".to_string(),
            score: 2.0,
        };
        let merged = vec![(&record, None)];

        let (_, rows) = advice_table(&merged);

        assert_eq!(rows[0][3], "");
        assert_eq!(rows[0][4], "");
    }
}
