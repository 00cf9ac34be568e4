use clap::{CommandFactory, Parser};
use empulse::core::csv_io::read_feedback_csv;
use empulse::core::pipeline::{analyze_advice, merge_advice};
use empulse::core::report::{
    advice_table, find_cjk_font, generate_pdf, layout_table, report_filename, PageMetrics,
};
use empulse::utils::{logger, validation::Validate};
use empulse::{GeminiClient, ReportConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ReportConfig::parse();

    logger::init_cli_logger(config.verbose);

    let Some(input_path) = config.input.clone() else {
        ReportConfig::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 字型先探測：沒字型就不用浪費模型呼叫
    let font_path = match find_cjk_font(config.font.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let model = match GeminiClient::from_env(&config.api_base, &config.model) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let outcome = match read_feedback_csv(&input_path) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("❌ Failed to read {}: {}", input_path.display(), e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    if outcome.dropped_rows > 0 {
        tracing::warn!("⚠️ {} row(s) with invalid scores were skipped", outcome.dropped_rows);
    }
    tracing::info!("Loaded {} records", outcome.records.len());

    tracing::info!("🔄 分析員工反饋中...");
    let advice = analyze_advice(&model, &outcome.records).await;
    let merged = merge_advice(&outcome.records, &advice);

    let (headers, rows) = advice_table(&merged);
    let layout = layout_table(&headers, &rows, PageMetrics::default());

    std::fs::create_dir_all(&config.output_dir)?;
    let output_path = config.output_dir.join(report_filename());
    if let Err(e) = generate_pdf(&layout, &font_path, &output_path) {
        tracing::error!("❌ PDF generation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Report written to {}", output_path.display());
    println!("報表已生成：{}", output_path.display());

    Ok(())
}
