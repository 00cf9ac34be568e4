use clap::{CommandFactory, Parser};
use empulse::utils::{logger, validation::Validate};
use empulse::{AnalysisEngine, CliConfig, GeminiClient, SummarizePipeline};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting empulse CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 沒給輸入檔就印用法後正常結束
    let Some(input_path) = config.input.clone() else {
        CliConfig::command().print_help()?;
        println!();
        return Ok(());
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let model = match GeminiClient::from_env(&config.api_base, &config.model) {
        Ok(model) => model,
        Err(e) => {
            tracing::error!("❌ {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let pipeline = SummarizePipeline::new(model, input_path, config.output.clone())
        .with_batching(
            empulse::core::pipeline::BATCH_SIZE,
            Duration::from_millis(config.batch_delay_ms),
        );
    let engine = AnalysisEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Analysis completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("分析完成！結果已儲存至 {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                empulse::utils::error::ErrorSeverity::Low => 0,
                empulse::utils::error::ErrorSeverity::Medium => 2,
                empulse::utils::error::ErrorSeverity::High => 1,
                empulse::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
