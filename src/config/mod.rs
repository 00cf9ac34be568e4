use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use clap::Parser;
use std::path::PathBuf;

/// 批次總結 CLI。
#[derive(Debug, Clone, Parser)]
#[command(name = "empulse")]
#[command(about = "Summarize employee feedback CSVs with a hosted language model")]
pub struct CliConfig {
    /// 員工回饋 CSV 路徑
    pub input: Option<PathBuf>,

    #[arg(long, default_value = "employee_feedback_summary.csv")]
    pub output: PathBuf,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// 批與批之間的暫停（毫秒）
    #[arg(long, default_value = "2000")]
    pub batch_delay_ms: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_base", &self.api_base)?;
        Ok(())
    }
}

/// PDF 報表產生器。
#[derive(Debug, Clone, Parser)]
#[command(name = "report")]
#[command(about = "Analyze a feedback CSV and render a PDF report")]
pub struct ReportConfig {
    /// 員工回饋 CSV 路徑
    pub input: Option<PathBuf>,

    /// 中文字型路徑；不指定時探測系統候選字型
    #[arg(long)]
    pub font: Option<PathBuf>,

    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value = "gemini-1.5-pro")]
    pub model: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_base", &self.api_base)?;
        Ok(())
    }
}

/// 上傳/通知伺服器。
#[derive(Debug, Clone, Parser)]
#[command(name = "server")]
#[command(about = "Upload server streaming analysis events over SSE")]
pub struct ServerConfig {
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub bind: String,

    #[arg(long, default_value = "uploads")]
    pub upload_dir: PathBuf,

    #[arg(long, default_value = "static/satisfactiontrend")]
    pub chart_dir: PathBuf,

    /// 分析 worker 數量
    #[arg(long, default_value = "2")]
    pub workers: usize,

    /// 佇列深度，滿了之後上傳回 503
    #[arg(long, default_value = "16")]
    pub queue_depth: usize,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value = "gemini-1.5-flash-8b")]
    pub model: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_base", &self.api_base)?;
        validate_positive_number("workers", self.workers, 1)?;
        validate_positive_number("queue_depth", self.queue_depth, 1)?;
        Ok(())
    }
}

/// 透過 WebDriver 編輯代管儲存庫檔案的自動化腳本。
#[derive(Debug, Clone, Parser)]
#[command(name = "repo-edit")]
#[command(about = "Log into the code host and append a line to a repo file via UI automation")]
pub struct RepoEditConfig {
    #[arg(long, default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    #[arg(long, default_value = "https://github.com")]
    pub site: String,

    #[arg(long, default_value = "HW3_TEST")]
    pub repo: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for RepoEditConfig {
    fn validate(&self) -> Result<()> {
        validate_url("webdriver_url", &self.webdriver_url)?;
        validate_url("site", &self.site)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_validate() {
        let config = CliConfig::try_parse_from(["empulse", "input.csv"]).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_delay_ms, 2000);
        assert_eq!(config.output, PathBuf::from("employee_feedback_summary.csv"));
    }

    #[test]
    fn test_missing_input_is_allowed_at_parse_time() {
        // 缺參數時主程式要印用法後正常返回，所以 input 是 Option
        let config = CliConfig::try_parse_from(["empulse"]).unwrap();
        assert!(config.input.is_none());
    }

    #[test]
    fn test_bad_api_base_fails_validation() {
        let mut config = CliConfig::try_parse_from(["empulse", "input.csv"]).unwrap();
        config.api_base = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_worker_count_must_be_positive() {
        let config =
            ServerConfig::try_parse_from(["server", "--workers", "0"]).unwrap();
        assert!(config.validate().is_err());
    }
}
