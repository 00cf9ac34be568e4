pub mod config;
pub mod core;
pub mod domain;
pub mod llm;
pub mod utils;
pub mod web;

pub use config::{CliConfig, RepoEditConfig, ReportConfig, ServerConfig};
pub use core::{engine::AnalysisEngine, pipeline::SummarizePipeline};
pub use domain::model::{AdviceResult, FeedbackRecord, Notification, SummaryResult};
pub use domain::ports::{AnalysisPipeline, LanguageModel, Notifier};
pub use llm::GeminiClient;
pub use utils::error::{EmpulseError, Result};
